//! # Rust Template Logger
//!
//! A structured logging core: leveled events carry a message template plus
//! arguments, are bound into immutable property-bearing events and are routed
//! either immediately or under an explicit transaction to an emission boundary.
//!
//! ## Features
//!
//! - **Message Templates**: named and positional slots, destructuring, format specifiers
//! - **Level Gate**: exact, namespace and global minimums checked before any allocation
//! - **Transactional Dispatch**: automatic per-event batches or manual submit
//! - **Non-blocking Emission**: bounded hand-off to a worker thread and its sinks
//! - **Scopes**: nested ambient context attached to every event
//!
//! ```
//! use rust_template_logger::prelude::*;
//! use rust_template_logger::info;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let sink = MemorySink::new();
//! let emitter = Arc::new(ChannelEmitter::builder().sink(sink.clone()).build().unwrap());
//! let logger = Logger::builder()
//!     .category("app")
//!     .emitter(emitter.clone())
//!     .build()
//!     .unwrap();
//!
//! info!(logger, "User {Name} logged in", "alice");
//!
//! emitter.wait_idle(Duration::from_secs(1));
//! assert_eq!(sink.messages(), vec!["User alice logged in".to_string()]);
//! ```

pub mod core;
pub mod macros;
pub mod sinks;
pub mod template;

pub mod prelude {
    #[cfg(feature = "console")]
    pub use crate::sinks::ConsoleSink;
    pub use crate::sinks::MemorySink;
    pub use crate::core::{
        CallerInfo, ChannelEmitter, Emitter, EventId, ExceptionInfo, FnEmitter, LevelGate, LevelGateConfig,
        LevelGateHandle, LogBatch, LogContext, LogEvent, LogLevel, Logger, LoggerBuilder,
        LoggerError, LoggerMetrics, OverflowCallback, OverflowPolicy, Result, ScopeGuard,
        ScopeStack, SendMode, Sink, WriteOptions, DEFAULT_SHUTDOWN_TIMEOUT,
    };
    pub use crate::template::{MessageProcessor, Value};
}

#[cfg(feature = "console")]
pub use sinks::ConsoleSink;
pub use sinks::MemorySink;
pub use core::{
    CallerInfo, ChannelEmitter, ChannelEmitterBuilder, Emitter, EventContext, EventId,
    ExceptionInfo, FnEmitter, LevelGate, LevelGateConfig, LevelGateHandle, LogBatch, LogContext,
    LogEvent, LogFilter, LogLevel, LogPayload, Logger, LoggerBuilder, LoggerError, LoggerMetrics,
    OverflowCallback, OverflowPolicy, Result, ScopeFrame, ScopeGuard, ScopeStack, SendMode, Sink,
    TransactionId, WriteOptions, DEFAULT_QUEUE_CAPACITY, DEFAULT_SHUTDOWN_TIMEOUT,
};
pub use template::{
    LogProperty, MessageProcessor, ParsedTemplate, PropertyValue, ScalarValue, TemplateCache, Value,
};
