//! Core logger types and traits

pub mod emitter;
pub mod error;
pub mod level_gate;
pub mod log_context;
pub mod log_event;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub mod overflow_policy;
pub mod payload;
pub mod scope;
pub mod sink;

pub use emitter::{ChannelEmitter, ChannelEmitterBuilder, Emitter, FnEmitter, DEFAULT_QUEUE_CAPACITY, DEFAULT_SHUTDOWN_TIMEOUT};
pub use error::{LoggerError, Result};
pub use level_gate::{LevelGate, LevelGateConfig, LevelGateHandle};
pub use log_context::LogContext;
pub use log_event::{CallerInfo, EventContext, EventId, ExceptionInfo, LogEvent, SendMode};
pub use log_level::LogLevel;
pub use logger::{LogFilter, Logger, LoggerBuilder, WriteOptions};
pub use metrics::LoggerMetrics;
pub use overflow_policy::{OverflowCallback, OverflowPolicy};
pub use payload::{LogBatch, LogPayload, TransactionId};
pub use scope::{ScopeFrame, ScopeGuard, ScopeStack};
pub use sink::Sink;
