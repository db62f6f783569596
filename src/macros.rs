//! Logging macros
//!
//! The macros check the logger's gate before evaluating any argument, convert
//! each argument with `Value::from` and attach the call site as [`CallerInfo`].
//!
//! [`CallerInfo`]: crate::CallerInfo
//!
//! # Examples
//!
//! ```
//! use rust_template_logger::prelude::*;
//! use rust_template_logger::{info, warn};
//! use std::sync::Arc;
//!
//! let logger = Logger::builder()
//!     .category("app")
//!     .emitter(Arc::new(FnEmitter(|_batch: LogBatch| {})))
//!     .build()
//!     .unwrap();
//!
//! info!(logger, "Server started");
//! info!(logger, "Server listening on port {Port}", 8080);
//! warn!(logger, "Retry {Attempt} of {Max}", 3, 5);
//! ```

/// Log a template at the given level.
///
/// # Examples
///
/// ```
/// # use rust_template_logger::prelude::*;
/// # use std::sync::Arc;
/// # let logger = Logger::builder().category("app")
/// #     .emitter(Arc::new(FnEmitter(|_b: LogBatch| {}))).build().unwrap();
/// use rust_template_logger::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Error, "Error code: {Code}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $template:expr $(, $arg:expr)* $(,)?) => {{
        let logger = &$logger;
        let level = $level;
        if logger.is_enabled(level) {
            logger.write_with(
                level,
                $template,
                ::std::vec![$($crate::Value::from($arg)),*],
                $crate::WriteOptions::new().with_caller($crate::CallerInfo::new(
                    ::std::module_path!(),
                    ::std::file!(),
                    ::std::line!(),
                )),
            );
        }
    }};
}

/// Log a trace-level template.
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Trace, $($arg)+)
    };
}

/// Log a debug-level template.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level template.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a warning-level template.
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Log an error-level template.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Log a fatal-level template.
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Fatal, $($arg)+)
    };
}
