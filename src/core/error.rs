//! Error types for the logger system
//!
//! Only construction, configuration and explicit scope release return these.
//! The write path never surfaces an error to the caller.

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Level name that is neither a standard level nor a configured alias
    #[error("Invalid log level: '{name}'")]
    InvalidLevel { name: String },

    /// Append attempted on a payload whose transaction was closed
    #[error("No active transaction on payload for '{category}'")]
    NoActiveTransaction { category: String },

    /// Scope frame released while inner frames were still live
    #[error("Scope frame #{frame_id} released out of order ({inner_frames} inner frames still live)")]
    ScopeOutOfOrder { frame_id: u64, inner_frames: usize },

    /// Scope frame no longer present on its stack
    #[error("Scope frame #{frame_id} not found on scope stack")]
    ScopeNotFound { frame_id: u64 },

    /// Queue full with buffer details
    #[error("Emission queue full: {current}/{max} batches buffered")]
    QueueFull { current: usize, max: usize },

    /// Emitter already stopped
    #[error("Emitter already stopped")]
    EmitterStopped,

    /// Channel send error
    #[error("Failed to send log batch to emission worker")]
    ChannelSendError,

    /// Sink error with sink name
    #[error("Sink '{sink}' failed: {message}")]
    SinkError { sink: String, message: String },

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create an invalid level error
    pub fn invalid_level(name: impl Into<String>) -> Self {
        LoggerError::InvalidLevel { name: name.into() }
    }

    /// Create a missing transaction error
    pub fn no_active_transaction(category: impl Into<String>) -> Self {
        LoggerError::NoActiveTransaction {
            category: category.into(),
        }
    }

    /// Create a queue full error with buffer details
    pub fn queue_full(current: usize, max: usize) -> Self {
        LoggerError::QueueFull { current, max }
    }

    /// Create a sink error
    pub fn sink(sink: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::SinkError {
            sink: sink.into(),
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }
}
