//! Overflow policies for the emission queue
//!
//! When the hand-off queue between loggers and sinks is full, the policy
//! decides what happens to the batch being emitted.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Policy for handling a full emission queue
///
/// # Example
///
/// ```
/// use rust_template_logger::OverflowPolicy;
/// use std::time::Duration;
///
/// let policy = OverflowPolicy::default();
/// assert_eq!(policy, OverflowPolicy::AlertAndDrop);
///
/// let policy = OverflowPolicy::BlockWithTimeout(Duration::from_millis(100));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Drop the batch and count it
    DropNewest,

    /// Wait until the worker frees a slot
    ///
    /// Applies backpressure to the writing thread.
    Block,

    /// Wait up to the timeout, then drop
    BlockWithTimeout(Duration),

    /// Drop the batch, report on stderr and invoke the overflow callback
    #[default]
    AlertAndDrop,
}

impl OverflowPolicy {
    /// Whether a writer may wait on a full queue under this policy.
    pub fn blocks(&self) -> bool {
        matches!(self, OverflowPolicy::Block | OverflowPolicy::BlockWithTimeout(_))
    }
}

impl fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverflowPolicy::DropNewest => write!(f, "DropNewest"),
            OverflowPolicy::Block => write!(f, "Block"),
            OverflowPolicy::BlockWithTimeout(d) => write!(f, "BlockWithTimeout({:?})", d),
            OverflowPolicy::AlertAndDrop => write!(f, "AlertAndDrop"),
        }
    }
}

/// Called with the total number of dropped events each time a batch is dropped.
pub type OverflowCallback = Arc<dyn Fn(u64) + Send + Sync>;
