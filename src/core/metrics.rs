//! Emission metrics
//!
//! Counters for monitoring the emission boundary: batches handed off, events
//! delivered to sinks, drops caused by queue overflow and sink failures.

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters describing emitter health
///
/// # Example
///
/// ```
/// use rust_template_logger::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
/// metrics.record_batch(3);
/// metrics.record_dropped(2);
///
/// assert_eq!(metrics.batches_emitted(), 1);
/// assert_eq!(metrics.events_emitted(), 3);
/// assert_eq!(metrics.dropped_count(), 2);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Batches accepted by the queue
    batches_emitted: AtomicU64,

    /// Events inside accepted batches
    events_emitted: AtomicU64,

    /// Events lost because their batch was dropped
    dropped_count: AtomicU64,

    /// Number of times the queue was found full
    queue_full_events: AtomicU64,

    /// Number of times a writer waited for queue space
    block_events: AtomicU64,

    /// Failed or panicking sink writes
    sink_errors: AtomicU64,
}

impl LoggerMetrics {
    pub const fn new() -> Self {
        Self {
            batches_emitted: AtomicU64::new(0),
            events_emitted: AtomicU64::new(0),
            dropped_count: AtomicU64::new(0),
            queue_full_events: AtomicU64::new(0),
            block_events: AtomicU64::new(0),
            sink_errors: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn batches_emitted(&self) -> u64 {
        self.batches_emitted.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn events_emitted(&self) -> u64 {
        self.events_emitted.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn queue_full_events(&self) -> u64 {
        self.queue_full_events.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn block_events(&self) -> u64 {
        self.block_events.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn sink_errors(&self) -> u64 {
        self.sink_errors.load(Ordering::Relaxed)
    }

    /// Record an accepted batch of `events` events
    #[inline]
    pub fn record_batch(&self, events: usize) {
        self.batches_emitted.fetch_add(1, Ordering::Relaxed);
        self.events_emitted.fetch_add(events as u64, Ordering::Relaxed);
    }

    /// Record `events` dropped events; returns the new total
    #[inline]
    pub fn record_dropped(&self, events: usize) -> u64 {
        self.dropped_count.fetch_add(events as u64, Ordering::Relaxed) + events as u64
    }

    #[inline]
    pub fn record_queue_full(&self) -> u64 {
        self.queue_full_events.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_block(&self) -> u64 {
        self.block_events.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_sink_error(&self) -> u64 {
        self.sink_errors.fetch_add(1, Ordering::Relaxed)
    }

    /// Get drop rate as a percentage (0.0 - 100.0)
    ///
    /// Returns 0.0 if no events have been emitted or dropped.
    pub fn drop_rate(&self) -> f64 {
        let dropped = self.dropped_count() as f64;
        let total = self.events_emitted() as f64 + dropped;
        if total == 0.0 {
            0.0
        } else {
            (dropped / total) * 100.0
        }
    }

    pub fn reset(&self) {
        self.batches_emitted.store(0, Ordering::Relaxed);
        self.events_emitted.store(0, Ordering::Relaxed);
        self.dropped_count.store(0, Ordering::Relaxed);
        self.queue_full_events.store(0, Ordering::Relaxed);
        self.block_events.store(0, Ordering::Relaxed);
        self.sink_errors.store(0, Ordering::Relaxed);
    }
}

impl Default for LoggerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LoggerMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            batches_emitted: AtomicU64::new(self.batches_emitted()),
            events_emitted: AtomicU64::new(self.events_emitted()),
            dropped_count: AtomicU64::new(self.dropped_count()),
            queue_full_events: AtomicU64::new(self.queue_full_events()),
            block_events: AtomicU64::new(self.block_events()),
            sink_errors: AtomicU64::new(self.sink_errors()),
        }
    }
}
