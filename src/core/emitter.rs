//! Emission boundary
//!
//! Loggers hand finished [`LogBatch`]es to an [`Emitter`]. The call must return
//! after a bounded hand-off and must never report sink failures back to the
//! writer. [`ChannelEmitter`] is the reference implementation: a bounded queue
//! drained by one worker thread that fans batches out to [`Sink`]s.

use super::{
    error::{LoggerError, Result},
    metrics::LoggerMetrics,
    overflow_policy::{OverflowCallback, OverflowPolicy},
    payload::LogBatch,
    sink::Sink,
};
use crossbeam_channel::{bounded, Receiver, SendTimeoutError, Sender, TrySendError};
use parking_lot::{Mutex, RwLock};
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Default shutdown timeout for emitter cleanup (5 seconds)
///
/// Used when the emitter is dropped without explicit shutdown.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Default number of batches the hand-off queue holds
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// How often a writer blocked on a full queue checks for shutdown
const BLOCK_POLL_INTERVAL: Duration = Duration::from_millis(10);

enum BlockedSend {
    Sent,
    TimedOut,
    Closed,
}

/// Accepts finished batches from loggers
pub trait Emitter: Send + Sync {
    /// Hand a batch off; never blocks beyond the hand-off, never fails the caller.
    fn emit(&self, batch: LogBatch);
}

/// Emitter backed by a closure, called on the emitting thread.
pub struct FnEmitter<F>(pub F);

impl<F> Emitter for FnEmitter<F>
where
    F: Fn(LogBatch) + Send + Sync,
{
    fn emit(&self, batch: LogBatch) {
        (self.0)(batch)
    }
}

impl<F> fmt::Debug for FnEmitter<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnEmitter")
    }
}

/// Bounded hand-off queue plus a worker thread writing to sinks
pub struct ChannelEmitter {
    sender: RwLock<Option<Sender<LogBatch>>>,
    /// Set once shutdown starts; blocked writers give up their batch
    closed: AtomicBool,
    worker: Mutex<Option<thread::JoinHandle<()>>>,
    capacity: usize,
    /// Batches accepted but not yet written by the worker
    pending: Arc<AtomicUsize>,
    metrics: Arc<LoggerMetrics>,
    overflow_policy: OverflowPolicy,
    on_overflow: Option<OverflowCallback>,
}

impl ChannelEmitter {
    pub fn builder() -> ChannelEmitterBuilder {
        ChannelEmitterBuilder::new()
    }

    fn start(
        capacity: usize,
        sinks: Vec<Box<dyn Sink>>,
        overflow_policy: OverflowPolicy,
        on_overflow: Option<OverflowCallback>,
    ) -> Result<Self> {
        let (sender, receiver) = bounded(capacity);
        let pending = Arc::new(AtomicUsize::new(0));
        let metrics = Arc::new(LoggerMetrics::new());

        let worker_pending = Arc::clone(&pending);
        let worker_metrics = Arc::clone(&metrics);
        let handle = thread::Builder::new()
            .name("log-emitter".to_string())
            .spawn(move || Self::run_worker(receiver, sinks, &worker_pending, &worker_metrics))?;

        Ok(Self {
            sender: RwLock::new(Some(sender)),
            closed: AtomicBool::new(false),
            worker: Mutex::new(Some(handle)),
            capacity,
            pending,
            metrics,
            overflow_policy,
            on_overflow,
        })
    }

    fn run_worker(
        receiver: Receiver<LogBatch>,
        mut sinks: Vec<Box<dyn Sink>>,
        pending: &AtomicUsize,
        metrics: &LoggerMetrics,
    ) {
        // Batches are written in arrival order; sinks are flushed whenever the
        // queue runs dry and once more when the channel closes.
        while let Ok(batch) = receiver.recv() {
            Self::process_batch(&mut sinks, &batch, metrics);
            if receiver.is_empty() {
                Self::flush_sinks(&mut sinks);
            }
            pending.fetch_sub(1, Ordering::AcqRel);
        }
        Self::flush_sinks(&mut sinks);
    }

    /// Write one batch to every sink
    ///
    /// **Per-Sink Panic Isolation**: each sink call is wrapped in catch_unwind
    /// so one failing sink cannot stop the others from receiving the batch.
    fn process_batch(sinks: &mut [Box<dyn Sink>], batch: &LogBatch, metrics: &LoggerMetrics) {
        for sink in sinks.iter_mut() {
            let result = catch_unwind(AssertUnwindSafe(|| sink.write_batch(batch)));

            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    eprintln!("[LOGGER ERROR] Sink '{}' failed: {}", sink.name(), e);
                    metrics.record_sink_error();
                }
                Err(panic_info) => {
                    eprintln!(
                        "[LOGGER CRITICAL] Sink '{}' panicked: {}. \
                         Other sinks continue to function.",
                        sink.name(),
                        panic_message(panic_info.as_ref())
                    );
                    metrics.record_sink_error();
                }
            }
        }
    }

    fn flush_sinks(sinks: &mut [Box<dyn Sink>]) {
        for sink in sinks.iter_mut() {
            match catch_unwind(AssertUnwindSafe(|| sink.flush())) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    eprintln!("[LOGGER ERROR] Sink '{}' flush failed: {}", sink.name(), e);
                }
                Err(panic_info) => {
                    eprintln!(
                        "[LOGGER CRITICAL] Sink '{}' panicked during flush: {}. \
                         Other sinks continue to function.",
                        sink.name(),
                        panic_message(panic_info.as_ref())
                    );
                }
            }
        }
    }

    /// Hand a batch to the queue, reporting why it was not accepted.
    ///
    /// [`Emitter::emit`] applies the overflow policy on top of this.
    pub fn try_emit(&self, batch: LogBatch) -> Result<()> {
        let sender = self.sender.read().clone().ok_or(LoggerError::EmitterStopped)?;
        let events = batch.len();

        self.pending.fetch_add(1, Ordering::AcqRel);
        match sender.try_send(batch) {
            Ok(()) => {
                self.metrics.record_batch(events);
                Ok(())
            }
            Err(TrySendError::Full(_)) => {
                self.pending.fetch_sub(1, Ordering::AcqRel);
                Err(LoggerError::queue_full(sender.len(), self.capacity))
            }
            Err(TrySendError::Disconnected(_)) => {
                self.pending.fetch_sub(1, Ordering::AcqRel);
                Err(LoggerError::ChannelSendError)
            }
        }
    }

    fn send(&self, sender: &Sender<LogBatch>, batch: LogBatch) {
        let events = batch.len();

        self.pending.fetch_add(1, Ordering::AcqRel);
        let batch = match sender.try_send(batch) {
            Ok(()) => {
                self.metrics.record_batch(events);
                return;
            }
            Err(TrySendError::Full(batch)) => batch,
            Err(TrySendError::Disconnected(_)) => {
                self.pending.fetch_sub(1, Ordering::AcqRel);
                self.metrics.record_dropped(events);
                return;
            }
        };

        self.metrics.record_queue_full();
        let accepted = match &self.overflow_policy {
            OverflowPolicy::Block => {
                self.metrics.record_block();
                matches!(self.send_blocking(sender, batch, None), BlockedSend::Sent)
            }
            OverflowPolicy::BlockWithTimeout(timeout) => {
                self.metrics.record_block();
                match self.send_blocking(sender, batch, Some(*timeout)) {
                    BlockedSend::Sent => true,
                    BlockedSend::TimedOut => {
                        self.pending.fetch_sub(1, Ordering::AcqRel);
                        self.alert_and_drop(events);
                        return;
                    }
                    BlockedSend::Closed => false,
                }
            }
            OverflowPolicy::DropNewest => {
                self.pending.fetch_sub(1, Ordering::AcqRel);
                self.metrics.record_dropped(events);
                return;
            }
            OverflowPolicy::AlertAndDrop => {
                self.pending.fetch_sub(1, Ordering::AcqRel);
                self.alert_and_drop(events);
                return;
            }
        };

        if accepted {
            self.metrics.record_batch(events);
        } else {
            self.pending.fetch_sub(1, Ordering::AcqRel);
            self.metrics.record_dropped(events);
        }
    }

    /// Wait for queue space in short slices so shutdown is never held up by a
    /// writer stuck behind a slow sink.
    fn send_blocking(&self, sender: &Sender<LogBatch>, mut batch: LogBatch, timeout: Option<Duration>) -> BlockedSend {
        let deadline = timeout.map(|t| Instant::now() + t);
        loop {
            let slice = match deadline {
                Some(deadline) => {
                    let left = deadline.saturating_duration_since(Instant::now());
                    if left.is_zero() {
                        return BlockedSend::TimedOut;
                    }
                    left.min(BLOCK_POLL_INTERVAL)
                }
                None => BLOCK_POLL_INTERVAL,
            };

            match sender.send_timeout(batch, slice) {
                Ok(()) => return BlockedSend::Sent,
                Err(SendTimeoutError::Timeout(returned)) => {
                    if self.closed.load(Ordering::Acquire) {
                        return BlockedSend::Closed;
                    }
                    batch = returned;
                }
                Err(SendTimeoutError::Disconnected(_)) => return BlockedSend::Closed,
            }
        }
    }

    /// Drop a batch with alert notification
    fn alert_and_drop(&self, events: usize) {
        let total = self.metrics.record_dropped(events);
        let previous = total - events as u64;

        // Alert on first drop and every thousand dropped events thereafter
        if previous == 0 || previous / 1000 != total / 1000 {
            eprintln!(
                "[LOGGER WARNING] Emission queue full, {} events dropped. \
                 Consider increasing queue capacity or using a different overflow policy.",
                total
            );

            if let Some(ref callback) = self.on_overflow {
                callback(total);
            }
        }
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.metrics
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Batches accepted but not yet written to every sink
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    pub fn is_running(&self) -> bool {
        self.sender.read().is_some()
    }

    /// Wait until every accepted batch has been written
    ///
    /// Returns `false` if the timeout expired first.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let start = Instant::now();
        while self.pending() > 0 {
            if start.elapsed() >= timeout {
                return false;
            }
            thread::sleep(Duration::from_millis(1));
        }
        true
    }

    /// Gracefully shut down with a custom timeout
    ///
    /// Stops accepting batches, lets the worker drain the queue and flush every
    /// sink. Writers blocked on a full queue drop their batch, and later calls
    /// to `emit` count their events as dropped. The timeout covers the whole
    /// call, including a worker stuck in a slow sink.
    ///
    /// # Returns
    ///
    /// `true` if the worker finished within the timeout, `false` otherwise
    ///
    /// # Example
    ///
    /// ```
    /// use rust_template_logger::prelude::*;
    /// use std::time::Duration;
    ///
    /// let emitter = ChannelEmitter::builder()
    ///     .sink(MemorySink::new())
    ///     .build()
    ///     .unwrap();
    ///
    /// assert!(emitter.shutdown(Duration::from_secs(1)));
    /// assert!(!emitter.is_running());
    /// ```
    pub fn shutdown(&self, timeout: Duration) -> bool {
        // Close the channel to signal the worker thread
        self.closed.store(true, Ordering::Release);
        drop(self.sender.write().take());

        let Some(handle) = self.worker.lock().take() else {
            return true;
        };

        let start = Instant::now();
        loop {
            if handle.is_finished() {
                if let Err(e) = handle.join() {
                    eprintln!("[LOGGER ERROR] Emitter worker thread panicked during shutdown: {:?}", e);
                    return false;
                }
                return true;
            }

            if start.elapsed() >= timeout {
                eprintln!(
                    "[LOGGER WARNING] Emitter worker thread did not finish within {:?} timeout. \
                     Some logs may be lost.",
                    timeout
                );
                return false;
            }

            // Small sleep to avoid busy-waiting
            thread::sleep(Duration::from_millis(10));
        }
    }
}

impl Emitter for ChannelEmitter {
    fn emit(&self, batch: LogBatch) {
        if batch.is_empty() {
            return;
        }

        let sender = self.sender.read().clone();
        match sender {
            Some(sender) => self.send(&sender, batch),
            None => {
                self.metrics.record_dropped(batch.len());
            }
        }
    }
}

impl fmt::Debug for ChannelEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelEmitter")
            .field("capacity", &self.capacity)
            .field("pending", &self.pending())
            .field("overflow_policy", &self.overflow_policy)
            .field("running", &self.is_running())
            .finish()
    }
}

impl Drop for ChannelEmitter {
    fn drop(&mut self) {
        self.shutdown(DEFAULT_SHUTDOWN_TIMEOUT);

        // Report any dropped events
        let dropped = self.metrics.dropped_count();
        if dropped > 0 {
            eprintln!(
                "[LOGGER WARNING] Emitter shutting down with {} dropped events (drop rate: {:.2}%)",
                dropped,
                self.metrics.drop_rate()
            );
        }
    }
}

fn panic_message(panic_info: &(dyn Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Builder for [`ChannelEmitter`]
///
/// # Example
/// ```
/// use rust_template_logger::prelude::*;
/// use std::sync::Arc;
///
/// let emitter = ChannelEmitter::builder()
///     .sink(MemorySink::new())
///     .capacity(256)
///     .overflow_policy(OverflowPolicy::AlertAndDrop)
///     .on_overflow(Arc::new(|count| {
///         eprintln!("ALERT: {} events dropped", count);
///     }))
///     .build()
///     .unwrap();
/// ```
pub struct ChannelEmitterBuilder {
    sinks: Vec<Box<dyn Sink>>,
    capacity: usize,
    overflow_policy: OverflowPolicy,
    on_overflow: Option<OverflowCallback>,
}

impl ChannelEmitterBuilder {
    pub fn new() -> Self {
        Self {
            sinks: Vec::new(),
            capacity: DEFAULT_QUEUE_CAPACITY,
            overflow_policy: OverflowPolicy::default(),
            on_overflow: None,
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn sink<S: Sink + 'static>(mut self, sink: S) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    /// Queue capacity in batches
    #[must_use = "builder methods return a new value"]
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.overflow_policy = policy;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn on_overflow(mut self, callback: OverflowCallback) -> Self {
        self.on_overflow = Some(callback);
        self
    }

    /// Start the worker thread.
    pub fn build(self) -> Result<ChannelEmitter> {
        if self.capacity == 0 {
            return Err(LoggerError::config("ChannelEmitter", "queue capacity must be at least 1"));
        }
        ChannelEmitter::start(self.capacity, self.sinks, self.overflow_policy, self.on_overflow)
    }
}

impl Default for ChannelEmitterBuilder {
    fn default() -> Self {
        Self::new()
    }
}
