//! In-memory sink that keeps every batch it receives

use crate::core::{LogBatch, LogEvent, Result, Sink};
use parking_lot::Mutex;
use std::sync::Arc;

/// Captures batches for later inspection
///
/// Clones share the same storage, so a clone kept by the caller observes what
/// the emitter's copy receives.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    batches: Arc<Mutex<Vec<LogBatch>>>,
    flushes: Arc<Mutex<usize>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batches(&self) -> Vec<LogBatch> {
        self.batches.lock().clone()
    }

    /// Every captured event, in arrival order
    pub fn events(&self) -> Vec<LogEvent> {
        self.batches
            .lock()
            .iter()
            .flat_map(|batch| batch.events.iter().cloned())
            .collect()
    }

    /// Rendered messages of every captured event
    pub fn messages(&self) -> Vec<String> {
        self.batches
            .lock()
            .iter()
            .flat_map(|batch| batch.events.iter().map(LogEvent::render_message))
            .collect()
    }

    pub fn batch_count(&self) -> usize {
        self.batches.lock().len()
    }

    pub fn event_count(&self) -> usize {
        self.batches.lock().iter().map(LogBatch::len).sum()
    }

    pub fn flush_count(&self) -> usize {
        *self.flushes.lock()
    }

    pub fn clear(&self) {
        self.batches.lock().clear();
    }
}

impl Sink for MemorySink {
    fn write_batch(&mut self, batch: &LogBatch) -> Result<()> {
        self.batches.lock().push(batch.clone());
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        *self.flushes.lock() += 1;
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
