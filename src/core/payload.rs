//! Transaction-scoped event buffers
//!
//! A [`LogPayload`] belongs to one logger. Appends and exports are serialized
//! on one lock, so an export yields exactly the events appended before it and
//! rotation to a new transaction happens in the same critical section as the
//! clear.

use super::error::{LoggerError, Result};
use super::log_event::LogEvent;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TRANSACTION: AtomicU64 = AtomicU64::new(1);

/// Identifier of one payload transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransactionId(u64);

impl TransactionId {
    pub fn next() -> Self {
        TransactionId(NEXT_TRANSACTION.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tx-{}", self.0)
    }
}

/// Exported contents of one transaction, in append order.
#[derive(Debug, Clone, Serialize)]
pub struct LogBatch {
    pub transaction_id: TransactionId,
    pub category: String,
    pub events: Vec<LogEvent>,
}

impl LogBatch {
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[derive(Debug)]
struct PayloadState {
    transaction: Option<TransactionId>,
    events: Vec<LogEvent>,
}

/// Append-only buffer of events under an optional active transaction
#[derive(Debug)]
pub struct LogPayload {
    category: String,
    state: Mutex<PayloadState>,
}

impl LogPayload {
    /// Create a payload with an open transaction.
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            state: Mutex::new(PayloadState {
                transaction: Some(TransactionId::next()),
                events: Vec::new(),
            }),
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn transaction_id(&self) -> Option<TransactionId> {
        self.state.lock().transaction
    }

    pub fn is_active(&self) -> bool {
        self.state.lock().transaction.is_some()
    }

    pub fn len(&self) -> usize {
        self.state.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().events.is_empty()
    }

    /// Open a transaction unless one is already active; returns the active id.
    pub fn begin(&self) -> TransactionId {
        *self
            .state
            .lock()
            .transaction
            .get_or_insert_with(TransactionId::next)
    }

    /// Append to the active transaction.
    pub fn append(&self, event: LogEvent) -> Result<TransactionId> {
        let mut state = self.state.lock();
        let transaction = state
            .transaction
            .ok_or_else(|| LoggerError::no_active_transaction(self.category.as_str()))?;
        state.events.push(event);
        Ok(transaction)
    }

    /// Append, opening an implicit transaction first if none is active.
    pub fn append_or_begin(&self, event: LogEvent) -> TransactionId {
        let mut state = self.state.lock();
        let transaction = *state.transaction.get_or_insert_with(TransactionId::next);
        state.events.push(event);
        transaction
    }

    /// Take every buffered event; the transaction stays open.
    ///
    /// Returns `None` when there is nothing to export.
    pub fn export(&self) -> Option<LogBatch> {
        let mut state = self.state.lock();
        self.take(&mut state, false)
    }

    /// Take every buffered event and rotate to a fresh transaction.
    pub fn export_and_rotate(&self) -> Option<LogBatch> {
        let mut state = self.state.lock();
        self.take(&mut state, true)
    }

    /// Take every buffered event and leave no active transaction.
    pub fn close(&self) -> Option<LogBatch> {
        let mut state = self.state.lock();
        let batch = self.take(&mut state, false);
        state.transaction = None;
        batch
    }

    /// Append then export in one critical section, passing the batch to `emit`
    /// while the lock is held so batches from this payload keep their order.
    pub fn append_and_export_with<F>(&self, event: LogEvent, emit: F)
    where
        F: FnOnce(LogBatch),
    {
        let mut state = self.state.lock();
        state.transaction.get_or_insert_with(TransactionId::next);
        state.events.push(event);
        if let Some(batch) = self.take(&mut state, false) {
            emit(batch);
        }
    }

    /// Export and rotate, passing a non-empty batch to `emit` under the lock.
    ///
    /// The transaction rotates even when nothing was buffered.
    pub fn rotate_with<F>(&self, emit: F) -> TransactionId
    where
        F: FnOnce(LogBatch),
    {
        let mut state = self.state.lock();
        if let Some(batch) = self.take(&mut state, true) {
            emit(batch);
        }
        state.transaction.unwrap_or_else(TransactionId::next)
    }

    fn take(&self, state: &mut PayloadState, rotate: bool) -> Option<LogBatch> {
        let transaction = state.transaction;
        if rotate {
            state.transaction = Some(TransactionId::next());
        }

        if state.events.is_empty() {
            return None;
        }
        Some(LogBatch {
            transaction_id: transaction.unwrap_or_else(TransactionId::next),
            category: self.category.clone(),
            events: std::mem::take(&mut state.events),
        })
    }
}
