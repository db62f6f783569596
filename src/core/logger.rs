//! Logger: level gate, template binding and payload dispatch
//!
//! A [`Logger`] owns two payloads. Automatic events are appended and exported
//! in one step, so each becomes its own batch; manual events accumulate in the
//! current transaction until [`Logger::submit`] hands them over as one batch
//! and rotates to a fresh transaction.

use super::{
    emitter::Emitter,
    error::{LoggerError, Result},
    level_gate::{LevelGate, LevelGateHandle},
    log_context::LogContext,
    log_event::{CallerInfo, EventId, ExceptionInfo, LogEvent, SendMode},
    log_level::LogLevel,
    payload::{LogPayload, TransactionId},
    scope::{ScopeGuard, ScopeStack},
};
use crate::template::{MessageProcessor, Value};
use std::fmt;
use std::sync::Arc;

/// Per-logger predicate applied on top of the shared level gate
pub type LogFilter = Arc<dyn Fn(&str, LogLevel) -> bool + Send + Sync>;

/// Optional parameters of a single write
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    pub event_id: Option<EventId>,
    pub exception: Option<ExceptionInfo>,
    pub send_mode: SendMode,
    /// Named values; slots with a matching name bind to them
    pub context: LogContext,
    pub caller: Option<CallerInfo>,
    /// Scope stack to snapshot instead of the calling thread's
    pub scopes: Option<ScopeStack>,
}

impl WriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_event_id(mut self, event_id: impl Into<EventId>) -> Self {
        self.event_id = Some(event_id.into());
        self
    }

    #[must_use]
    pub fn with_exception(mut self, error: &(dyn std::error::Error + 'static)) -> Self {
        self.exception = Some(ExceptionInfo::from_error(error));
        self
    }

    #[must_use]
    pub fn with_send_mode(mut self, send_mode: SendMode) -> Self {
        self.send_mode = send_mode;
        self
    }

    #[must_use]
    pub fn manual(self) -> Self {
        self.with_send_mode(SendMode::Manual)
    }

    #[must_use]
    pub fn with_context(mut self, context: LogContext) -> Self {
        self.context = context;
        self
    }

    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.add_field(key, value);
        self
    }

    #[must_use]
    pub fn with_caller(mut self, caller: CallerInfo) -> Self {
        self.caller = Some(caller);
        self
    }

    #[must_use]
    pub fn with_scopes(mut self, scopes: ScopeStack) -> Self {
        self.scopes = Some(scopes);
        self
    }
}

pub struct Logger {
    category: String,
    send_mode: SendMode,
    gate: LevelGateHandle,
    filter: Option<LogFilter>,
    processor: Arc<MessageProcessor>,
    emitter: Arc<dyn Emitter>,
    automatic: LogPayload,
    manual: LogPayload,
}

impl Logger {
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn send_mode(&self) -> SendMode {
        self.send_mode
    }

    pub fn gate(&self) -> &LevelGateHandle {
        &self.gate
    }

    pub fn processor(&self) -> &Arc<MessageProcessor> {
        &self.processor
    }

    /// Checked before any template work; never allocates.
    #[inline]
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        if let Some(filter) = &self.filter {
            if !filter(&self.category, level) {
                return false;
            }
        }
        self.gate.is_enabled(&self.category, level)
    }

    pub fn write(&self, level: LogLevel, template: &str, args: Vec<Value>) {
        self.write_with(level, template, args, WriteOptions::default());
    }

    /// Write an event. Disabled levels and blank templates are silent no-ops.
    pub fn write_with(&self, level: LogLevel, template: &str, args: Vec<Value>, options: WriteOptions) {
        if !self.is_enabled(level) || template.trim().is_empty() {
            return;
        }

        let message = self.processor.process(template, args, options.context.fields());
        let scopes = options.scopes.unwrap_or_else(ScopeStack::current).snapshot();

        let mut event = LogEvent::new(level, self.category.as_str(), message)
            .with_send_mode(options.send_mode)
            .with_scopes(scopes);
        if !options.context.is_empty() {
            event = event.with_fields(&options.context);
        }
        if let Some(event_id) = options.event_id {
            event = event.with_id(event_id);
        }
        if let Some(exception) = options.exception {
            event = event.with_exception(exception);
        }
        if let Some(caller) = options.caller {
            event = event.with_caller(caller);
        }

        self.dispatch(event);
    }

    /// Dispatch a pre-built event by its own send mode, if its level is enabled.
    pub fn write_event(&self, event: LogEvent) {
        if !self.is_enabled(event.level()) {
            return;
        }
        self.dispatch(event);
    }

    fn dispatch(&self, event: LogEvent) {
        match SendMode::resolve(self.send_mode, event.send_mode()) {
            SendMode::Manual => {
                self.manual.append_or_begin(event);
            }
            SendMode::Automatic | SendMode::Customize => {
                self.automatic
                    .append_and_export_with(event, |batch| self.emitter.emit(batch));
            }
        }
    }

    /// Hand the current manual transaction to the emitter and open a new one.
    ///
    /// With nothing pending no batch is emitted; the transaction still rotates.
    /// Returns the id of the new transaction.
    pub fn submit(&self) -> TransactionId {
        self.manual.rotate_with(|batch| self.emitter.emit(batch))
    }

    /// Manual events waiting for [`submit`](Self::submit)
    pub fn pending_manual(&self) -> usize {
        self.manual.len()
    }

    pub fn transaction_id(&self) -> Option<TransactionId> {
        self.manual.transaction_id()
    }

    /// Push a scope on the calling thread's stack, tagged with this logger's category.
    #[must_use = "the scope is popped as soon as the guard is dropped"]
    pub fn begin_scope(&self, context: LogContext) -> ScopeGuard {
        ScopeStack::current().push(self.category.as_str(), context)
    }

    #[must_use = "the scope is popped as soon as the guard is dropped"]
    pub fn begin_scope_on(&self, stack: &ScopeStack, context: LogContext) -> ScopeGuard {
        stack.push(self.category.as_str(), context)
    }

    #[inline]
    pub fn trace(&self, template: &str, args: Vec<Value>) {
        self.write(LogLevel::Trace, template, args);
    }

    #[inline]
    pub fn debug(&self, template: &str, args: Vec<Value>) {
        self.write(LogLevel::Debug, template, args);
    }

    #[inline]
    pub fn info(&self, template: &str, args: Vec<Value>) {
        self.write(LogLevel::Info, template, args);
    }

    #[inline]
    pub fn warn(&self, template: &str, args: Vec<Value>) {
        self.write(LogLevel::Warn, template, args);
    }

    #[inline]
    pub fn error(&self, template: &str, args: Vec<Value>) {
        self.write(LogLevel::Error, template, args);
    }

    #[inline]
    pub fn fatal(&self, template: &str, args: Vec<Value>) {
        self.write(LogLevel::Fatal, template, args);
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("category", &self.category)
            .field("send_mode", &self.send_mode)
            .field("pending_manual", &self.pending_manual())
            .finish()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        // Pending manual events are submitted rather than lost
        if let Some(batch) = self.manual.close() {
            self.emitter.emit(batch);
        }
    }
}

/// Builder for constructing a Logger with a fluent API
///
/// # Example
/// ```
/// use rust_template_logger::prelude::*;
/// use std::sync::Arc;
///
/// let sink = MemorySink::new();
/// let emitter = Arc::new(ChannelEmitter::builder().sink(sink.clone()).build().unwrap());
///
/// let logger = Logger::builder()
///     .category("app::orders")
///     .min_level(LogLevel::Debug)
///     .send_mode(SendMode::Customize)
///     .emitter(emitter)
///     .build()
///     .unwrap();
///
/// logger.info("Order {Id} placed", vec![Value::from(42)]);
/// ```
pub struct LoggerBuilder {
    category: String,
    send_mode: SendMode,
    gate: Option<LevelGateHandle>,
    filter: Option<LogFilter>,
    processor: Option<Arc<MessageProcessor>>,
    emitter: Option<Arc<dyn Emitter>>,
}

impl LoggerBuilder {
    pub fn new() -> Self {
        Self {
            category: String::new(),
            send_mode: SendMode::Automatic,
            gate: None,
            filter: None,
            processor: None,
            emitter: None,
        }
    }

    /// Category (state namespace) stamped on every event and scope frame
    #[must_use = "builder methods return a new value"]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn send_mode(mut self, send_mode: SendMode) -> Self {
        self.send_mode = send_mode;
        self
    }

    /// Use a private gate with a single global minimum
    #[must_use = "builder methods return a new value"]
    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.gate = Some(LevelGateHandle::new(LevelGate::new(level)));
        self
    }

    /// Share a gate with other loggers; reconfiguring it affects all of them
    #[must_use = "builder methods return a new value"]
    pub fn gate(mut self, gate: LevelGateHandle) -> Self {
        self.gate = Some(gate);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&str, LogLevel) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// Share a processor, and with it the template cache
    #[must_use = "builder methods return a new value"]
    pub fn processor(mut self, processor: Arc<MessageProcessor>) -> Self {
        self.processor = Some(processor);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn emitter(mut self, emitter: Arc<dyn Emitter>) -> Self {
        self.emitter = Some(emitter);
        self
    }

    /// Fails when no emitter was given or the category is blank.
    pub fn build(self) -> Result<Logger> {
        let emitter = self
            .emitter
            .ok_or_else(|| LoggerError::config("Logger", "an emitter is required"))?;
        if self.category.trim().is_empty() {
            return Err(LoggerError::config("Logger", "category must not be empty"));
        }

        Ok(Logger {
            automatic: LogPayload::new(self.category.as_str()),
            manual: LogPayload::new(self.category.as_str()),
            category: self.category,
            send_mode: self.send_mode,
            gate: self.gate.unwrap_or_default(),
            filter: self.filter,
            processor: self
                .processor
                .unwrap_or_else(|| Arc::new(MessageProcessor::new())),
            emitter,
        })
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
