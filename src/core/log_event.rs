//! Log event structure

use super::log_context::LogContext;
use super::log_level::LogLevel;
use super::scope::ScopeFrame;
use crate::template::{LogProperty, ParsedTemplate, ProcessedMessage, PropertyResolver, ResolvingMode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::cell::RefCell;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_EVENT_ID: AtomicU64 = AtomicU64::new(1);

// Thread-local caches for thread information to avoid repeated allocations
thread_local! {
    static THREAD_ID_CACHE: RefCell<Option<String>> = const { RefCell::new(None) };
    static THREAD_NAME_CACHE: RefCell<Option<Option<String>>> = const { RefCell::new(None) };
}

/// Get cached thread ID, computing and caching it on first access
fn get_thread_id() -> String {
    THREAD_ID_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| format!("{:?}", std::thread::current().id()))
            .clone()
    })
}

/// Get cached thread name, computing and caching it on first access
fn get_thread_name() -> Option<String> {
    THREAD_NAME_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| std::thread::current().name().map(String::from))
            .clone()
    })
}

/// How an event reaches the emission boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SendMode {
    /// Each event is emitted as soon as it is written
    #[default]
    Automatic,
    /// Events accumulate until the logger is submitted
    Manual,
    /// Logger level: let each call decide. Call level: no preference.
    Customize,
}

impl SendMode {
    /// Combine a logger's configured mode with a per-call request.
    ///
    /// A fixed logger mode always wins; a `Customize` logger follows the call,
    /// treating "no preference" as automatic. Never returns `Customize`.
    pub fn resolve(logger_mode: SendMode, call_mode: SendMode) -> SendMode {
        match logger_mode {
            SendMode::Automatic => SendMode::Automatic,
            SendMode::Manual => SendMode::Manual,
            SendMode::Customize => match call_mode {
                SendMode::Manual => SendMode::Manual,
                SendMode::Automatic | SendMode::Customize => SendMode::Automatic,
            },
        }
    }
}

impl fmt::Display for SendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendMode::Automatic => write!(f, "Automatic"),
            SendMode::Manual => write!(f, "Manual"),
            SendMode::Customize => write!(f, "Customize"),
        }
    }
}

/// Identifier of a log event: a number plus an optional name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId {
    pub id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl EventId {
    /// Mint a fresh process-unique id.
    pub fn next() -> Self {
        Self {
            id: NEXT_EVENT_ID.fetch_add(1, Ordering::Relaxed),
            name: None,
        }
    }

    pub fn named(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: Some(name.into()),
        }
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::next()
    }
}

impl From<u64> for EventId {
    fn from(id: u64) -> Self {
        Self { id, name: None }
    }
}

/// Where a log call originated. Informational only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerInfo {
    pub member: String,
    pub file: String,
    pub line: u32,
}

impl CallerInfo {
    pub fn new(member: impl Into<String>, file: impl Into<String>, line: u32) -> Self {
        Self {
            member: member.into(),
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for CallerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}:{})", self.member, self.file, self.line)
    }
}

/// An error captured with its chain of sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionInfo {
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub sources: Vec<String>,
}

impl ExceptionInfo {
    pub fn from_error(error: &(dyn std::error::Error + 'static)) -> Self {
        let mut sources = Vec::new();
        let mut current = error.source();
        while let Some(source) = current {
            sources.push(source.to_string());
            current = source.source();
        }
        Self {
            message: error.to_string(),
            sources,
        }
    }
}

impl fmt::Display for ExceptionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        for source in &self.sources {
            write!(f, ": {}", source)?;
        }
        Ok(())
    }
}

/// Ambient data captured when the event was created.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EventContext {
    /// Named values supplied with the call
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<LogProperty>,
    /// Live scope frames, innermost first
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<Arc<ScopeFrame>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caller: Option<CallerInfo>,
}

impl EventContext {
    /// Look a name up in the call fields, then in scopes from the innermost out.
    pub fn find(&self, name: &str) -> Option<&LogProperty> {
        self.fields
            .iter()
            .find(|p| p.name == name)
            .or_else(|| self.scopes.iter().find_map(|frame| frame.property(name)))
    }
}

fn serialize_template<S: Serializer>(template: &Arc<ParsedTemplate>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(template.text())
}

/// An immutable log event.
#[derive(Debug, Clone, Serialize)]
pub struct LogEvent {
    id: EventId,
    timestamp: DateTime<Utc>,
    level: LogLevel,
    category: String,
    #[serde(rename = "message_template", serialize_with = "serialize_template")]
    template: Arc<ParsedTemplate>,
    properties: Vec<LogProperty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    exception: Option<ExceptionInfo>,
    send_mode: SendMode,
    context: EventContext,
    thread_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    thread_name: Option<String>,
}

impl LogEvent {
    pub fn new(level: LogLevel, category: impl Into<String>, message: ProcessedMessage) -> Self {
        Self {
            id: EventId::next(),
            timestamp: Utc::now(),
            level,
            category: category.into(),
            template: message.template,
            properties: message.properties,
            exception: None,
            send_mode: SendMode::Customize,
            context: EventContext::default(),
            thread_id: get_thread_id(),
            thread_name: get_thread_name(),
        }
    }

    pub fn with_id(mut self, id: EventId) -> Self {
        self.id = id;
        self
    }

    pub fn with_exception(mut self, exception: ExceptionInfo) -> Self {
        self.exception = Some(exception);
        self
    }

    pub fn with_send_mode(mut self, send_mode: SendMode) -> Self {
        self.send_mode = send_mode;
        self
    }

    pub fn with_caller(mut self, caller: CallerInfo) -> Self {
        self.context.caller = Some(caller);
        self
    }

    /// Attach call fields; they are resolved as destructured properties.
    pub fn with_fields(mut self, fields: &LogContext) -> Self {
        let resolver = PropertyResolver::new();
        self.context.fields = fields
            .fields()
            .iter()
            .map(|(name, value)| resolver.resolve(name.as_str(), value, ResolvingMode::Destructure))
            .collect();
        self
    }

    pub fn with_scopes(mut self, scopes: Vec<Arc<ScopeFrame>>) -> Self {
        self.context.scopes = scopes;
        self
    }

    pub fn id(&self) -> &EventId {
        &self.id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn template(&self) -> &ParsedTemplate {
        &self.template
    }

    pub fn properties(&self) -> &[LogProperty] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&LogProperty> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn exception(&self) -> Option<&ExceptionInfo> {
        self.exception.as_ref()
    }

    /// The mode requested for this event; see [`SendMode::resolve`].
    pub fn send_mode(&self) -> SendMode {
        self.send_mode
    }

    pub fn context(&self) -> &EventContext {
        &self.context
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    pub fn thread_name(&self) -> Option<&str> {
        self.thread_name.as_deref()
    }

    /// Render the message template with the bound properties.
    pub fn render_message(&self) -> String {
        self.template.render(&self.properties)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
