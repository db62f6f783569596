//! Level gate
//!
//! Decides whether a `(category, level)` pair is enabled before any template
//! work happens. Resolution, first match wins:
//!
//! 1. a global minimum of [`LogLevel::Off`] enables everything;
//! 2. an exact category override;
//! 3. the longest matching namespace override;
//! 4. the global minimum.
//!
//! A namespace matches the category equal to it and every category that
//! continues it after a `::` or `.` separator, so `app` covers `app::db` but
//! not `apple`.
//!
//! An override set to `Off` opens the gate for its categories the same way.
//! Aliases are extra level names accepted wherever the configuration names a
//! level; they are resolved once, when the gate is built.

use super::error::{LoggerError, Result};
use super::log_level::LogLevel;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Declarative gate configuration, loadable from JSON
///
/// ```
/// use rust_template_logger::{LevelGate, LevelGateConfig, LogLevel};
///
/// let config = LevelGateConfig::from_json(r#"{
///     "minimum": "Warning",
///     "categories": { "app::auth": "Debug" },
///     "namespaces": { "app::db::*": "chatty" },
///     "aliases": { "chatty": "Trace" }
/// }"#).unwrap();
///
/// let gate = LevelGate::from_config(&config).unwrap();
/// assert!(gate.is_enabled("app::auth", LogLevel::Debug));
/// assert!(gate.is_enabled("app::db::pool", LogLevel::Trace));
/// assert!(!gate.is_enabled("app::http", LogLevel::Info));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelGateConfig {
    /// Global minimum; `None` means [`LogLevel::default`]
    pub minimum: Option<String>,
    /// Exact category name to level
    pub categories: BTreeMap<String, String>,
    /// Namespace to level; a trailing `*` and separator are accepted and ignored
    pub namespaces: BTreeMap<String, String>,
    /// Alias name to standard level name
    pub aliases: BTreeMap<String, String>,
}

impl LevelGateConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    #[must_use]
    pub fn with_minimum(mut self, level: impl Into<String>) -> Self {
        self.minimum = Some(level.into());
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>, level: impl Into<String>) -> Self {
        self.categories.insert(category.into(), level.into());
        self
    }

    #[must_use]
    pub fn with_namespace(mut self, prefix: impl Into<String>, level: impl Into<String>) -> Self {
        self.namespaces.insert(prefix.into(), level.into());
        self
    }

    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>, level: impl Into<String>) -> Self {
        self.aliases.insert(alias.into(), level.into());
        self
    }
}

/// Resolved, immutable gate
#[derive(Debug, Clone, Default)]
pub struct LevelGate {
    minimum: LogLevel,
    categories: HashMap<String, LogLevel>,
    /// Longest namespace first
    namespaces: Vec<(String, LogLevel)>,
    aliases: HashMap<String, LogLevel>,
}

impl LevelGate {
    pub fn new(minimum: LogLevel) -> Self {
        Self {
            minimum,
            ..Self::default()
        }
    }

    pub fn from_config(config: &LevelGateConfig) -> Result<Self> {
        let mut gate = Self::default();

        for (alias, level) in &config.aliases {
            let resolved = level
                .parse::<LogLevel>()
                .map_err(|_| LoggerError::invalid_level(level.as_str()))?;
            gate.aliases.insert(alias.trim().to_lowercase(), resolved);
        }

        if let Some(minimum) = &config.minimum {
            gate.minimum = gate.resolve_level(minimum)?;
        }

        for (category, level) in &config.categories {
            let level = gate.resolve_level(level)?;
            gate.categories.insert(category.clone(), level);
        }

        for (pattern, level) in &config.namespaces {
            let level = gate.resolve_level(level)?;
            let namespace = normalize_namespace(pattern).ok_or_else(|| {
                LoggerError::config("level_gate", format!("blank namespace pattern {:?}", pattern))
            })?;
            gate.namespaces.push((namespace.to_string(), level));
        }
        gate.namespaces.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        Ok(gate)
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>, level: LogLevel) -> Self {
        self.categories.insert(category.into(), level);
        self
    }

    /// Add a namespace override; a blank pattern such as `""` or `"*"` is ignored.
    #[must_use]
    pub fn with_namespace(mut self, pattern: impl Into<String>, level: LogLevel) -> Self {
        let pattern = pattern.into();
        if let Some(namespace) = normalize_namespace(&pattern) {
            self.namespaces.push((namespace.to_string(), level));
            self.namespaces.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        }
        self
    }

    #[must_use]
    pub fn with_alias(mut self, alias: &str, level: LogLevel) -> Self {
        self.aliases.insert(alias.trim().to_lowercase(), level);
        self
    }

    pub fn minimum(&self) -> LogLevel {
        self.minimum
    }

    /// Resolve a level name: configured aliases first, then the standard names.
    pub fn resolve_level(&self, name: &str) -> Result<LogLevel> {
        if let Some(level) = self.aliases.get(&name.trim().to_lowercase()) {
            return Ok(*level);
        }
        name.parse().map_err(|_| LoggerError::invalid_level(name))
    }

    /// Minimum level that applies to `category`.
    pub fn threshold(&self, category: &str) -> LogLevel {
        if let Some(level) = self.categories.get(category) {
            return *level;
        }
        self.namespaces
            .iter()
            .find(|(namespace, _)| in_namespace(category, namespace))
            .map(|(_, level)| *level)
            .unwrap_or(self.minimum)
    }

    /// Never allocates.
    #[inline]
    pub fn is_enabled(&self, category: &str, level: LogLevel) -> bool {
        if self.minimum == LogLevel::Off {
            return true;
        }
        let threshold = self.threshold(category);
        threshold == LogLevel::Off || level >= threshold
    }
}

/// Strip a trailing `*` and separator; `None` when nothing is left.
fn normalize_namespace(pattern: &str) -> Option<&str> {
    let trimmed = pattern.trim();
    let trimmed = trimmed.strip_suffix('*').unwrap_or(trimmed);
    let trimmed = trimmed
        .strip_suffix("::")
        .or_else(|| trimmed.strip_suffix('.'))
        .unwrap_or(trimmed);
    (!trimmed.is_empty()).then_some(trimmed)
}

fn in_namespace(category: &str, namespace: &str) -> bool {
    match category.strip_prefix(namespace) {
        Some("") => true,
        Some(rest) => rest.starts_with("::") || rest.starts_with('.'),
        None => false,
    }
}

/// Shared, hot-swappable gate
///
/// Readers take a read lock only long enough to check the current gate;
/// [`reconfigure`](Self::reconfigure) swaps in a new one atomically.
#[derive(Debug, Clone, Default)]
pub struct LevelGateHandle {
    inner: Arc<RwLock<Arc<LevelGate>>>,
}

impl LevelGateHandle {
    pub fn new(gate: LevelGate) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(gate))),
        }
    }

    pub fn from_config(config: &LevelGateConfig) -> Result<Self> {
        Ok(Self::new(LevelGate::from_config(config)?))
    }

    #[inline]
    pub fn is_enabled(&self, category: &str, level: LogLevel) -> bool {
        self.inner.read().is_enabled(category, level)
    }

    pub fn current(&self) -> Arc<LevelGate> {
        Arc::clone(&self.inner.read())
    }

    pub fn replace(&self, gate: LevelGate) {
        *self.inner.write() = Arc::new(gate);
    }

    /// Build a gate from `config` and swap it in; the old gate stays on error.
    pub fn reconfigure(&self, config: &LevelGateConfig) -> Result<()> {
        let gate = LevelGate::from_config(config)?;
        self.replace(gate);
        Ok(())
    }
}

impl From<LevelGate> for LevelGateHandle {
    fn from(gate: LevelGate) -> Self {
        Self::new(gate)
    }
}
