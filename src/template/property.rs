//! Log properties and the property resolver
//!
//! The resolver turns an argument plus the slot's resolving mode into a
//! [`LogProperty`]. Destructuring walks the argument with an explicit work
//! stack and a depth counter, so arbitrarily nested input cannot overflow the
//! call stack; anything nested deeper than the cap collapses to its text form.

use super::format::format_scalar;
use super::token::{PropertySlot, ResolvingMode};
use super::value::{write_quoted, Value};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default nesting depth kept when destructuring.
pub const DEFAULT_MAX_DESTRUCTURE_DEPTH: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Timestamp(DateTime<Utc>),
    Str(String),
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Bool(b) => write!(f, "{}", b),
            ScalarValue::Int(i) => write!(f, "{}", i),
            ScalarValue::UInt(u) => write!(f, "{}", u),
            ScalarValue::Float(fl) => write!(f, "{}", fl),
            ScalarValue::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
            ScalarValue::Str(s) => write!(f, "{}", s),
        }
    }
}

/// Resolved value of a property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PropertyValue {
    /// Null or absent argument
    Empty,
    Scalar(ScalarValue),
    Sequence(Vec<PropertyValue>),
    Structure(Vec<LogProperty>),
}

impl PropertyValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, PropertyValue::Empty)
    }

    pub fn as_scalar(&self) -> Option<&ScalarValue> {
        match self {
            PropertyValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Child property of a structure by name.
    pub fn field(&self, name: &str) -> Option<&LogProperty> {
        match self {
            PropertyValue::Structure(fields) => fields.iter().find(|p| p.name == name),
            _ => None,
        }
    }

    fn write_text(&self, f: &mut fmt::Formatter<'_>, nested: bool) -> fmt::Result {
        match self {
            PropertyValue::Empty => write!(f, "null"),
            PropertyValue::Scalar(ScalarValue::Str(s)) if nested => write_quoted(f, s),
            PropertyValue::Scalar(s) => write!(f, "{}", s),
            PropertyValue::Sequence(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    item.write_text(f, true)?;
                }
                write!(f, "]")
            }
            PropertyValue::Structure(fields) => {
                write!(f, "{{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write_quoted(f, &field.name)?;
                    write!(f, ": ")?;
                    field.value.write_text(f, true)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_text(f, false)
    }
}

/// A named, resolved property of a log event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogProperty {
    pub name: String,
    pub value: PropertyValue,
    pub mode: ResolvingMode,
}

impl LogProperty {
    pub fn new(name: impl Into<String>, value: PropertyValue, mode: ResolvingMode) -> Self {
        Self {
            name: name.into(),
            value,
            mode,
        }
    }

    /// Render for a template slot, applying its format specifier and alignment.
    pub fn render(&self, slot: &PropertySlot) -> String {
        let text = match &self.value {
            PropertyValue::Scalar(scalar) if self.mode == ResolvingMode::Default => {
                format_scalar(scalar, slot.format.as_deref())
            }
            other => other.to_string(),
        };
        match slot.alignment {
            Some(alignment) => alignment.apply(text),
            None => text,
        }
    }
}

/// Converts arguments into property values.
#[derive(Debug, Clone, Copy)]
pub struct PropertyResolver {
    max_depth: usize,
}

impl PropertyResolver {
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DESTRUCTURE_DEPTH,
        }
    }

    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Resolve `value` under `mode` into a property called `name`.
    pub fn resolve(&self, name: impl Into<String>, value: &Value, mode: ResolvingMode) -> LogProperty {
        let resolved = match mode {
            _ if value.is_null() => PropertyValue::Empty,
            ResolvingMode::Stringify => PropertyValue::Scalar(ScalarValue::Str(value.to_string())),
            ResolvingMode::Destructure => self.destructure(value),
            ResolvingMode::Default => Self::scalar(value),
        };
        LogProperty::new(name, resolved, mode)
    }

    /// Scalars stay typed; composites collapse to their text form.
    fn scalar(value: &Value) -> PropertyValue {
        match value {
            Value::Null => PropertyValue::Empty,
            Value::Bool(b) => PropertyValue::Scalar(ScalarValue::Bool(*b)),
            Value::Int(i) => PropertyValue::Scalar(ScalarValue::Int(*i)),
            Value::UInt(u) => PropertyValue::Scalar(ScalarValue::UInt(*u)),
            Value::Float(f) => PropertyValue::Scalar(ScalarValue::Float(*f)),
            Value::Str(s) => PropertyValue::Scalar(ScalarValue::Str(s.clone())),
            Value::Timestamp(ts) => PropertyValue::Scalar(ScalarValue::Timestamp(*ts)),
            Value::Seq(_) | Value::Map(_) => PropertyValue::Scalar(ScalarValue::Str(value.to_string())),
        }
    }

    fn destructure(&self, root: &Value) -> PropertyValue {
        enum Task<'a> {
            Visit(&'a Value, usize),
            Sequence(usize),
            Structure(Vec<&'a str>),
        }

        let mut tasks = vec![Task::Visit(root, 0)];
        let mut done: Vec<PropertyValue> = Vec::new();

        while let Some(task) = tasks.pop() {
            match task {
                Task::Visit(Value::Seq(items), depth) if depth < self.max_depth => {
                    tasks.push(Task::Sequence(items.len()));
                    tasks.extend(items.iter().rev().map(|item| Task::Visit(item, depth + 1)));
                }
                Task::Visit(Value::Map(fields), depth) if depth < self.max_depth => {
                    tasks.push(Task::Structure(
                        fields.iter().map(|(name, _)| name.as_str()).collect(),
                    ));
                    tasks.extend(
                        fields
                            .iter()
                            .rev()
                            .map(|(_, item)| Task::Visit(item, depth + 1)),
                    );
                }
                Task::Visit(value, _) => done.push(Self::scalar(value)),
                Task::Sequence(len) => {
                    let items = done.split_off(done.len().saturating_sub(len));
                    done.push(PropertyValue::Sequence(items));
                }
                Task::Structure(names) => {
                    let values = done.split_off(done.len().saturating_sub(names.len()));
                    done.push(PropertyValue::Structure(
                        names
                            .into_iter()
                            .zip(values)
                            .map(|(name, value)| LogProperty::new(name, value, ResolvingMode::Destructure))
                            .collect(),
                    ));
                }
            }
        }

        done.pop().unwrap_or(PropertyValue::Empty)
    }
}

impl Default for PropertyResolver {
    fn default() -> Self {
        Self::new()
    }
}
