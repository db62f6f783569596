//! Message template tokens

use super::format::MAX_FORMAT_WIDTH;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a property slot turns its argument into a property value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvingMode {
    /// `{$Name}`: always the argument's text form
    Stringify,
    /// `{@Name}`: sequences and structures are decomposed into children
    Destructure,
    /// `{Name}`: scalar, honoring the slot's format specifier
    #[default]
    Default,
}

impl ResolvingMode {
    fn prefix(&self) -> &'static str {
        match self {
            ResolvingMode::Stringify => "$",
            ResolvingMode::Destructure => "@",
            ResolvingMode::Default => "",
        }
    }
}

impl fmt::Display for ResolvingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvingMode::Stringify => write!(f, "Stringify"),
            ResolvingMode::Destructure => write!(f, "Destructure"),
            ResolvingMode::Default => write!(f, "Default"),
        }
    }
}

/// Render kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderKind {
    Text,
    Property,
}

/// Padding applied to a rendered property (`{Name,10}` or `{Name,-10}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alignment {
    pub width: usize,
    pub left: bool,
}

impl Alignment {
    /// Parse a `,N` alignment; positive pads on the left, negative on the right.
    ///
    /// Zero and widths above [`MAX_FORMAT_WIDTH`] are rejected.
    pub fn parse(s: &str) -> Option<Self> {
        let n: i32 = s.trim().parse().ok()?;
        if n == 0 || n.unsigned_abs() as usize > MAX_FORMAT_WIDTH {
            return None;
        }
        Some(Self {
            width: n.unsigned_abs() as usize,
            left: n < 0,
        })
    }

    pub fn apply(&self, text: String) -> String {
        let len = text.chars().count();
        if len >= self.width {
            return text;
        }
        let pad = " ".repeat(self.width - len);
        if self.left {
            text + &pad
        } else {
            pad + &text
        }
    }
}

/// A `{...}` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySlot {
    pub name: String,
    /// Set when the name is a plain non-negative integer (`{0}`)
    pub position: Option<usize>,
    pub format: Option<String>,
    pub alignment: Option<Alignment>,
    pub mode: ResolvingMode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Literal text with brace escapes already collapsed
    Text(String),
    Property(PropertySlot),
}

/// One contiguous slice of a message template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplateToken {
    raw: String,
    index: usize,
    start: usize,
    kind: TokenKind,
}

impl MessageTemplateToken {
    pub(crate) fn new(raw: String, index: usize, start: usize, kind: TokenKind) -> Self {
        Self {
            raw,
            index,
            start,
            kind,
        }
    }

    /// Sequential token number within the template.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Byte offset of the token in the template.
    pub fn start(&self) -> usize {
        self.start
    }

    pub fn raw_len(&self) -> usize {
        self.raw.len()
    }

    /// Length of the token's own text: the unescaped text, or the property name.
    pub fn token_len(&self) -> usize {
        match &self.kind {
            TokenKind::Text(text) => text.len(),
            TokenKind::Property(slot) => slot.name.len(),
        }
    }

    pub fn kind(&self) -> &TokenKind {
        &self.kind
    }

    pub fn render_kind(&self) -> RenderKind {
        match self.kind {
            TokenKind::Text(_) => RenderKind::Text,
            TokenKind::Property(_) => RenderKind::Property,
        }
    }

    pub fn resolving_mode(&self) -> ResolvingMode {
        match &self.kind {
            TokenKind::Text(_) => ResolvingMode::Default,
            TokenKind::Property(slot) => slot.mode,
        }
    }

    pub fn as_property(&self) -> Option<&PropertySlot> {
        match &self.kind {
            TokenKind::Property(slot) => Some(slot),
            TokenKind::Text(_) => None,
        }
    }

    /// The exact source slice this token was parsed from.
    pub fn to_raw_text(&self) -> &str {
        &self.raw
    }

    /// The token's text: literal text for text tokens, `Name` for properties.
    pub fn to_text(&self) -> String {
        match &self.kind {
            TokenKind::Text(text) => text.clone(),
            TokenKind::Property(slot) => format!("{}{}", slot.mode.prefix(), slot.name),
        }
    }
}
