//! Parsed message templates and rendering

use super::property::LogProperty;
use super::token::{MessageTemplateToken, PropertySlot, TokenKind};
use std::collections::HashMap;

/// A tokenized template with a lookup from binding key to its first token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTemplate {
    text: String,
    tokens: Vec<MessageTemplateToken>,
    /// Binding key -> index of the first property token using it
    bindings: HashMap<String, usize>,
    /// Distinct binding keys in encounter order
    binding_order: Vec<String>,
}

impl ParsedTemplate {
    pub(crate) fn new(text: String, tokens: Vec<MessageTemplateToken>) -> Self {
        let mut bindings = HashMap::new();
        let mut binding_order = Vec::new();
        for token in &tokens {
            if let TokenKind::Property(slot) = token.kind() {
                if !bindings.contains_key(&slot.name) {
                    bindings.insert(slot.name.clone(), token.index());
                    binding_order.push(slot.name.clone());
                }
            }
        }
        Self {
            text,
            tokens,
            bindings,
            binding_order,
        }
    }

    /// The original template string.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tokens(&self) -> &[MessageTemplateToken] {
        &self.tokens
    }

    pub fn property_slots(&self) -> impl Iterator<Item = &PropertySlot> {
        self.tokens.iter().filter_map(MessageTemplateToken::as_property)
    }

    /// Distinct property names in the order they first appear.
    pub fn property_names(&self) -> Vec<&str> {
        self.binding_order.iter().map(String::as_str).collect()
    }

    /// The first slot bound under `name`.
    pub fn slot(&self, name: &str) -> Option<&PropertySlot> {
        self.bindings
            .get(name)
            .and_then(|&i| self.tokens.get(i))
            .and_then(MessageTemplateToken::as_property)
    }

    /// Distinct slots in encounter order, one per binding key.
    pub(crate) fn binding_slots(&self) -> impl Iterator<Item = &PropertySlot> {
        self.binding_order.iter().filter_map(|name| self.slot(name))
    }

    /// True when the template has property slots and all of them are numeric (`{0}`).
    pub fn is_positional(&self) -> bool {
        !self.binding_order.is_empty() && self.property_slots().all(|s| s.position.is_some())
    }

    pub fn has_properties(&self) -> bool {
        !self.binding_order.is_empty()
    }

    /// Render the template, substituting bound properties.
    ///
    /// Slots with no bound property keep their raw text (`{Name}`).
    pub fn render(&self, properties: &[LogProperty]) -> String {
        let mut out = String::with_capacity(self.text.len());
        for token in &self.tokens {
            match token.kind() {
                TokenKind::Text(text) => out.push_str(text),
                TokenKind::Property(slot) => {
                    match properties.iter().find(|p| p.name == slot.name) {
                        Some(property) => out.push_str(&property.render(slot)),
                        None => out.push_str(token.to_raw_text()),
                    }
                }
            }
        }
        out
    }
}
