//! Message parameter processing: template cache plus argument binding

use super::parsed::ParsedTemplate;
use super::property::{LogProperty, PropertyResolver};
use super::token::ResolvingMode;
use super::tokenizer::tokenize;
use super::value::Value;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Default number of distinct templates kept by a [`TemplateCache`].
pub const DEFAULT_TEMPLATE_CACHE_CAPACITY: usize = 1000;

/// Prefix of the property names given to arguments no slot consumed.
pub const EXTRA_ARGUMENT_PREFIX: &str = "__";

/// Read-mostly cache of tokenized templates keyed by the template string.
///
/// Concurrent first use of a template may tokenize it more than once, but
/// only the first insertion is kept and every caller gets that instance.
/// Once `capacity` templates are cached, new ones are tokenized per call
/// and not retained.
#[derive(Debug)]
pub struct TemplateCache {
    entries: RwLock<HashMap<String, Arc<ParsedTemplate>>>,
    capacity: usize,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_TEMPLATE_CACHE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            capacity,
        }
    }

    pub fn get_or_parse(&self, template: &str) -> Arc<ParsedTemplate> {
        if let Some(parsed) = self.entries.read().get(template) {
            return Arc::clone(parsed);
        }

        let parsed = Arc::new(tokenize(template));

        let mut entries = self.entries.write();
        if let Some(existing) = entries.get(template) {
            return Arc::clone(existing);
        }
        if entries.len() < self.capacity {
            entries.insert(template.to_string(), Arc::clone(&parsed));
        }
        parsed
    }

    pub fn contains(&self, template: &str) -> bool {
        self.entries.read().contains_key(template)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl Default for TemplateCache {
    fn default() -> Self {
        Self::new()
    }
}

/// A template bound to its arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedMessage {
    pub template: Arc<ParsedTemplate>,
    pub properties: Vec<LogProperty>,
}

impl ProcessedMessage {
    pub fn render(&self) -> String {
        self.template.render(&self.properties)
    }
}

/// Binds arguments to template slots.
///
/// Binding rules:
/// - a slot whose name is supplied as a named argument binds to it;
/// - if every slot is numeric (`{0}`), slots bind to the argument at that index,
///   and a single sequence argument is spread over the slots;
/// - otherwise distinct slot names take the remaining arguments in order;
/// - unconsumed arguments become properties named `__<index>`;
/// - slots left unbound render as their raw text.
#[derive(Debug)]
pub struct MessageProcessor {
    cache: Arc<TemplateCache>,
    resolver: PropertyResolver,
}

impl MessageProcessor {
    pub fn new() -> Self {
        Self::with_cache(Arc::new(TemplateCache::new()))
    }

    /// Share a template cache between processors.
    pub fn with_cache(cache: Arc<TemplateCache>) -> Self {
        Self {
            cache,
            resolver: PropertyResolver::new(),
        }
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: PropertyResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn cache(&self) -> &Arc<TemplateCache> {
        &self.cache
    }

    pub fn parse(&self, template: &str) -> Arc<ParsedTemplate> {
        self.cache.get_or_parse(template)
    }

    pub fn process(&self, template: &str, args: Vec<Value>, named: &[(String, Value)]) -> ProcessedMessage {
        let parsed = self.parse(template);
        let properties = self.bind(&parsed, args, named);
        ProcessedMessage {
            template: parsed,
            properties,
        }
    }

    fn bind(&self, parsed: &ParsedTemplate, args: Vec<Value>, named: &[(String, Value)]) -> Vec<LogProperty> {
        let positional = parsed.is_positional();
        let mut args = spread_single_sequence(parsed, positional, args);
        let mut properties = Vec::with_capacity(args.len().max(parsed.property_names().len()));
        let mut taken = vec![false; args.len()];
        let mut cursor = 0;

        for slot in parsed.binding_slots() {
            if let Some((_, value)) = named.iter().find(|(name, _)| *name == slot.name) {
                properties.push(self.resolver.resolve(slot.name.as_str(), value, slot.mode));
                continue;
            }

            let index = if positional {
                slot.position.filter(|&i| i < args.len() && !taken[i])
            } else {
                while cursor < args.len() && taken[cursor] {
                    cursor += 1;
                }
                (cursor < args.len()).then_some(cursor)
            };

            if let Some(i) = index {
                taken[i] = true;
                let value = std::mem::take(&mut args[i]);
                properties.push(self.resolver.resolve(slot.name.as_str(), &value, slot.mode));
            }
        }

        for (i, value) in args.into_iter().enumerate() {
            if !taken[i] {
                let name = extra_argument_name(parsed, &properties, i);
                properties.push(self.resolver.resolve(name, &value, ResolvingMode::Default));
            }
        }

        properties
    }
}

impl Default for MessageProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// `__<index>`, suffixed until it clashes with neither a slot nor a bound property.
fn extra_argument_name(parsed: &ParsedTemplate, bound: &[LogProperty], index: usize) -> String {
    let in_use = |name: &str| {
        parsed.slot(name).is_some() || bound.iter().any(|p| p.name == name)
    };
    let base = format!("{}{}", EXTRA_ARGUMENT_PREFIX, index);
    let mut name = base.clone();
    let mut suffix = 1;
    while in_use(&name) {
        name = format!("{}_{}", base, suffix);
        suffix += 1;
    }
    name
}

/// `"{0} plus {1}"` called with one sequence binds its elements to the slots.
fn spread_single_sequence(parsed: &ParsedTemplate, positional: bool, mut args: Vec<Value>) -> Vec<Value> {
    if positional && args.len() == 1 && parsed.property_names().len() > 1 {
        if let Some(Value::Seq(_)) = args.first() {
            if let Some(Value::Seq(items)) = args.pop() {
                return items;
            }
        }
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::property::{PropertyValue, ScalarValue};

    fn find<'a>(message: &'a ProcessedMessage, name: &str) -> &'a LogProperty {
        message
            .properties
            .iter()
            .find(|p| p.name == name)
            .unwrap_or_else(|| panic!("property {} not bound", name))
    }

    #[test]
    fn test_named_slots_bind_in_order() {
        let processor = MessageProcessor::new();
        let location = Value::structure([("city", "NYC"), ("zip", "10001")]);
        let message = processor.process(
            "User {Name} logged in from {@Location}",
            vec![Value::from("alice"), location],
            &[],
        );

        assert_eq!(
            message.render(),
            r#"User alice logged in from {"city": "NYC", "zip": "10001"}"#
        );
        match &find(&message, "Location").value {
            PropertyValue::Structure(fields) => assert_eq!(fields.len(), 2),
            other => panic!("expected structure, got {:?}", other),
        }
    }

    #[test]
    fn test_single_sequence_spreads_over_positional_slots() {
        let processor = MessageProcessor::new();
        let message = processor.process("{0} plus {1}", vec![Value::from(vec![2, 3])], &[]);

        assert_eq!(message.properties.len(), 2);
        assert_eq!(find(&message, "0").value, PropertyValue::Scalar(ScalarValue::Int(2)));
        assert_eq!(find(&message, "1").value, PropertyValue::Scalar(ScalarValue::Int(3)));
        assert_eq!(message.render(), "2 plus 3");
    }

    #[test]
    fn test_positional_slots_bind_by_index() {
        let processor = MessageProcessor::new();
        let message = processor.process("{1} before {0}", vec![Value::from("a"), Value::from("b")], &[]);
        assert_eq!(message.render(), "b before a");
    }

    #[test]
    fn test_excess_arguments_are_kept() {
        let processor = MessageProcessor::new();
        let message = processor.process(
            "Only {One}",
            vec![Value::from(1), Value::from(2), Value::from(3)],
            &[],
        );

        assert_eq!(message.properties.len(), 3);
        assert_eq!(find(&message, "__1").value, PropertyValue::Scalar(ScalarValue::Int(2)));
        assert_eq!(find(&message, "__2").value, PropertyValue::Scalar(ScalarValue::Int(3)));
        assert_eq!(message.render(), "Only 1");
    }

    #[test]
    fn test_extra_argument_names_avoid_slot_names() {
        let processor = MessageProcessor::new();
        let message = processor.process(
            "{__2} {__2_1}",
            vec![Value::from("a"), Value::from("b"), Value::from("c")],
            &[],
        );
        let names: Vec<_> = message.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["__2", "__2_1", "__2_2"]);

        let message = processor.process("{__1}", vec![Value::from("a"), Value::from("b")], &[]);
        assert_eq!(message.render(), "a");
        assert_eq!(find(&message, "__1").value, PropertyValue::Scalar(ScalarValue::Str("a".into())));
        assert_eq!(find(&message, "__1_1").value, PropertyValue::Scalar(ScalarValue::Str("b".into())));
    }

    #[test]
    fn test_oversized_specifiers_render_without_panicking() {
        let processor = MessageProcessor::new();
        let message = processor.process("{N:.100000}", vec![Value::from(1.5)], &[]);
        assert_eq!(message.render(), "1.5");

        let message = processor.process("{N:10000000000000000000}", vec![Value::from(1)], &[]);
        assert_eq!(message.render(), "1");

        let message = processor.process("{N,2000000000}", vec![Value::from(1)], &[]);
        assert_eq!(message.render(), "{N,2000000000}");
        assert_eq!(message.properties.len(), 1);
    }

    #[test]
    fn test_missing_arguments_render_raw_slot() {
        let processor = MessageProcessor::new();
        let message = processor.process("{A} and {B}", vec![Value::from("x")], &[]);
        assert_eq!(message.render(), "x and {B}");
    }

    #[test]
    fn test_named_arguments_take_precedence() {
        let processor = MessageProcessor::new();
        let named = vec![("User".to_string(), Value::from("bob"))];
        let message = processor.process("{User} did {Action}", vec![Value::from("login")], &named);
        assert_eq!(message.render(), "bob did login");
        assert_eq!(message.properties.len(), 2);
    }

    #[test]
    fn test_repeated_slot_binds_once() {
        let processor = MessageProcessor::new();
        let message = processor.process("{A}-{A}-{B}", vec![Value::from(1), Value::from(2)], &[]);
        assert_eq!(message.render(), "1-1-2");
        assert_eq!(message.properties.len(), 2);
    }

    #[test]
    fn test_format_and_alignment_in_render() {
        let processor = MessageProcessor::new();
        let message = processor.process(
            "[{Code,6:x}] [{Name,-5}] {Ratio:.1}",
            vec![Value::from(255), Value::from("ab"), Value::from(0.26)],
            &[],
        );
        assert_eq!(message.render(), "[    ff] [ab   ] 0.3");
    }

    #[test]
    fn test_cache_reuses_parsed_template() {
        let processor = MessageProcessor::new();
        let first = processor.parse("Hello {Name}");
        let second = processor.parse("Hello {Name}");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(processor.cache().len(), 1);
    }

    #[test]
    fn test_cache_capacity_limit() {
        let cache = TemplateCache::with_capacity(1);
        cache.get_or_parse("one {A}");
        cache.get_or_parse("two {B}");
        assert_eq!(cache.len(), 1);
        assert!(cache.contains("one {A}"));
        assert!(!cache.contains("two {B}"));
    }

    #[test]
    fn test_concurrent_first_use_keeps_one_entry() {
        let cache = Arc::new(TemplateCache::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.get_or_parse("Shared {Template}"))
            })
            .collect();

        let parsed: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().expect("thread panicked"))
            .collect();

        assert_eq!(cache.len(), 1);
        let cached = cache.get_or_parse("Shared {Template}");
        assert!(parsed.iter().all(|p| **p == *cached));
    }
}
