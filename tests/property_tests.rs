//! Property-based tests for rust_template_logger using proptest

use proptest::prelude::*;
use rust_template_logger::prelude::*;
use rust_template_logger::template::tokenize;

fn event_level() -> impl Strategy<Value = LogLevel> {
    prop_oneof![
        Just(LogLevel::Trace),
        Just(LogLevel::Debug),
        Just(LogLevel::Info),
        Just(LogLevel::Warn),
        Just(LogLevel::Error),
        Just(LogLevel::Fatal),
    ]
}

fn any_level() -> impl Strategy<Value = LogLevel> {
    prop_oneof![event_level(), Just(LogLevel::Off)]
}

/// Templates built from text, slots, escapes and stray braces.
fn template() -> impl Strategy<Value = String> {
    let piece = prop_oneof![
        "[a-zA-Z0-9 .:,é-]{0,8}",
        "\\{[@$]?[A-Za-z_][A-Za-z0-9_]{0,6}\\}",
        "\\{[0-9]{1,2}(,-?[0-9]{1,2})?(:[0-9.xX]{1,3})?\\}",
        Just("{{".to_string()),
        Just("}}".to_string()),
        Just("{".to_string()),
        Just("}".to_string()),
    ];
    prop::collection::vec(piece, 0..8).prop_map(|pieces| pieces.concat())
}

fn gate() -> impl Strategy<Value = LevelGate> {
    (
        any_level(),
        prop::collection::vec(("[a-c]{1,3}", any_level()), 0..4),
        prop::collection::vec(("[a-c]{1,2}", any_level()), 0..4),
    )
        .prop_map(|(minimum, categories, namespaces)| {
            let mut gate = LevelGate::new(minimum);
            for (category, level) in categories {
                gate = gate.with_category(category, level);
            }
            for (prefix, level) in namespaces {
                gate = gate.with_namespace(prefix, level);
            }
            gate
        })
}

// ============================================================================
// Tokenizer
// ============================================================================

proptest! {
    /// Concatenating the raw text of every token reproduces the template
    #[test]
    fn test_tokenize_round_trip(template in template()) {
        let parsed = tokenize(&template);
        let rebuilt: String = parsed.tokens().iter().map(|t| t.to_raw_text()).collect();
        prop_assert_eq!(rebuilt, template);
    }

    /// Tokens are contiguous and numbered in source order
    #[test]
    fn test_tokens_are_contiguous(template in template()) {
        let parsed = tokenize(&template);
        let mut expected_start = 0;
        for (i, token) in parsed.tokens().iter().enumerate() {
            prop_assert_eq!(token.index(), i);
            prop_assert_eq!(token.start(), expected_start);
            expected_start += token.raw_len();
        }
        prop_assert_eq!(expected_start, template.len());
    }

    /// Arbitrary input never panics the tokenizer
    #[test]
    fn test_tokenize_arbitrary_strings(template in "\\PC{0,40}") {
        let parsed = tokenize(&template);
        let rebuilt: String = parsed.tokens().iter().map(|t| t.to_raw_text()).collect();
        prop_assert_eq!(rebuilt, template);
    }

    /// Rendering without arguments leaves every slot as written
    #[test]
    fn test_render_without_arguments_keeps_slots(name in "[A-Za-z][A-Za-z0-9]{0,6}") {
        let template = format!("before {{{}}} after", name);
        let processor = MessageProcessor::new();
        let message = processor.process(&template, vec![], &[]);
        prop_assert_eq!(message.render(), template);
    }
}

// ============================================================================
// Argument binding
// ============================================================================

proptest! {
    /// No argument is ever discarded
    #[test]
    fn test_every_argument_becomes_a_property(
        slots in 0usize..4,
        args in prop::collection::vec(any::<i64>(), 0..8),
    ) {
        let template: String = (0..slots).map(|i| format!("{{S{}}} ", i)).collect();
        let processor = MessageProcessor::new();
        let message = processor.process(
            &template,
            args.iter().copied().map(Value::from).collect(),
            &[],
        );
        prop_assert_eq!(message.properties.len(), args.len());
    }
}

// ============================================================================
// Level gate
// ============================================================================

proptest! {
    /// Enabling a level enables every more severe level
    #[test]
    fn test_gate_is_monotonic(gate in gate(), category in "[a-d]{0,4}") {
        let mut enabled = false;
        for level in LogLevel::EVENT_LEVELS {
            let now = gate.is_enabled(&category, level);
            prop_assert!(!enabled || now, "{:?} disabled after a less severe level was enabled", level);
            enabled = now;
        }
    }

    /// A global minimum of Off enables every pair, whatever the overrides say
    #[test]
    fn test_off_minimum_enables_all(
        overrides in prop::collection::vec(("[a-c]{1,3}", event_level()), 0..4),
        category in "[a-d]{0,4}",
        level in event_level(),
    ) {
        let mut gate = LevelGate::new(LogLevel::Off);
        for (prefix, threshold) in overrides {
            gate = gate.with_category(prefix.clone(), threshold).with_namespace(prefix, threshold);
        }
        prop_assert!(gate.is_enabled(&category, level));
    }

    /// Exact overrides beat any namespace prefix
    #[test]
    fn test_exact_override_wins(
        gate in gate(),
        category in "[a-c]{1,3}",
        level in any_level(),
    ) {
        let gate = gate.with_category(category.clone(), level);
        prop_assert_eq!(gate.threshold(&category), level);
    }
}

// ============================================================================
// LogLevel
// ============================================================================

proptest! {
    /// Level names round-trip through their string form
    #[test]
    fn test_log_level_str_roundtrip(level in any_level()) {
        let parsed: LogLevel = level.to_str().parse().unwrap();
        prop_assert_eq!(level, parsed);
    }

    /// Parsing ignores case
    #[test]
    fn test_log_level_parse_case_insensitive(level in event_level(), upper in any::<bool>()) {
        let name = if upper {
            level.to_str().to_uppercase()
        } else {
            level.to_str().to_lowercase()
        };
        prop_assert_eq!(name.parse::<LogLevel>().unwrap(), level);
    }
}
