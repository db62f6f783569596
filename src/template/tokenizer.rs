//! Message template tokenizer
//!
//! Splits a template into text and property tokens. Tokenizing never fails:
//! anything that does not parse as a property slot becomes literal text, so
//! concatenating every token's raw text always reproduces the input.

use super::parsed::ParsedTemplate;
use super::token::{Alignment, MessageTemplateToken, PropertySlot, ResolvingMode, TokenKind};

/// Accumulates a run of literal text, including brace escapes.
struct TextRun {
    start: usize,
    raw: String,
    text: String,
}

impl TextRun {
    fn new(start: usize) -> Self {
        Self {
            start,
            raw: String::new(),
            text: String::new(),
        }
    }

    fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

struct Builder {
    tokens: Vec<MessageTemplateToken>,
    run: TextRun,
}

impl Builder {
    fn push_text(&mut self, raw: &str, text: &str) {
        self.run.raw.push_str(raw);
        self.run.text.push_str(text);
    }

    fn flush_text(&mut self, next_start: usize) {
        if self.run.is_empty() {
            self.run.start = next_start;
            return;
        }
        let run = std::mem::replace(&mut self.run, TextRun::new(next_start));
        let index = self.tokens.len();
        self.tokens.push(MessageTemplateToken::new(
            run.raw,
            index,
            run.start,
            TokenKind::Text(run.text),
        ));
    }

    fn push_property(&mut self, raw: &str, start: usize, slot: PropertySlot) {
        self.flush_text(start);
        let index = self.tokens.len();
        self.tokens.push(MessageTemplateToken::new(
            raw.to_string(),
            index,
            start,
            TokenKind::Property(slot),
        ));
        self.run.start = start + raw.len();
    }
}

/// Tokenize a message template.
///
/// ```
/// use rust_template_logger::template::tokenize;
///
/// let parsed = tokenize("User {Name} logged in from {@Location}");
/// assert_eq!(parsed.tokens().len(), 4);
/// assert_eq!(parsed.property_names(), vec!["Name", "Location"]);
/// ```
pub fn tokenize(template: &str) -> ParsedTemplate {
    let mut builder = Builder {
        tokens: Vec::new(),
        run: TextRun::new(0),
    };
    let bytes = template.as_bytes();
    let mut pos = 0;

    while pos < template.len() {
        match bytes[pos] {
            b'{' if bytes.get(pos + 1) == Some(&b'{') => {
                builder.push_text("{{", "{");
                pos += 2;
            }
            b'}' if bytes.get(pos + 1) == Some(&b'}') => {
                builder.push_text("}}", "}");
                pos += 2;
            }
            b'{' => {
                pos = scan_slot(template, pos, &mut builder);
            }
            b'}' => {
                builder.push_text("}", "}");
                pos += 1;
            }
            _ => {
                // Copy up to the next brace in one go; braces are ASCII so the
                // cut is always on a char boundary.
                let next = template[pos..]
                    .find(is_brace)
                    .map_or(template.len(), |i| pos + i);
                let chunk = &template[pos..next];
                builder.push_text(chunk, chunk);
                pos = next;
            }
        }
    }

    builder.flush_text(template.len());
    ParsedTemplate::new(template.to_string(), builder.tokens)
}

/// Scan a slot opening at `open`; returns the position to resume from.
fn scan_slot(template: &str, open: usize, builder: &mut Builder) -> usize {
    let rest = &template[open + 1..];
    match rest.find(is_brace) {
        Some(i) if rest.as_bytes()[i] == b'}' => {
            let close = open + 1 + i;
            let raw = &template[open..=close];
            match parse_slot(&template[open + 1..close]) {
                Some(slot) => builder.push_property(raw, open, slot),
                None => builder.push_text(raw, raw),
            }
            close + 1
        }
        // Another `{` before any `}`: this brace is literal, resume at the next one.
        Some(i) => {
            let next = open + 1 + i;
            let raw = &template[open..next];
            builder.push_text(raw, raw);
            next
        }
        // Unterminated slot runs to the end as literal text.
        None => {
            let raw = &template[open..];
            builder.push_text(raw, raw);
            template.len()
        }
    }
}

/// Parse `[@|$]name[,alignment][:format]`.
fn parse_slot(content: &str) -> Option<PropertySlot> {
    let (mode, body) = match content.as_bytes().first() {
        Some(b'@') => (ResolvingMode::Destructure, &content[1..]),
        Some(b'$') => (ResolvingMode::Stringify, &content[1..]),
        _ => (ResolvingMode::Default, content),
    };

    let (head, format) = match body.split_once(':') {
        Some((head, format)) if !format.is_empty() => (head, Some(format.to_string())),
        Some(_) => return None,
        None => (body, None),
    };

    let (name, alignment) = match head.split_once(',') {
        Some((name, align)) => (name, Some(Alignment::parse(align)?)),
        None => (head, None),
    };

    if !is_valid_name(name) {
        return None;
    }

    let position = if name.bytes().all(|b| b.is_ascii_digit()) {
        name.parse().ok()
    } else {
        None
    };

    Some(PropertySlot {
        name: name.to_string(),
        position,
        format,
        alignment,
        mode,
    })
}

fn is_brace(c: char) -> bool {
    c == '{' || c == '}'
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::format::MAX_FORMAT_WIDTH;
    use crate::template::token::RenderKind;

    fn raw_concat(parsed: &ParsedTemplate) -> String {
        parsed.tokens().iter().map(|t| t.to_raw_text()).collect()
    }

    #[test]
    fn test_text_only() {
        let parsed = tokenize("Hello world");
        assert_eq!(parsed.tokens().len(), 1);
        assert_eq!(parsed.tokens()[0].render_kind(), RenderKind::Text);
        assert_eq!(parsed.tokens()[0].to_text(), "Hello world");
    }

    #[test]
    fn test_property_modes() {
        let parsed = tokenize("{Name} {@Location} {$Id}");
        let modes: Vec<_> = parsed
            .property_slots()
            .map(|slot| slot.mode)
            .collect();
        assert_eq!(
            modes,
            vec![
                ResolvingMode::Default,
                ResolvingMode::Destructure,
                ResolvingMode::Stringify
            ]
        );
    }

    #[test]
    fn test_alignment_and_format() {
        let parsed = tokenize("Took {Elapsed,8:.2} ms");
        let slot = parsed.property_slots().next().expect("slot");
        assert_eq!(slot.name, "Elapsed");
        assert_eq!(slot.format.as_deref(), Some(".2"));
        assert_eq!(
            slot.alignment,
            Some(Alignment {
                width: 8,
                left: false
            })
        );
    }

    #[test]
    fn test_format_may_contain_colons() {
        let parsed = tokenize("At {When:%H:%M:%S}");
        let slot = parsed.property_slots().next().expect("slot");
        assert_eq!(slot.format.as_deref(), Some("%H:%M:%S"));
    }

    #[test]
    fn test_escaped_braces() {
        let parsed = tokenize("{{literal}} and {Value}");
        assert_eq!(parsed.tokens().len(), 2);
        assert_eq!(parsed.tokens()[0].to_text(), "{literal} and ");
        assert_eq!(parsed.tokens()[0].to_raw_text(), "{{literal}} and ");
        assert_eq!(raw_concat(&parsed), "{{literal}} and {Value}");
    }

    #[test]
    fn test_unterminated_slot_is_text() {
        let parsed = tokenize("Value: {Incomplete");
        assert_eq!(parsed.tokens().len(), 1);
        assert_eq!(parsed.tokens()[0].render_kind(), RenderKind::Text);
        assert_eq!(parsed.tokens()[0].to_raw_text(), "Value: {Incomplete");
        assert_eq!(parsed.property_slots().count(), 0);
    }

    #[test]
    fn test_empty_and_invalid_names_are_text() {
        for template in ["{}", "{@}", "{a b}", "{Name:}", "{Name,x}", "{Name,0}"] {
            let parsed = tokenize(template);
            assert_eq!(parsed.property_slots().count(), 0, "template {:?}", template);
            assert_eq!(raw_concat(&parsed), template);
        }
    }

    #[test]
    fn test_oversized_alignment_is_text() {
        let parsed = tokenize("{Name,2000000000} {Other,-65536}");
        assert_eq!(parsed.property_slots().count(), 0);
        assert_eq!(raw_concat(&parsed), "{Name,2000000000} {Other,-65536}");

        let parsed = tokenize("{Name,-65535}");
        let slot = parsed.property_slots().next().expect("slot");
        assert_eq!(slot.alignment.map(|a| a.width), Some(MAX_FORMAT_WIDTH));
    }

    #[test]
    fn test_nested_open_brace() {
        let parsed = tokenize("{a{B}");
        assert_eq!(parsed.property_names(), vec!["B"]);
        assert_eq!(parsed.tokens()[0].to_raw_text(), "{a");
        assert_eq!(raw_concat(&parsed), "{a{B}");
    }

    #[test]
    fn test_stray_close_brace() {
        let parsed = tokenize("a } b {X}");
        assert_eq!(parsed.property_names(), vec!["X"]);
        assert_eq!(raw_concat(&parsed), "a } b {X}");
    }

    #[test]
    fn test_positional_slots() {
        let parsed = tokenize("{0} plus {1}");
        assert!(parsed.is_positional());
        let positions: Vec<_> = parsed.property_slots().map(|s| s.position).collect();
        assert_eq!(positions, vec![Some(0), Some(1)]);
    }

    #[test]
    fn test_token_positions_are_contiguous() {
        let template = "ab {X} cd {{ {@Y,-3} é {Z:x}";
        let parsed = tokenize(template);
        let mut expected_start = 0;
        for (i, token) in parsed.tokens().iter().enumerate() {
            assert_eq!(token.index(), i);
            assert_eq!(token.start(), expected_start);
            expected_start += token.raw_len();
        }
        assert_eq!(expected_start, template.len());
    }

    #[test]
    fn test_unicode_text() {
        let template = "héllo {Wörld} ✓";
        let parsed = tokenize(template);
        assert_eq!(parsed.property_names(), vec!["Wörld"]);
        assert_eq!(raw_concat(&parsed), template);
    }
}
