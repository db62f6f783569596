//! Runtime format specifiers for `{Name:spec}` slots
//!
//! Numbers and strings accept the std formatting grammar
//! `[0][width][.precision][type]` with `type` one of `x X o b e E`.
//! Timestamps hand the specifier verbatim to chrono's strftime formatter.
//! A specifier that does not apply to the value yields `None` and the caller
//! falls back to the value's default text, as does a width or precision
//! above [`MAX_FORMAT_WIDTH`].

use super::property::ScalarValue;
use chrono::format::{Item, StrftimeItems};
use std::fmt::Write;

/// Largest width, precision or alignment a slot may request.
pub const MAX_FORMAT_WIDTH: usize = u16::MAX as usize;

fn parse_bounded(digits: &str) -> Option<usize> {
    digits.parse().ok().filter(|n| *n <= MAX_FORMAT_WIDTH)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Radix {
    LowerHex,
    UpperHex,
    Octal,
    Binary,
    LowerExp,
    UpperExp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct FormatSpec {
    zero_pad: bool,
    width: Option<usize>,
    precision: Option<usize>,
    radix: Option<Radix>,
}

impl FormatSpec {
    pub(crate) fn parse(spec: &str) -> Option<Self> {
        let mut rest = spec;
        let mut parsed = FormatSpec::default();

        if let Some(stripped) = rest.strip_prefix('0') {
            parsed.zero_pad = true;
            rest = stripped;
        }

        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits > 0 {
            parsed.width = Some(parse_bounded(&rest[..digits])?);
            rest = &rest[digits..];
        }

        if let Some(stripped) = rest.strip_prefix('.') {
            let digits = stripped.bytes().take_while(u8::is_ascii_digit).count();
            if digits == 0 {
                return None;
            }
            parsed.precision = Some(parse_bounded(&stripped[..digits])?);
            rest = &stripped[digits..];
        }

        parsed.radix = match rest {
            "" => None,
            "x" => Some(Radix::LowerHex),
            "X" => Some(Radix::UpperHex),
            "o" => Some(Radix::Octal),
            "b" => Some(Radix::Binary),
            "e" => Some(Radix::LowerExp),
            "E" => Some(Radix::UpperExp),
            _ => return None,
        };

        Some(parsed)
    }

    fn pad_number(&self, body: String, negative: bool) -> String {
        let sign = if negative { "-" } else { "" };
        let len = sign.len() + body.chars().count();
        match self.width {
            Some(width) if width > len && self.zero_pad => {
                format!("{}{}{}", sign, "0".repeat(width - len), body)
            }
            Some(width) if width > len => format!("{}{}{}", " ".repeat(width - len), sign, body),
            _ => format!("{}{}", sign, body),
        }
    }

    fn format_unsigned(&self, value: u64, negative: bool) -> String {
        let body = match self.radix {
            None => value.to_string(),
            Some(Radix::LowerHex) => format!("{:x}", value),
            Some(Radix::UpperHex) => format!("{:X}", value),
            Some(Radix::Octal) => format!("{:o}", value),
            Some(Radix::Binary) => format!("{:b}", value),
            Some(Radix::LowerExp) => match self.precision {
                Some(p) => format!("{:.*e}", p, value),
                None => format!("{:e}", value),
            },
            Some(Radix::UpperExp) => match self.precision {
                Some(p) => format!("{:.*E}", p, value),
                None => format!("{:E}", value),
            },
        };
        self.pad_number(body, negative)
    }

    fn format_float(&self, value: f64) -> Option<String> {
        let negative = value.is_sign_negative() && value != 0.0;
        let magnitude = value.abs();
        let body = match (self.radix, self.precision) {
            (None, Some(p)) => format!("{:.*}", p, magnitude),
            (None, None) => magnitude.to_string(),
            (Some(Radix::LowerExp), Some(p)) => format!("{:.*e}", p, magnitude),
            (Some(Radix::LowerExp), None) => format!("{:e}", magnitude),
            (Some(Radix::UpperExp), Some(p)) => format!("{:.*E}", p, magnitude),
            (Some(Radix::UpperExp), None) => format!("{:E}", magnitude),
            _ => return None,
        };
        Some(self.pad_number(body, negative))
    }

    fn format_text(&self, value: &str) -> Option<String> {
        if self.radix.is_some() || self.zero_pad {
            return None;
        }
        let mut text: String = match self.precision {
            Some(p) => value.chars().take(p).collect(),
            None => value.to_string(),
        };
        if let Some(width) = self.width {
            let len = text.chars().count();
            if width > len {
                text.push_str(&" ".repeat(width - len));
            }
        }
        Some(text)
    }

    /// Format a scalar, or `None` when the specifier does not apply to it.
    pub(crate) fn apply(&self, value: &ScalarValue) -> Option<String> {
        match value {
            ScalarValue::Int(i) if self.radix.is_none() && self.precision.is_none() => {
                Some(self.pad_number(i.unsigned_abs().to_string(), *i < 0))
            }
            ScalarValue::Int(i) if *i >= 0 => Some(self.format_unsigned(i.unsigned_abs(), false)),
            ScalarValue::Int(i) if matches!(self.radix, Some(Radix::LowerExp | Radix::UpperExp)) => {
                Some(self.format_unsigned(i.unsigned_abs(), true))
            }
            ScalarValue::Int(_) => None,
            ScalarValue::UInt(u) => Some(self.format_unsigned(*u, false)),
            ScalarValue::Float(f) => self.format_float(*f),
            ScalarValue::Str(s) => self.format_text(s),
            ScalarValue::Bool(b) => self.format_text(if *b { "true" } else { "false" }),
            ScalarValue::Timestamp(_) => None,
        }
    }
}

/// Format a scalar with a slot's specifier, falling back to its default text.
pub(crate) fn format_scalar(value: &ScalarValue, spec: Option<&str>) -> String {
    let Some(spec) = spec else {
        return value.to_string();
    };

    if let ScalarValue::Timestamp(ts) = value {
        let items: Vec<Item<'_>> = StrftimeItems::new(spec).collect();
        if items.iter().any(|item| matches!(item, Item::Error)) {
            return value.to_string();
        }
        let mut out = String::new();
        return match write!(out, "{}", ts.format_with_items(items.into_iter())) {
            Ok(()) => out,
            Err(_) => value.to_string(),
        };
    }

    FormatSpec::parse(spec)
        .and_then(|parsed| parsed.apply(value))
        .unwrap_or_else(|| value.to_string())
}
