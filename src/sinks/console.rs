//! Console sink implementation

use crate::core::{LogBatch, LogEvent, LogLevel, Result, Sink};
use chrono::format::{Item, StrftimeItems};
use colored::Colorize;

const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Writes one line per event to stdout, or stderr for `Error` and `Fatal`
pub struct ConsoleSink {
    use_colors: bool,
    timestamp_format: String,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self {
            use_colors: true,
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
        }
    }

    pub fn with_colors(use_colors: bool) -> Self {
        Self {
            use_colors,
            ..Self::new()
        }
    }

    /// Set a strftime-compatible timestamp format
    ///
    /// An unparsable format is ignored and the default is kept.
    ///
    /// # Examples
    ///
    /// ```
    /// use rust_template_logger::sinks::ConsoleSink;
    ///
    /// let sink = ConsoleSink::new().with_timestamp_format("%d/%b/%Y:%H:%M:%S %z");
    /// ```
    #[must_use]
    pub fn with_timestamp_format(mut self, format: &str) -> Self {
        if !StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
            self.timestamp_format = format.to_string();
        }
        self
    }

    /// Render one event as a single line
    ///
    /// Newlines, carriage returns and tabs in the message and context are
    /// escaped so a logged value cannot forge additional lines.
    pub fn format_event(&self, event: &LogEvent) -> String {
        let level_str = if self.use_colors {
            format!("{:5}", event.level().to_str())
                .color(event.level().color_code())
                .to_string()
        } else {
            format!("{:5}", event.level().to_str())
        };

        let mut line = format!(
            "[{}] [{}] {} - {}",
            event.timestamp().format(&self.timestamp_format),
            level_str,
            event.category(),
            sanitize(&event.render_message())
        );

        let context = event.context();
        let fields = context
            .fields
            .iter()
            .chain(context.scopes.iter().flat_map(|frame| frame.properties.iter()))
            .map(|p| format!("{}={}", p.name, p.value))
            .collect::<Vec<_>>();
        if !fields.is_empty() {
            line.push(' ');
            line.push_str(&sanitize(&fields.join(" ")));
        }

        if let Some(exception) = event.exception() {
            line.push_str(" | ");
            line.push_str(&sanitize(&exception.to_string()));
        }

        line
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for ConsoleSink {
    fn write_batch(&mut self, batch: &LogBatch) -> Result<()> {
        for event in &batch.events {
            let output = self.format_event(event);

            // Route Error and Fatal levels to stderr, others to stdout
            match event.level() {
                LogLevel::Error | LogLevel::Fatal => eprintln!("{}", output),
                _ => println!("{}", output),
            }
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        use std::io::Write;
        // Flush both stdout and stderr since we write to both
        std::io::stdout().flush()?;
        std::io::stderr().flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}

fn sanitize(text: &str) -> String {
    text.replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ExceptionInfo, LogContext};
    use crate::template::{MessageProcessor, Value};

    #[test]
    fn test_format_escapes_injected_lines() {
        let processor = MessageProcessor::new();
        let event = LogEvent::new(
            LogLevel::Warn,
            "app::auth",
            processor.process("login {User}", vec![Value::from("eve\n[INFO] fake")], &[]),
        )
        .with_fields(&LogContext::new().with_field("ip", "10.0.0.1"));

        let line = ConsoleSink::with_colors(false).format_event(&event);
        assert!(line.contains("[WARN ] app::auth - login eve\\n[INFO] fake"));
        assert!(line.ends_with("ip=10.0.0.1"));
        assert!(!line.contains('\n'));
    }

    #[test]
    fn test_invalid_timestamp_format_is_ignored() {
        let sink = ConsoleSink::with_colors(false).with_timestamp_format("%Q%");
        assert_eq!(sink.timestamp_format, DEFAULT_TIMESTAMP_FORMAT);

        let sink = ConsoleSink::with_colors(false).with_timestamp_format("%H:%M");
        assert_eq!(sink.timestamp_format, "%H:%M");
    }

    #[test]
    fn test_format_includes_exception() {
        let processor = MessageProcessor::new();
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing file");
        let event = LogEvent::new(LogLevel::Error, "io", processor.process("read failed", vec![], &[]))
            .with_exception(ExceptionInfo::from_error(&err));

        let line = ConsoleSink::with_colors(false).format_event(&event);
        assert!(line.ends_with("read failed | missing file"));
    }
}
