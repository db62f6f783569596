//! Message templates
//!
//! A message template is text with named or positional property slots:
//!
//! - `{Name}` formats the argument as a scalar, `{Name:.2}` with a format specifier
//! - `{@Name}` destructures sequences and structures into child properties
//! - `{$Name}` always uses the argument's text form
//! - `{Name,10}` / `{Name,-10}` pads the rendered value right/left aligned
//! - `{{` and `}}` are literal braces
//!
//! ```
//! use rust_template_logger::template::MessageProcessor;
//! use rust_template_logger::Value;
//!
//! let processor = MessageProcessor::new();
//! let message = processor.process("{0} plus {1}", vec![Value::from(vec![2, 3])], &[]);
//! assert_eq!(message.render(), "2 plus 3");
//! ```

mod format;
pub mod parsed;
pub mod processor;
pub mod property;
pub mod token;
pub mod tokenizer;
pub mod value;

pub use format::MAX_FORMAT_WIDTH;
pub use parsed::ParsedTemplate;
pub use processor::{MessageProcessor, ProcessedMessage, TemplateCache};
pub use property::{LogProperty, PropertyResolver, PropertyValue, ScalarValue};
pub use token::{Alignment, MessageTemplateToken, PropertySlot, RenderKind, ResolvingMode, TokenKind};
pub use tokenizer::tokenize;
pub use value::Value;
