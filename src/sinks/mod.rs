//! Reference sink implementations

#[cfg(feature = "console")]
pub mod console;
pub mod memory;

#[cfg(feature = "console")]
pub use console::ConsoleSink;
pub use memory::MemorySink;

pub use crate::core::Sink;
