//! Sink trait for batch output destinations

use super::{error::Result, payload::LogBatch};

pub trait Sink: Send + Sync {
    fn write_batch(&mut self, batch: &LogBatch) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
    fn name(&self) -> &str;
}
