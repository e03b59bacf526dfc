use crate::level::Level;
use crate::sink::LogSink;
use std::error::Error;

/// A sink that simply drops all lines.
///
/// Useful for measuring the cost of transforms and rendering without any
/// console I/O, and for tests that only care about side effects.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl LogSink for NoopSink {
    fn write(&self, _level: Level, _line: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}
