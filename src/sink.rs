use crate::level::Level;
use std::error::Error;
use std::io::Write;
use std::sync::{Mutex, MutexGuard};

/// Destination for rendered log lines.
///
/// Transports call `write` synchronously on the logging thread, once per line
/// that passed the transport's threshold. Failures are reported by the
/// transport and never fail the log call.
pub trait LogSink: Send + Sync {
    /// Write a single rendered line.
    ///
    /// **Parameters**
    /// - `level`: severity of the record that produced the line.
    /// - `line`: final output of the formatter, without a trailing newline.
    fn write(&self, level: Level, line: &str) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Flush any buffered output. Default implementation is a no-op.
    fn flush(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stream {
    #[default]
    Stdout,
    Stderr,
}

/// Writes each line to stdout or stderr.
#[derive(Debug, Clone, Default)]
pub struct ConsoleSink {
    stream: Stream,
}

impl ConsoleSink {
    pub fn stdout() -> Self {
        Self { stream: Stream::Stdout }
    }

    pub fn stderr() -> Self {
        Self { stream: Stream::Stderr }
    }
}

impl LogSink for ConsoleSink {
    fn write(&self, _level: Level, line: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        match self.stream {
            Stream::Stdout => writeln!(std::io::stdout().lock(), "{line}")?,
            Stream::Stderr => writeln!(std::io::stderr().lock(), "{line}")?,
        }
        Ok(())
    }

    fn flush(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        match self.stream {
            Stream::Stdout => std::io::stdout().flush()?,
            Stream::Stderr => std::io::stderr().flush()?,
        }
        Ok(())
    }
}

/// Keeps every line in memory. Handy for tests and for embedding the logger
/// where output is collected rather than printed.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<(Level, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> MutexGuard<'_, Vec<(Level, String)>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn entries(&self) -> Vec<(Level, String)> {
        self.guard().clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.guard().iter().map(|(_, line)| line.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }

    pub fn clear(&self) {
        self.guard().clear();
    }
}

impl LogSink for MemorySink {
    fn write(&self, level: Level, line: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.guard().push((level, line.to_string()));
        Ok(())
    }
}
