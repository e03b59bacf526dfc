use crate::env::EnvSignals;
use crate::error::LogError;
use crate::format::Formatter;
use crate::level::Level;
use crate::record::LogRecord;
use crate::sink::LogSink;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

/// Minimal output for production: errors, warnings, info and success.
pub const PRODUCTION: &str = "production";
/// Noisy output for deployed non-production stages.
pub const DEVELOPMENT: &str = "development";
/// Everything goes, rendered for a terminal.
pub const LOCAL: &str = "local";

const NO_LEVEL: u8 = u8::MAX;

/// Named transports created once per logger.
pub type TransportRecord = BTreeMap<String, Arc<Transport>>;

/// Names of the transports to activate for the given environment.
///
/// | environment             | result          |
/// |-------------------------|-----------------|
/// | cloud, production stage | `[production]`  |
/// | cloud, any other stage  | `[development]` |
/// | not cloud               | `[local]`       |
pub fn select_transport_names(env: &EnvSignals) -> Vec<&'static str> {
    if env.is_cloud() {
        if env.is_production() {
            vec![PRODUCTION]
        } else {
            vec![DEVELOPMENT]
        }
    } else {
        vec![LOCAL]
    }
}

/// A formatter bound to a sink, with its own runtime-adjustable threshold and
/// mute flag.
pub struct Transport {
    name: String,
    level: AtomicU8,
    silent: AtomicBool,
    formatter: Formatter,
    sink: Arc<dyn LogSink>,
}

impl Transport {
    pub fn new(
        name: impl Into<String>,
        level: Option<Level>,
        formatter: Formatter,
        sink: Arc<dyn LogSink>,
    ) -> Self {
        Self {
            name: name.into(),
            level: AtomicU8::new(encode(level)),
            silent: AtomicBool::new(false),
            formatter,
            sink,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Own threshold; `None` defers to the logger's.
    pub fn level(&self) -> Option<Level> {
        Level::from_priority(self.level.load(Ordering::Relaxed))
    }

    pub fn set_level(&self, level: Option<Level>) {
        self.level.store(encode(level), Ordering::Relaxed);
    }

    pub fn is_silent(&self) -> bool {
        self.silent.load(Ordering::Relaxed)
    }

    pub fn set_silent(&self, silent: bool) {
        self.silent.store(silent, Ordering::Relaxed);
    }

    pub fn formatter(&self) -> &Formatter {
        &self.formatter
    }

    /// Whether a record at `level` would be written, given the logger's threshold.
    pub fn accepts(&self, level: Level, logger_level: Level) -> bool {
        !self.is_silent() && level.passes(self.level().unwrap_or(logger_level))
    }

    /// Format and write one record.
    ///
    /// Formatting errors (including transform failures) are returned; sink
    /// failures are reported and swallowed.
    pub fn log(&self, record: LogRecord) -> Result<(), LogError> {
        let level = record.level;
        let line = self.formatter.format(record)?;
        if let Err(err) = self.sink.write(level, &line) {
            tracing::warn!(transport = %self.name, error = %err, "log sink write failed");
        }
        Ok(())
    }

    pub fn flush(&self) {
        if let Err(err) = self.sink.flush() {
            tracing::warn!(transport = %self.name, error = %err, "log sink flush failed");
        }
    }
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport")
            .field("name", &self.name)
            .field("level", &self.level())
            .field("silent", &self.is_silent())
            .field("audience", &self.formatter.renderer().audience())
            .finish()
    }
}

fn encode(level: Option<Level>) -> u8 {
    level.map(|level| level.priority()).unwrap_or(NO_LEVEL)
}
