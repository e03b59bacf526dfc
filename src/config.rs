use crate::env::EnvSignals;
use crate::hooks::{HookOverrides, Hooks, HooksProvider};
use crate::level::Level;
use crate::record::Metadata;
use crate::sink::{ConsoleSink, LogSink};
use crate::transform::Transform;
use std::fmt;
use std::sync::Arc;

/// Configuration of a logger container.
///
/// **Fields**
/// - `name`: label printed with every line and used as the JSON `service`.
/// - `delimiter`: separator between the message and metadata in terminal output.
/// - `test_level`: logger threshold when `APP_ENV=test`.
/// - `default_meta`: metadata attached to every record.
/// - `transforms`: user transforms, run in order before rendering.
/// - `transform_opts`: static values readable by every transform.
/// - `hooks`: overrides for the base [`Hooks`]. Advanced use only.
/// - `sink`: where the built-in transports write.
/// - `colorize`: whether terminal output carries ANSI colors.
/// - `handle_panics`: route panics to the logger at `error`. Installs a
///   process-wide panic hook that chains to the previous one.
/// - `env`: explicit environment signals; `None` reads the process environment.
#[derive(Clone)]
pub struct LoggerOptions {
    pub name: String,
    pub delimiter: String,
    pub test_level: Level,
    pub default_meta: Metadata,
    pub transforms: Vec<Arc<dyn Transform>>,
    pub transform_opts: Metadata,
    pub hooks: Option<HooksProvider>,
    pub sink: Arc<dyn LogSink>,
    pub colorize: bool,
    pub handle_panics: bool,
    pub env: Option<EnvSignals>,
}

impl Default for LoggerOptions {
    fn default() -> Self {
        Self {
            name: String::new(),
            delimiter: "|".to_string(),
            test_level: Level::Error,
            default_meta: Metadata::new(),
            transforms: Vec::new(),
            transform_opts: Metadata::new(),
            hooks: None,
            sink: Arc::new(ConsoleSink::stdout()),
            colorize: true,
            handle_panics: false,
            env: None,
        }
    }
}

impl LoggerOptions {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Install a hook provider from a closure.
    pub fn with_hooks<F>(mut self, provider: F) -> Self
    where
        F: Fn(&Hooks) -> HookOverrides + Send + Sync + 'static,
    {
        self.hooks = Some(Arc::new(provider));
        self
    }

    /// The environment to use: the explicit one or the process environment.
    pub fn resolve_env(&self) -> EnvSignals {
        self.env.clone().unwrap_or_else(EnvSignals::from_env)
    }
}

impl fmt::Debug for LoggerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerOptions")
            .field("name", &self.name)
            .field("delimiter", &self.delimiter)
            .field("test_level", &self.test_level)
            .field("default_meta", &self.default_meta)
            .field("transforms", &self.transforms.len())
            .field("transform_opts", &self.transform_opts)
            .field("hooks", &self.hooks.is_some())
            .field("colorize", &self.colorize)
            .field("handle_panics", &self.handle_panics)
            .field("env", &self.env)
            .finish()
    }
}
