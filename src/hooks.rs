use crate::config::LoggerOptions;
use crate::env::EnvSignals;
use crate::format::{select_renderer, Audience, Formatter, HumanStyle};
use crate::level::{default_colors, Level, LevelColors};
use crate::logger::Logger;
use crate::record::LogRecord;
use crate::transform::TransformPipeline;
use crate::transport::{select_transport_names, Transport, TransportRecord, DEVELOPMENT, LOCAL, PRODUCTION};
use std::sync::Arc;

/// Builds every transport the logger may use.
pub type CreateTransportsHook = Arc<dyn Fn(&CreateTransportsContext<'_>) -> TransportRecord + Send + Sync>;
/// Picks the active transports out of the record.
pub type SelectTransportsHook = Arc<dyn Fn(&SelectTransportsContext<'_>) -> Vec<Arc<Transport>> + Send + Sync>;
/// Styles for the `[LEVEL]` tag of human-readable lines.
pub type SelectColorsHook = Arc<dyn Fn() -> LevelColors + Send + Sync>;
/// Last chance to adjust the logger before it is handed out.
pub type LoggerCreatedHook = Arc<dyn Fn(&LoggerCreatedContext<'_>) + Send + Sync>;
/// Produces the final line from a rendered record.
pub type LogFormatHook = Arc<dyn Fn(&LogRecord) -> String + Send + Sync>;
/// Receives the base hooks and returns the ones to replace.
pub type HooksProvider = Arc<dyn Fn(&Hooks) -> HookOverrides + Send + Sync>;

pub struct CreateTransportsContext<'a> {
    /// The effective hooks, so transports format through the effective `on_log_format`.
    pub hooks: &'a Hooks,
    pub options: &'a LoggerOptions,
    pub colors: &'a LevelColors,
}

pub struct SelectTransportsContext<'a> {
    pub record: &'a TransportRecord,
    pub env: &'a EnvSignals,
}

pub struct LoggerCreatedContext<'a> {
    pub logger: &'a Logger,
    pub levels: &'a [Level],
    pub colors: &'a LevelColors,
    pub options: &'a LoggerOptions,
    pub env: &'a EnvSignals,
}

/// The five behaviors a logger is assembled from.
///
/// Start from [`Hooks::base`] and replace individual entries with
/// [`Hooks::merge`]; entries that are not overridden keep their base behavior.
#[derive(Clone)]
pub struct Hooks {
    /// Default: `production` (structured, `success`), `development` (structured,
    /// `debug`) and `local` (human, logger threshold), all writing to the
    /// configured sink.
    pub on_create_transports: CreateTransportsHook,
    /// Default: [`select_transport_names`] applied to the record.
    pub on_select_transports: SelectTransportsHook,
    /// Default: [`default_colors`].
    pub on_select_colors: SelectColorsHook,
    /// Default: test threshold under `APP_ENV=test`, `LOGGER_LEVEL` override,
    /// and muting under CI tests.
    pub on_logger_created: LoggerCreatedHook,
    /// Default: the renderer output unchanged.
    pub on_log_format: LogFormatHook,
}

/// Replacement hooks; `None` keeps the base entry.
#[derive(Clone, Default)]
pub struct HookOverrides {
    pub on_create_transports: Option<CreateTransportsHook>,
    pub on_select_transports: Option<SelectTransportsHook>,
    pub on_select_colors: Option<SelectColorsHook>,
    pub on_logger_created: Option<LoggerCreatedHook>,
    pub on_log_format: Option<LogFormatHook>,
}

impl HookOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_create_transports<F>(mut self, f: F) -> Self
    where
        F: Fn(&CreateTransportsContext<'_>) -> TransportRecord + Send + Sync + 'static,
    {
        self.on_create_transports = Some(Arc::new(f));
        self
    }

    pub fn on_select_transports<F>(mut self, f: F) -> Self
    where
        F: Fn(&SelectTransportsContext<'_>) -> Vec<Arc<Transport>> + Send + Sync + 'static,
    {
        self.on_select_transports = Some(Arc::new(f));
        self
    }

    pub fn on_select_colors<F>(mut self, f: F) -> Self
    where
        F: Fn() -> LevelColors + Send + Sync + 'static,
    {
        self.on_select_colors = Some(Arc::new(f));
        self
    }

    pub fn on_logger_created<F>(mut self, f: F) -> Self
    where
        F: Fn(&LoggerCreatedContext<'_>) + Send + Sync + 'static,
    {
        self.on_logger_created = Some(Arc::new(f));
        self
    }

    pub fn on_log_format<F>(mut self, f: F) -> Self
    where
        F: Fn(&LogRecord) -> String + Send + Sync + 'static,
    {
        self.on_log_format = Some(Arc::new(f));
        self
    }
}

impl Default for Hooks {
    fn default() -> Self {
        Self::base()
    }
}

impl Hooks {
    pub fn base() -> Self {
        Self {
            on_create_transports: Arc::new(create_transports),
            on_select_transports: Arc::new(select_transports),
            on_select_colors: Arc::new(default_colors),
            on_logger_created: Arc::new(logger_created),
            on_log_format: Arc::new(log_format),
        }
    }

    /// Replace the entries present in `overrides`, keeping the rest.
    pub fn merge(&self, overrides: HookOverrides) -> Hooks {
        let base = self.clone();
        Hooks {
            on_create_transports: overrides.on_create_transports.unwrap_or(base.on_create_transports),
            on_select_transports: overrides.on_select_transports.unwrap_or(base.on_select_transports),
            on_select_colors: overrides.on_select_colors.unwrap_or(base.on_select_colors),
            on_logger_created: overrides.on_logger_created.unwrap_or(base.on_logger_created),
            on_log_format: overrides.on_log_format.unwrap_or(base.on_log_format),
        }
    }

    /// Base hooks overlaid with whatever `provider` returns.
    pub fn resolve(provider: Option<&HooksProvider>) -> Hooks {
        let base = Hooks::base();
        match provider {
            Some(provider) => {
                let overrides = provider(&base);
                base.merge(overrides)
            }
            None => base,
        }
    }
}

fn create_transports(ctx: &CreateTransportsContext<'_>) -> TransportRecord {
    let options = ctx.options;
    let formatter = |audience: Audience| {
        let style = HumanStyle {
            delimiter: options.delimiter.clone(),
            colors: ctx.colors.clone(),
            colorize: options.colorize,
        };
        Formatter::new(
            TransformPipeline::new(&options.transforms, &options.transform_opts),
            select_renderer(audience, style),
            Arc::clone(&ctx.hooks.on_log_format),
        )
    };

    [
        (PRODUCTION, Some(Level::Success), Audience::Machine),
        (DEVELOPMENT, Some(Level::Debug), Audience::Machine),
        (LOCAL, None, Audience::Human),
    ]
    .into_iter()
    .map(|(name, level, audience)| {
        let transport = Transport::new(name, level, formatter(audience), Arc::clone(&options.sink));
        (name.to_string(), Arc::new(transport))
    })
    .collect()
}

fn select_transports(ctx: &SelectTransportsContext<'_>) -> Vec<Arc<Transport>> {
    select_transport_names(ctx.env)
        .into_iter()
        .filter_map(|name| {
            let transport = ctx.record.get(name).cloned();
            if transport.is_none() {
                tracing::warn!(transport = name, "selected transport was not created");
            }
            transport
        })
        .collect()
}

fn logger_created(ctx: &LoggerCreatedContext<'_>) {
    let logger = ctx.logger;

    if ctx.env.is_test() {
        logger.set_level(ctx.options.test_level);
    }

    if let Some(level) = ctx.env.override_level() {
        for transport in logger.transports() {
            transport.set_level(None);
        }
        logger.set_level(level);
    }

    if ctx.env.ci && ctx.env.is_test() {
        logger.set_silent(true);
    }
}

fn log_format(record: &LogRecord) -> String {
    record
        .formatted
        .clone()
        .unwrap_or_else(|| record.message.display())
}
