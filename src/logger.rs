use crate::config::LoggerOptions;
use crate::error::LogError;
use crate::hooks::{CreateTransportsContext, Hooks, LoggerCreatedContext, SelectTransportsContext};
use crate::init;
use crate::level::Level;
use crate::record::{Arg, LogRecord, Metadata};
use crate::transport::Transport;
use serde_json::Value;
use std::fmt;
use std::panic;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

struct LoggerCore {
    name: String,
    transports: Vec<Arc<Transport>>,
}

const UNSET: u8 = u8::MAX;

/// Threshold and mute flag of one logger. Unset values are read from the
/// parent, so a parent change reaches children that never set their own.
struct Settings {
    level: AtomicU8,
    silent: AtomicU8,
    parent: Option<Arc<Settings>>,
}

impl Settings {
    fn root() -> Self {
        Self {
            level: AtomicU8::new(Level::Info.priority()),
            silent: AtomicU8::new(0),
            parent: None,
        }
    }

    fn inherit(parent: &Arc<Settings>) -> Self {
        Self {
            level: AtomicU8::new(UNSET),
            silent: AtomicU8::new(UNSET),
            parent: Some(Arc::clone(parent)),
        }
    }

    fn level(&self) -> Level {
        match Level::from_priority(self.level.load(Ordering::Relaxed)) {
            Some(level) => level,
            None => self.parent.as_ref().map_or(Level::Info, |parent| parent.level()),
        }
    }

    fn silent(&self) -> bool {
        match self.silent.load(Ordering::Relaxed) {
            UNSET => self.parent.as_ref().is_some_and(|parent| parent.silent()),
            flag => flag != 0,
        }
    }
}

/// Handle to a configured logger.
///
/// Cloning is cheap and yields the same logger. Children created with
/// [`Logger::child`] share the transports of their parent, carry their own
/// default metadata, and follow the parent's threshold and mute flag until
/// they set their own.
#[derive(Clone)]
pub struct Logger {
    core: Arc<LoggerCore>,
    settings: Arc<Settings>,
    default_meta: Metadata,
    instance: Option<String>,
}

macro_rules! level_methods {
    ($($level:expr => $name:ident, $name_with:ident;)*) => {
        $(
            pub fn $name(&self, message: impl Into<Arg>) -> Result<(), LogError> {
                self.log($level, message)
            }

            pub fn $name_with<M, I>(&self, message: M, args: I) -> Result<(), LogError>
            where
                M: Into<Arg>,
                I: IntoIterator,
                I::Item: Into<Arg>,
            {
                self.log_with($level, message, args)
            }
        )*
    };
}

impl Logger {
    pub fn new(name: impl Into<String>, transports: Vec<Arc<Transport>>, default_meta: Metadata) -> Self {
        Self {
            core: Arc::new(LoggerCore {
                name: name.into(),
                transports,
            }),
            settings: Arc::new(Settings::root()),
            default_meta,
            instance: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.core.name
    }

    pub fn instance(&self) -> Option<&str> {
        self.instance.as_deref()
    }

    pub fn default_meta(&self) -> &Metadata {
        &self.default_meta
    }

    pub fn transports(&self) -> &[Arc<Transport>] {
        &self.core.transports
    }

    pub fn level(&self) -> Level {
        self.settings.level()
    }

    /// Set the threshold of this logger and of children that have not set
    /// their own. The parent is unaffected.
    pub fn set_level(&self, level: Level) {
        self.settings.level.store(level.priority(), Ordering::Relaxed);
    }

    pub fn is_silent(&self) -> bool {
        self.settings.silent()
    }

    /// Mute or unmute this logger and children that have not set their own
    /// flag. The parent is unaffected.
    pub fn set_silent(&self, silent: bool) {
        self.settings.silent.store(u8::from(silent), Ordering::Relaxed);
    }

    /// Whether any transport would write a record at `level`.
    pub fn is_level_enabled(&self, level: Level) -> bool {
        if self.is_silent() {
            return false;
        }
        let threshold = self.level();
        self.core
            .transports
            .iter()
            .any(|transport| transport.accepts(level, threshold))
    }

    pub fn log(&self, level: Level, message: impl Into<Arg>) -> Result<(), LogError> {
        self.log_with(level, message, Vec::<Arg>::new())
    }

    /// Log `message` with positional `args` (the splat).
    ///
    /// Nothing is built or evaluated when no transport accepts `level`. Transform
    /// and serialization failures are returned to the caller.
    pub fn log_with<M, I>(&self, level: Level, message: M, args: I) -> Result<(), LogError>
    where
        M: Into<Arg>,
        I: IntoIterator,
        I::Item: Into<Arg>,
    {
        if !self.is_level_enabled(level) {
            return Ok(());
        }

        let record = LogRecord {
            level,
            message: message.into(),
            splat: args.into_iter().map(Into::into).collect(),
            metadata: self.default_meta.clone(),
            label: self.core.name.clone(),
            instance: self.instance.clone(),
            timestamp: None,
            formatted: None,
        };

        let threshold = self.level();
        for transport in &self.core.transports {
            if transport.accepts(level, threshold) {
                transport.log(record.clone())?;
            }
        }
        Ok(())
    }

    level_methods! {
        Level::Error => error, error_with;
        Level::Warn => warn, warn_with;
        Level::Info => info, info_with;
        Level::Success => success, success_with;
        Level::Verbose => verbose, verbose_with;
        Level::Debug => debug, debug_with;
        Level::Silly => silly, silly_with;
    }

    /// A logger with `meta` merged over this logger's default metadata.
    ///
    /// A string `instance` entry in `meta` becomes the instance qualifier.
    pub fn child(&self, mut meta: Metadata) -> Logger {
        let instance = match meta.remove("instance") {
            Some(Value::String(instance)) => Some(instance),
            Some(other) => {
                meta.insert("instance".to_string(), other);
                self.instance.clone()
            }
            None => self.instance.clone(),
        };
        let mut default_meta = self.default_meta.clone();
        default_meta.extend(meta);
        Logger {
            core: Arc::clone(&self.core),
            settings: Arc::new(Settings::inherit(&self.settings)),
            default_meta,
            instance,
        }
    }

    /// A child logger qualified by `instance`, e.g. `svc[worker]`.
    pub fn child_instance(&self, instance: impl Into<String>, meta: Metadata) -> Logger {
        let mut child = self.child(meta);
        child.instance = Some(instance.into());
        child
    }

    pub fn flush(&self) {
        for transport in &self.core.transports {
            transport.flush();
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.core.name)
            .field("instance", &self.instance)
            .field("level", &self.level())
            .field("silent", &self.is_silent())
            .field("transports", &self.core.transports)
            .field("default_meta", &self.default_meta)
            .finish()
    }
}

/// The default logger plus a factory for child loggers.
#[derive(Debug, Clone)]
pub struct LoggerContainer {
    pub logger: Logger,
}

impl LoggerContainer {
    /// A child of the default logger, qualified by `name` when given.
    pub fn get_logger(&self, name: Option<&str>, meta: Metadata) -> Logger {
        match name {
            Some(name) => self.logger.child_instance(name, meta),
            None => self.logger.child(meta),
        }
    }
}

/// Build a logger from `options`.
///
/// Resolves the hooks, creates and selects transports, then lets the
/// `on_logger_created` hook adjust the result. Fails only when transport
/// selection yields nothing.
pub fn create(options: LoggerOptions) -> Result<LoggerContainer, LogError> {
    let env = options.resolve_env();
    if env.debug {
        init::init_diagnostics();
    }

    let hooks = Hooks::resolve(options.hooks.as_ref());
    let colors = (hooks.on_select_colors)();

    let record = (hooks.on_create_transports)(&CreateTransportsContext {
        hooks: &hooks,
        options: &options,
        colors: &colors,
    });
    let transports = (hooks.on_select_transports)(&SelectTransportsContext {
        record: &record,
        env: &env,
    });
    if transports.is_empty() {
        return Err(LogError::NoTransports);
    }

    tracing::debug!(
        name = %options.name,
        transports = ?transports.iter().map(|t| t.name()).collect::<Vec<_>>(),
        "logger created"
    );

    let logger = Logger::new(options.name.clone(), transports, options.default_meta.clone());
    (hooks.on_logger_created)(&LoggerCreatedContext {
        logger: &logger,
        levels: &Level::ALL,
        colors: &colors,
        options: &options,
        env: &env,
    });

    if options.handle_panics {
        log_panics(logger.clone());
    }

    Ok(LoggerContainer { logger })
}

/// Log every panic through `logger` at `error`, then run the hook that was
/// installed before.
///
/// The panic message is interpolated into the line and the source location
/// is added as `location` metadata.
pub fn log_panics(logger: Logger) {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let payload = info.payload();
        let message = payload
            .downcast_ref::<&str>()
            .map(|message| message.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "Box<dyn Any>".to_string());

        let mut args = vec![Arg::Text(message)];
        if let Some(location) = info.location() {
            args.push(Arg::Json(serde_json::json!({ "location": location.to_string() })));
        }
        if let Err(e) = logger.error_with("uncaught panic: %s", args) {
            tracing::warn!(error = %e, "failed to log panic");
        }

        previous(info);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::EnvSignals;
    use crate::sink::MemorySink;
    use serde_json::json;

    fn container(sink: Arc<MemorySink>, env: EnvSignals) -> LoggerContainer {
        create(LoggerOptions {
            name: "unit".into(),
            sink,
            colorize: false,
            env: Some(env),
            ..LoggerOptions::default()
        })
        .unwrap()
    }

    #[test]
    fn local_logger_uses_the_info_threshold() {
        let sink = Arc::new(MemorySink::new());
        let logger = container(sink.clone(), EnvSignals::local()).logger;
        assert_eq!(logger.level(), Level::Info);
        assert_eq!(logger.transports().len(), 1);
        assert_eq!(logger.transports()[0].name(), "local");

        logger.debug("hidden").unwrap();
        logger.info("shown").unwrap();
        assert_eq!(sink.len(), 1);
        assert!(sink.lines()[0].ends_with("unit: shown"));
    }

    #[test]
    fn children_extend_metadata_without_touching_the_parent() {
        let sink = Arc::new(MemorySink::new());
        let parent = container(sink, EnvSignals::local()).logger;
        let child = parent.child(Metadata::from([("two".to_string(), json!("three"))]));
        let grandchild = child.child_instance("worker", Metadata::new());

        assert!(parent.default_meta().is_empty());
        assert_eq!(child.default_meta()["two"], json!("three"));
        assert_eq!(grandchild.instance(), Some("worker"));
        assert_eq!(child.instance(), None);
    }

    #[test]
    fn instance_key_in_child_meta_qualifies_the_child() {
        let sink = Arc::new(MemorySink::new());
        let parent = container(sink, EnvSignals::local()).logger;
        let child = parent.child(Metadata::from([("instance".to_string(), json!("job-7"))]));
        assert_eq!(child.instance(), Some("job-7"));
        assert!(child.default_meta().is_empty());
    }

    #[test]
    fn parent_threshold_and_mute_flow_down_to_children() {
        let sink = Arc::new(MemorySink::new());
        let parent = container(sink.clone(), EnvSignals::local()).logger;
        let child = parent.child(Metadata::new());
        let grandchild = child.child_instance("worker", Metadata::new());

        parent.set_level(Level::Silly);
        assert_eq!(child.level(), Level::Silly);
        assert_eq!(grandchild.level(), Level::Silly);

        parent.set_silent(true);
        assert!(child.is_silent());
        grandchild.error("muted").unwrap();
        assert!(sink.is_empty());
    }

    #[test]
    fn child_threshold_and_mute_stay_with_the_child() {
        let sink = Arc::new(MemorySink::new());
        let parent = container(sink.clone(), EnvSignals::local()).logger;
        let child = parent.child(Metadata::new());
        let sibling = parent.child(Metadata::new());

        child.set_silent(true);
        child.set_level(Level::Error);
        assert!(!parent.is_silent());
        assert_eq!(parent.level(), Level::Info);
        assert!(!sibling.is_silent());

        parent.info("parent").unwrap();
        sibling.info("sibling").unwrap();
        child.info("below the child threshold").unwrap();
        child.error("child").unwrap();
        assert_eq!(sink.len(), 3);

        // An explicit child setting wins over later parent changes.
        parent.set_level(Level::Silly);
        assert_eq!(child.level(), Level::Error);
        child.set_silent(false);
        parent.set_silent(true);
        child.error("still loud").unwrap();
        assert_eq!(sink.len(), 4);
    }

    #[test]
    fn clones_are_the_same_logger() {
        let sink = Arc::new(MemorySink::new());
        let logger = container(sink, EnvSignals::local()).logger;
        let clone = logger.clone();
        clone.set_level(Level::Debug);
        assert_eq!(logger.level(), Level::Debug);
    }

    #[test]
    fn empty_selection_is_an_error() {
        let options = LoggerOptions {
            env: Some(EnvSignals::local()),
            ..LoggerOptions::default()
        }
        .with_hooks(|_| crate::hooks::HookOverrides::new().on_select_transports(|_| Vec::new()));
        assert!(matches!(create(options), Err(LogError::NoTransports)));
    }
}
