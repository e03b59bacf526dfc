use crate::error::LogError;
use crate::layer::LoggerLayer;
use crate::logger::Logger;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::{EnvFilter, Registry};

/// Configuration of the `tracing` bridge.
///
/// **Fields**
/// - `max_level`: most verbose `tracing` level forwarded to the logger.
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt` layer is added
///   next to [`LoggerLayer`] and events are also printed by `tracing` itself.
#[derive(Clone, Debug)]
pub struct BridgeConfig {
    pub max_level: LevelFilter,
    pub enable_stdout: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            max_level: LevelFilter::TRACE,
            enable_stdout: false,
        }
    }
}

/// Install a global `tracing` subscriber that forwards events into `logger`.
///
/// **Parameters**
/// - `logger`: the logger that renders and writes forwarded events.
/// - `config`: [`BridgeConfig`] controlling filtering and extra output.
///
/// **Errors**
///
/// Returns [`LogError::Subscriber`] when a global subscriber is already set.
pub fn init_tracing_with_config(logger: Logger, config: BridgeConfig) -> Result<(), LogError> {
    let layer = LoggerLayer::new(logger).with_filter(config.max_level);

    // The two subscriber shapes have different types, hence the two branches.
    if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber)?;
    }
    Ok(())
}

/// Forward every `tracing` event of the process into `logger`.
///
/// Equivalent to [`init_tracing_with_config`] with [`BridgeConfig::default`].
pub fn init_tracing(logger: Logger) -> Result<(), LogError> {
    init_tracing_with_config(logger, BridgeConfig::default())
}

/// Print this crate's own diagnostics to stderr at `debug`.
///
/// Called by `create` when `LOGGER_DEBUG` is set. Does nothing when a global
/// subscriber is already installed. Returns whether one was installed.
pub fn init_diagnostics() -> bool {
    let filter = EnvFilter::new(format!("{}=debug", env!("CARGO_CRATE_NAME")));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok();
    if installed {
        tracing::debug!("logger diagnostics active");
    }
    installed
}
