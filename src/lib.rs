//! Console logging for services that run on AWS Lambda and on developer
//! terminals.
//!
//! A logger created with [`create`] writes one JSON object per line when
//! running inside AWS (`AWS_EXECUTION_ENV` set) and colorized, timestamped
//! lines otherwise. User transforms can rewrite each record's message and
//! splat before it is rendered, and every step of logger construction can be
//! replaced through [`hooks::Hooks`].
//!
//! ```no_run
//! use lambda_logger::{create, LoggerOptions, Metadata};
//! use lambda_logger::pretty_errors::pretty_print_errors;
//!
//! let container = create(LoggerOptions {
//!     name: "orders".into(),
//!     transforms: vec![pretty_print_errors()],
//!     ..LoggerOptions::default()
//! })?;
//! let logger = container.get_logger(Some("checkout"), Metadata::new());
//! logger.info_with("order %s placed", ["A-17"])?;
//! # Ok::<(), lambda_logger::LogError>(())
//! ```

pub mod config;
pub mod env;
pub mod error;
pub mod format;
pub mod hooks;
pub mod layer;
pub mod lazy;
pub mod level;
pub mod logger;
pub mod pretty_errors;
pub mod record;
pub mod sink;
pub mod splat;
pub mod transform;
pub mod transport;

pub mod init;
pub mod noop_sink;

pub use config::LoggerOptions;
pub use error::LogError;
pub use level::Level;
pub use logger::{create, log_panics, Logger, LoggerContainer};
pub use noop_sink::NoopSink;
pub use record::{Arg, ErrorInfo, LogRecord, Metadata};
pub use transform::{transform_fn, Packed, Transform, TransformOptions};
