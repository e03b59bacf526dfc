use std::error::Error;

/// Error raised by a user transform. Propagated unchanged to the log call.
pub type TransformError = Box<dyn Error + Send + Sync>;

/// Errors surfaced by logger construction and log calls.
#[derive(thiserror::Error, Debug)]
pub enum LogError {
    #[error("log transform failed: {0}")]
    Transform(#[source] TransformError),

    #[error("failed to serialize log data: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("transport selection produced no transports")]
    NoTransports,

    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
}
