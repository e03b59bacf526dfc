use crate::error::LogError;
use crate::level::Level;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Free-form key/value metadata attached to records and loggers.
pub type Metadata = BTreeMap<String, Value>;

/// Metadata keys that are rendered structurally instead of as "rest".
pub const STRUCTURAL_KEYS: [&str; 3] = ["label", "timestamp", "instance"];

/// A single log call in flight.
///
/// Created by the logger for every call that passes a threshold, handed through
/// the transform pipeline and renderer of each transport, then dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub level: Level,
    pub message: Arg,
    /// Positional interpolation arguments, in call-site order.
    pub splat: Vec<Arg>,
    pub metadata: Metadata,
    pub label: String,
    pub instance: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    /// Renderer output, read by the `on_log_format` hook.
    pub formatted: Option<String>,
}

impl LogRecord {
    pub fn new(level: Level, message: impl Into<Arg>) -> Self {
        Self {
            level,
            message: message.into(),
            splat: Vec::new(),
            metadata: Metadata::new(),
            label: String::new(),
            instance: None,
            timestamp: None,
            formatted: None,
        }
    }

    /// Metadata without the structural keys.
    pub fn rest(&self) -> Metadata {
        self.metadata
            .iter()
            .filter(|(key, _)| !STRUCTURAL_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// `label` or `label.instance`.
    pub fn service(&self) -> String {
        match &self.instance {
            Some(instance) => format!("{}.{}", self.label, instance),
            None => self.label.clone(),
        }
    }
}

/// A message or splat value.
#[derive(Clone)]
pub enum Arg {
    Text(String),
    Json(Value),
    Error(ErrorInfo),
    List(Vec<Arg>),
    /// Deferred message; evaluates to `[format, args...]`.
    Lazy(LazyMessage),
}

impl Arg {
    /// Serialize any value into a JSON argument.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, LogError> {
        Ok(Arg::Json(serde_json::to_value(value)?))
    }

    pub fn error<E: std::error::Error>(err: &E) -> Self {
        Arg::Error(ErrorInfo::from_error(err))
    }

    pub fn lazy<F>(f: F) -> Self
    where
        F: Fn() -> Vec<Arg> + Send + Sync + 'static,
    {
        Arg::Lazy(LazyMessage(Arc::new(f)))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Arg::Text(text) => Some(text),
            Arg::Json(Value::String(text)) => Some(text),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<&ErrorInfo> {
        match self {
            Arg::Error(error) => Some(error),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Arg::Text(text) => Value::String(text.clone()),
            Arg::Json(value) => value.clone(),
            Arg::Error(error) => error.to_value(),
            Arg::List(items) => Value::Array(items.iter().map(Arg::to_value).collect()),
            Arg::Lazy(_) => Value::String("[lazy message]".to_string()),
        }
    }

    /// Text used where a message is printed inline.
    pub fn display(&self) -> String {
        match self {
            Arg::Text(text) => text.clone(),
            Arg::Json(Value::String(text)) => text.clone(),
            Arg::Error(error) => error.message.clone(),
            other => other.to_value().to_string(),
        }
    }
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Arg::Json(value) => f.debug_tuple("Json").field(value).finish(),
            Arg::Error(error) => f.debug_tuple("Error").field(error).finish(),
            Arg::List(items) => f.debug_tuple("List").field(items).finish(),
            Arg::Lazy(_) => f.write_str("Lazy(..)"),
        }
    }
}

impl PartialEq for Arg {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Arg::Text(a), Arg::Text(b)) => a == b,
            (Arg::Json(a), Arg::Json(b)) => a == b,
            (Arg::Error(a), Arg::Error(b)) => a == b,
            (Arg::List(a), Arg::List(b)) => a == b,
            (Arg::Lazy(a), Arg::Lazy(b)) => Arc::ptr_eq(&a.0, &b.0),
            _ => false,
        }
    }
}

impl From<&str> for Arg {
    fn from(text: &str) -> Self {
        Arg::Text(text.to_string())
    }
}

impl From<String> for Arg {
    fn from(text: String) -> Self {
        Arg::Text(text)
    }
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        Arg::Json(value)
    }
}

impl From<ErrorInfo> for Arg {
    fn from(error: ErrorInfo) -> Self {
        Arg::Error(error)
    }
}

impl From<Vec<Arg>> for Arg {
    fn from(items: Vec<Arg>) -> Self {
        Arg::List(items)
    }
}

macro_rules! arg_from_json {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Arg {
                fn from(value: $ty) -> Self {
                    Arg::Json(Value::from(value))
                }
            }
        )*
    };
}

arg_from_json!(bool, i32, i64, u32, u64, f64);

/// A zero-argument message producer.
#[derive(Clone)]
pub struct LazyMessage(Arc<dyn Fn() -> Vec<Arg> + Send + Sync>);

impl LazyMessage {
    pub fn evaluate(&self) -> Vec<Arg> {
        (self.0)()
    }
}

/// An error captured at the log call site.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorInfo {
    pub name: String,
    pub message: String,
    /// Trace text, one frame or cause per line.
    pub stack: String,
    /// Extra context carried by the error.
    pub info: Metadata,
}

impl ErrorInfo {
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            stack: format!("Error: {message}"),
            name: "Error".to_string(),
            message,
            info: Metadata::new(),
        }
    }

    /// Capture an error, its `source()` chain and, when enabled, a backtrace.
    pub fn from_error<E: std::error::Error>(err: &E) -> Self {
        let name = short_type_name(std::any::type_name::<E>());
        let message = err.to_string();

        let mut lines = vec![format!("{name}: {message}")];
        let mut source = err.source();
        while let Some(cause) = source {
            lines.push(format!("    caused by: {cause}"));
            source = cause.source();
        }

        let backtrace = Backtrace::capture();
        if backtrace.status() == BacktraceStatus::Captured {
            lines.extend(backtrace.to_string().lines().map(|line| line.to_string()));
        }

        Self {
            name,
            message,
            stack: lines.join("\n"),
            info: Metadata::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if let Some(rest) = self.stack.strip_prefix(&format!("{}:", self.name)) {
            self.stack = format!("{name}:{rest}");
        }
        self.name = name;
        self
    }

    pub fn with_info(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.info.insert(key.into(), value.into());
        self
    }

    pub fn stack_lines(&self) -> Vec<String> {
        self.stack.lines().map(|line| line.to_string()).collect()
    }

    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "name": self.name,
            "message": self.message,
            "stack": self.stack,
            "info": self.info,
        })
    }
}

fn short_type_name(full: &str) -> String {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}
