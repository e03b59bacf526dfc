use crate::level::Level;
use crate::logger::Logger;
use crate::record::{Arg, Metadata};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// `tracing_subscriber` layer that forwards application `tracing` events into
/// a [`Logger`], so they go through the same transforms, renderers and
/// transports as direct log calls.
///
/// Event fields become metadata and the `message` field becomes the log
/// message. Events emitted by this crate are skipped to avoid feeding the
/// logger's own diagnostics back into it.
pub struct LoggerLayer {
    logger: Logger,
    /// Events handed to the logger.
    pub forwarded_events: Arc<AtomicU64>,
    /// Events whose log call returned an error.
    pub failed_events: Arc<AtomicU64>,
}

impl LoggerLayer {
    pub fn new(logger: Logger) -> Self {
        Self {
            logger,
            forwarded_events: Arc::new(AtomicU64::new(0)),
            failed_events: Arc::new(AtomicU64::new(0)),
        }
    }
}

fn is_internal(target: &str) -> bool {
    target == env!("CARGO_CRATE_NAME")
        || target
            .strip_prefix(env!("CARGO_CRATE_NAME"))
            .is_some_and(|rest| rest.starts_with("::"))
}

impl<S> Layer<S> for LoggerLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if is_internal(meta.target()) {
            return;
        }
        let level = Level::from(*meta.level());
        if !self.logger.is_level_enabled(level) {
            return;
        }

        let mut fields = Metadata::new();
        let mut message: Option<String> = None;
        let mut visitor = FieldVisitor {
            fields: &mut fields,
            message: &mut message,
        };
        event.record(&mut visitor);

        let splat = if fields.is_empty() {
            Vec::new()
        } else {
            vec![Arg::Json(Value::Object(fields.into_iter().collect()))]
        };

        self.forwarded_events.fetch_add(1, Ordering::Relaxed);
        if let Err(e) = self.logger.log_with(level, message.unwrap_or_default(), splat) {
            self.failed_events.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(error = %e, event_target = meta.target(), "failed to forward tracing event");
        }
    }
}

pub struct FieldVisitor<'a> {
    pub fields: &'a mut Metadata,
    pub message: &'a mut Option<String>,
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.fields.insert(field.name().to_string(), Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.message = Some(format!("{:?}", value));
        } else {
            self.fields.insert(field.name().to_string(), Value::String(format!("{:?}", value)));
        }
    }
}
