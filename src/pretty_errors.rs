use crate::record::{Arg, ErrorInfo, LogRecord, Metadata};
use crate::transform::{Packed, Transform, TransformOptions, TransformResult};
use serde_json::{json, Value};
use std::sync::Arc;

/// Extracts extra context from an error, e.g. a VError-style info object.
pub type ErrorInfoFn = Arc<dyn Fn(&ErrorInfo) -> Metadata + Send + Sync>;

/// Rewrites captured errors into `{ message, info, stack: [..] }` objects so that
/// stack traces render one line per array entry.
///
/// - `logger.error(vec![err])` (or an error message with no splat) logs the
///   error's message and adds `message`, `info` and `stack` to the metadata.
/// - Errors passed as splat arguments are wrapped as `{ "error": {..} }`.
#[derive(Clone, Default)]
pub struct PrettyPrintErrors {
    info_fn: Option<ErrorInfoFn>,
}

impl PrettyPrintErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_info_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&ErrorInfo) -> Metadata + Send + Sync + 'static,
    {
        self.info_fn = Some(Arc::new(f));
        self
    }

    fn pretty(&self, error: &ErrorInfo) -> Value {
        let info = match &self.info_fn {
            Some(f) => f(error),
            None => error.info.clone(),
        };
        json!({
            "message": error.message,
            "info": info,
            "stack": error.stack_lines(),
        })
    }
}

/// Convenience constructor returning the transform ready for `LoggerOptions::transforms`.
pub fn pretty_print_errors() -> Arc<dyn Transform> {
    Arc::new(PrettyPrintErrors::new())
}

impl Transform for PrettyPrintErrors {
    fn transform(&self, record: &mut LogRecord, opts: &TransformOptions) -> TransformResult {
        let extracted = opts.unpack(record);

        if extracted.splat.is_empty() {
            let error = match &extracted.message {
                Arg::List(items) => items.first().and_then(Arg::as_error),
                Arg::Error(error) => Some(error),
                _ => None,
            };
            if let Some(error) = error {
                opts.pack(
                    record,
                    Packed {
                        message: Some(Arg::Text(error.message.clone())),
                        splat: Some(vec![Arg::Json(self.pretty(error))]),
                    },
                );
            }
            return Ok(None);
        }

        let splat = extracted
            .splat
            .iter()
            .map(|arg| match arg {
                Arg::Error(error) => Arg::Json(json!({ "error": self.pretty(error) })),
                other => other.clone(),
            })
            .collect();
        opts.pack(record, Packed::splat(splat));
        record.metadata.remove("stack");
        Ok(None)
    }
}
