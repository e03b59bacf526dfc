use crate::record::{Arg, LogRecord};
use crate::transform::{Packed, Transform, TransformOptions, TransformResult};
use std::sync::Arc;

/// Evaluates [`Arg::Lazy`] messages.
///
/// The first value produced becomes the message and the rest become splat.
/// Transforms only run for records that pass a threshold, so a suppressed lazy
/// message is never evaluated.
#[derive(Debug, Clone, Copy, Default)]
pub struct LazyLog;

pub fn lazy_log() -> Arc<dyn Transform> {
    Arc::new(LazyLog)
}

impl Transform for LazyLog {
    fn transform(&self, record: &mut LogRecord, opts: &TransformOptions) -> TransformResult {
        if let Arg::Lazy(lazy) = opts.unpack(record).message {
            let mut values = lazy.evaluate().into_iter();
            let message = values.next().unwrap_or_else(|| Arg::Text(String::new()));
            opts.pack(
                record,
                Packed {
                    message: Some(message),
                    splat: Some(values.collect()),
                },
            );
        }
        Ok(None)
    }
}
