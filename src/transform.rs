use crate::error::{LogError, TransformError};
use crate::record::{Arg, LogRecord, Metadata};
use serde_json::Value;
use std::sync::Arc;

/// What a transform returns: `Some` replaces the record, `None` keeps the
/// record as mutated in place.
pub type TransformResult = Result<Option<LogRecord>, TransformError>;

/// A user-supplied rewrite of a record, run before rendering.
///
/// Closures are adapted with [`transform_fn`].
pub trait Transform: Send + Sync {
    fn transform(&self, record: &mut LogRecord, opts: &TransformOptions) -> TransformResult;
}

impl<F> Transform for F
where
    F: Fn(&mut LogRecord, &TransformOptions) -> TransformResult + Send + Sync,
{
    fn transform(&self, record: &mut LogRecord, opts: &TransformOptions) -> TransformResult {
        self(record, opts)
    }
}

/// Wrap a closure as a shareable [`Transform`].
pub fn transform_fn<F>(f: F) -> Arc<dyn Transform>
where
    F: Fn(&mut LogRecord, &TransformOptions) -> TransformResult + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Message and splat as seen by a transform.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    pub message: Arg,
    pub splat: Vec<Arg>,
}

/// Fields to write back into a record. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Packed {
    pub message: Option<Arg>,
    pub splat: Option<Vec<Arg>>,
}

impl Packed {
    pub fn message(message: impl Into<Arg>) -> Self {
        Self {
            message: Some(message.into()),
            splat: None,
        }
    }

    pub fn splat(splat: Vec<Arg>) -> Self {
        Self {
            message: None,
            splat: Some(splat),
        }
    }
}

impl From<Extracted> for Packed {
    fn from(extracted: Extracted) -> Self {
        Self {
            message: Some(extracted.message),
            splat: Some(extracted.splat),
        }
    }
}

/// Per-stage options handed to a transform: the static `transform_opts` plus
/// the unpack/pack accessors.
#[derive(Debug, Clone, Default)]
pub struct TransformOptions {
    config: Metadata,
}

impl TransformOptions {
    pub fn new(config: Metadata) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Metadata {
        &self.config
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.config.get(key)
    }

    /// Snapshot of the record's message and splat.
    pub fn unpack(&self, record: &LogRecord) -> Extracted {
        Extracted {
            message: record.message.clone(),
            splat: record.splat.clone(),
        }
    }

    pub fn pack(&self, record: &mut LogRecord, packed: impl Into<Packed>) {
        let Packed { message, splat } = packed.into();
        if let Some(splat) = splat {
            record.splat = splat;
        }
        if let Some(message) = message {
            record.message = message;
        }
    }
}

/// The ordered transform list of one formatter.
///
/// Every stage owns its own [`TransformOptions`], configured once when the
/// pipeline is built.
#[derive(Clone, Default)]
pub struct TransformPipeline {
    stages: Vec<(Arc<dyn Transform>, TransformOptions)>,
}

impl TransformPipeline {
    pub fn new(transforms: &[Arc<dyn Transform>], config: &Metadata) -> Self {
        let stages = transforms
            .iter()
            .map(|transform| (Arc::clone(transform), TransformOptions::new(config.clone())))
            .collect();
        Self { stages }
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run every stage in order. The first failing stage aborts the call.
    pub fn apply(&self, mut record: LogRecord) -> Result<LogRecord, LogError> {
        for (index, (transform, opts)) in self.stages.iter().enumerate() {
            match transform
                .transform(&mut record, opts)
                .map_err(LogError::Transform)?
            {
                Some(replacement) => record = replacement,
                None => {
                    tracing::trace!(stage = index, "transform kept record in place");
                }
            }
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Level;
    use serde_json::json;

    fn record() -> LogRecord {
        let mut record = LogRecord::new(Level::Info, "hello %s");
        record.splat = vec![Arg::from("world"), Arg::from(json!({"a": 1}))];
        record.metadata.insert("keep".into(), json!(true));
        record
    }

    fn append(tag: &'static str) -> Arc<dyn Transform> {
        transform_fn(move |record, opts| {
            let Extracted { message, .. } = opts.unpack(record);
            opts.pack(record, Packed::message(format!("{}{tag}", message.display())));
            Ok(None)
        })
    }

    #[test]
    fn pack_after_unpack_is_identity() {
        let opts = TransformOptions::default();
        let mut r = record();
        let before = r.clone();
        let extracted = opts.unpack(&r);
        opts.pack(&mut r, extracted);
        assert_eq!(r, before);
    }

    #[test]
    fn pack_only_touches_present_fields() {
        let opts = TransformOptions::default();
        let mut r = record();
        opts.pack(&mut r, Packed::splat(vec![]));
        assert_eq!(r.message, Arg::from("hello %s"));
        assert!(r.splat.is_empty());
        assert_eq!(r.metadata["keep"], json!(true));

        opts.pack(&mut r, Packed::default());
        assert_eq!(r.message, Arg::from("hello %s"));
    }

    #[test]
    fn unpack_reflects_current_state() {
        let opts = TransformOptions::default();
        let mut r = record();
        r.splat.push(Arg::from(3_i64));
        assert_eq!(opts.unpack(&r).splat.len(), 3);
    }

    #[test]
    fn stages_run_in_declared_order() {
        let pipeline = TransformPipeline::new(&[append("-a"), append("-b"), append("-c")], &Metadata::new());
        let out = pipeline.apply(LogRecord::new(Level::Info, "x")).unwrap();
        assert_eq!(out.message, Arg::from("x-a-b-c"));
    }

    #[test]
    fn composition_matches_applying_stages_one_by_one() {
        let stages = [append("-1"), append("-2")];
        let whole = TransformPipeline::new(&stages, &Metadata::new())
            .apply(LogRecord::new(Level::Info, "m"))
            .unwrap();
        let first = TransformPipeline::new(&stages[..1], &Metadata::new())
            .apply(LogRecord::new(Level::Info, "m"))
            .unwrap();
        let second = TransformPipeline::new(&stages[1..], &Metadata::new())
            .apply(first)
            .unwrap();
        assert_eq!(whole, second);
    }

    #[test]
    fn replacement_records_feed_the_next_stage() {
        let replace = transform_fn(|record, _| {
            let mut next = LogRecord::new(record.level, "replaced");
            next.label = "new".into();
            Ok(Some(next))
        });
        let pipeline = TransformPipeline::new(&[replace, append("!")], &Metadata::new());
        let out = pipeline.apply(record()).unwrap();
        assert_eq!(out.message, Arg::from("replaced!"));
        assert_eq!(out.label, "new");
        assert!(out.metadata.is_empty());
    }

    #[test]
    fn errors_propagate_and_stop_the_pipeline() {
        let fail = transform_fn(|_, _| Err("bad transform".into()));
        let pipeline = TransformPipeline::new(&[fail, append("!")], &Metadata::new());
        let err = pipeline.apply(record()).unwrap_err();
        assert!(matches!(err, LogError::Transform(_)));
        assert_eq!(err.to_string(), "log transform failed: bad transform");
    }

    #[test]
    fn each_stage_sees_the_static_config() {
        let config = Metadata::from([("suffix".to_string(), json!("?"))]);
        let read = transform_fn(|record, opts| {
            let suffix = opts.get("suffix").and_then(Value::as_str).unwrap_or("");
            let message = format!("{}{suffix}", record.message.display());
            opts.pack(record, Packed::message(message));
            Ok(None)
        });
        let pipeline = TransformPipeline::new(&[read.clone(), read], &config);
        assert_eq!(pipeline.len(), 2);
        let out = pipeline.apply(LogRecord::new(Level::Info, "q")).unwrap();
        assert_eq!(out.message, Arg::from("q??"));
    }
}
