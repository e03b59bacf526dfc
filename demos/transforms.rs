use lambda_logger::lazy::lazy_log;
use lambda_logger::pretty_errors::PrettyPrintErrors;
use lambda_logger::{create, transform_fn, Arg, LogError, LoggerOptions, Packed, Transform};
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
#[error("payment declined")]
struct PaymentError(#[source] std::io::Error);

fn main() -> Result<(), LogError> {
    // Tags every record with the request id found in transform_opts.
    let request_id = transform_fn(|record, opts| {
        let id = opts.get("request_id").cloned().unwrap_or_default();
        let mut splat = opts.unpack(record).splat;
        splat.push(Arg::Json(json!({ "request_id": id })));
        opts.pack(record, Packed::splat(splat));
        Ok(None)
    });

    let errors: Arc<dyn Transform> = Arc::new(PrettyPrintErrors::new());

    let container = create(LoggerOptions {
        name: "payments".to_string(),
        transforms: vec![lazy_log(), errors, request_id],
        transform_opts: [("request_id".to_string(), json!("req-9f2c"))].into_iter().collect(),
        ..LoggerOptions::default()
    })?;
    let logger = container.logger;

    let err = PaymentError(std::io::Error::new(std::io::ErrorKind::Other, "card expired"));
    logger.error(vec![Arg::error(&err)])?;
    logger.error_with("charge failed", [Arg::error(&err)])?;

    logger.info(Arg::lazy(|| vec![Arg::from("cart has %d items"), Arg::from(3_i64)]))?;
    logger.silly(Arg::lazy(|| {
        println!("never printed: silly is below the default threshold");
        Vec::new()
    }))?;

    Ok(())
}
