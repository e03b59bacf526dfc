use lambda_logger::{create, Arg, LogError, LoggerOptions, Metadata};
use serde_json::json;

fn main() -> Result<(), LogError> {
    let container = create(LoggerOptions {
        name: "orders".to_string(),
        default_meta: Metadata::from([("region".to_string(), json!("eu-west-1"))]),
        ..LoggerOptions::default()
    })?;

    let logger = container.get_logger(Some("checkout"), Metadata::new());

    logger.info("service started")?;
    logger.warn_with("retrying order %s (attempt %d)", [Arg::from("A-17"), Arg::from(2_i64)])?;
    logger.success_with("order placed", [Arg::json(&json!({ "order_id": "A-17", "total": 42.5 }))?])?;
    logger.debug("only visible with LOGGER_LEVEL=debug")?;

    Ok(())
}
