use lambda_logger::init::init_tracing;
use lambda_logger::{create, LogError, LoggerOptions};
use tracing::{error, info};

fn main() -> Result<(), LogError> {
    let container = create(LoggerOptions::named("auth"))?;
    init_tracing(container.logger.clone())?;

    info!("starting service");

    error!(
        user_id = 42,
        reason = "invalid password",
        "authentication failed"
    );

    container.logger.flush();
    Ok(())
}
