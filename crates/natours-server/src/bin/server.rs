//! Natours server binary.

use anyhow::{bail, Result};
use natours_common_log::{LogConfig, LogFormat, LogLevel};
use natours_server::{
    config::{load_config, validate_config},
    Server,
};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = load_config()?;

    let mut log_config = LogConfig::for_mode(config.server.environment.is_development());
    if let Some(level) = LogLevel::parse(&config.logging.level) {
        log_config.level = level;
    }
    log_config.format = LogFormat::parse(&config.logging.format);
    natours_common_log::init(log_config.with_env_overrides())?;

    if let Err(errors) = validate_config(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        bail!("configuration has {} error(s)", errors.len());
    }

    info!("Starting Natours server v{}", env!("CARGO_PKG_VERSION"));

    Server::new(config)?.run().await?;

    info!("Server shutdown complete");
    Ok(())
}
