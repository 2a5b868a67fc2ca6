use agribot::{
    config::{self, ConfigSource},
    server,
};
use anyhow::Result;
use tracing::{info, warn};

/// Validates that a log level string is valid
fn validate_log_level(level: &str) -> Result<()> {
    level
        .parse::<tracing_subscriber::filter::LevelFilter>()
        .map_err(|_| {
            anyhow::anyhow!(
                "Invalid log level: '{}'. Valid levels: error, warn, info, debug, trace",
                level
            )
        })?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is normal outside development.
    let dotenv_path = dotenvy::dotenv().ok();

    // Load configuration first (before logging setup)
    let (config, source) = match config::load().await {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let log_level = config.server.logs.level.clone();
    if let Err(e) = validate_log_level(&log_level) {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    // RUST_LOG, when set, takes precedence over the configured level
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&log_level))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .json()
        .init();

    info!("Starting AgriBot server with log level: {}", log_level);
    if let Some(path) = dotenv_path {
        info!("Loaded environment from {}", path.display());
    }
    match &source {
        ConfigSource::File(path) => info!("Configuration loaded from {}", path),
        ConfigSource::Defaults => {
            warn!("No config.yaml found and CONFIG_PATH unset, using built-in defaults")
        }
    }

    server::run(config).await?;

    Ok(())
}
