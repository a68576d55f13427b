use anyhow::Result;
use model_serving::{config, server};
use std::io::BufRead;
use tracing::info;

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

/// Reads a password from stdin and prints its hash for `security.users`.
fn print_password_hash() -> Result<()> {
    let mut password = String::new();
    std::io::stdin().lock().read_line(&mut password)?;
    let password = password.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        anyhow::bail!("Password must not be empty");
    }

    println!("{}", server::auth::hash_password(password)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    if std::env::args().nth(1).as_deref() == Some("hash-password") {
        return print_password_hash();
    }

    // Load configuration first (before logging setup)
    let config = match config::load().await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Environment variable overrides config
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| config.server.logs.level.clone());

    // RUST_LOG may hold a full directive list; only a bare level is checked here.
    if std::env::var("RUST_LOG").is_err() {
        if let Err(e) = validate_log_level(&log_level) {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&log_level))?;

    tracing_subscriber::fmt().with_env_filter(filter).json().init();

    info!(
        "Starting model-serving {} with log level: {}",
        env!("CARGO_PKG_VERSION"),
        log_level
    );
    info!("Model version: {}", config.model.version);

    server::run(config).await?;

    Ok(())
}
