mod types;

pub use types::*;

use crate::{Error, Result};
use std::{env, path::Path};
use tracing::debug;

pub async fn load() -> Result<Config> {
    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());
    let mut config = load_from(&config_path).await?;

    if let Ok(db_path) = env::var("PREDICTIONS_DB_PATH") {
        config.server.database_path = db_path;
    }

    Ok(config)
}

pub async fn load_from(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    debug!("Loading configuration from: {}", path.display());

    let config_str = tokio::fs::read_to_string(path).await?;
    parse(&config_str)
}

pub fn parse(config_str: &str) -> Result<Config> {
    let config: Config = serde_yaml::from_str(config_str)?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.persistence.write_timeout_ms == 0 {
        return Err(Error::config("persistence.write_timeout_ms must be greater than 0"));
    }

    if config.persistence.fallback_capacity == 0 {
        return Err(Error::config("persistence.fallback_capacity must be greater than 0"));
    }

    for user in &config.security.users {
        if user.username.is_empty() {
            return Err(Error::config("security.users: username must not be empty"));
        }
        if !user.password_hash.starts_with('$') {
            return Err(Error::config(format!(
                "security.users: password_hash for '{}' is not a PHC string",
                user.username
            )));
        }
    }

    Ok(())
}
