use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub persistence: PersistenceConfig,
    #[serde(default)]
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub logs: LogsConfig,
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Reported by the model status endpoint; never used to select behavior.
    #[serde(default = "default_model_version")]
    pub version: String,
    /// Reject blank `text` with a client error instead of classifying it.
    #[serde(default)]
    pub reject_empty_text: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Upper bound on a single prediction log write.
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,
    /// Entries held in memory while the database is unavailable.
    #[serde(default = "default_fallback_capacity")]
    pub fallback_capacity: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(default)]
    pub csrf: CsrfPolicy,
    #[serde(default)]
    pub users: Vec<UserCredential>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCredential {
    pub username: String,
    /// Argon2 PHC string, e.g. `$argon2id$v=19$...`.
    pub password_hash: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CsrfPolicy {
    Enforce,
    Disable,
    #[default]
    ExemptHealth,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            logs: LogsConfig::default(),
            database_path: default_database_path(),
        }
    }
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            version: default_model_version(),
            reject_empty_text: false,
        }
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            write_timeout_ms: default_write_timeout_ms(),
            fallback_capacity: default_fallback_capacity(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_database_path() -> String {
    "predictions.db".to_string()
}

fn default_model_version() -> String {
    "1.0.0".to_string()
}

fn default_write_timeout_ms() -> u64 {
    5000
}

fn default_fallback_capacity() -> usize {
    crate::store::DEFAULT_FALLBACK_CAPACITY
}
