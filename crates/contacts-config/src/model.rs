use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level service configuration. Every section has defaults so an empty
/// file (or no file at all) yields a runnable setup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub migrations: MigrationsConfig,
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("contacts.db"),
        }
    }
}

/// Where the SQL migration files live.
///
/// When `dir` is unset the runner falls back to probing a fixed list of
/// conventional locations. That fallback exists for older deployments that
/// relied on the working directory; new setups should set `dir`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationsConfig {
    pub dir: Option<PathBuf>,
}
