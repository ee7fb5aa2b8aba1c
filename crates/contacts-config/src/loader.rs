use std::path::{Path, PathBuf};

use contacts_common::{Error, Result};
use tracing::{debug, info};

use crate::model::AppConfig;

const ENV_DB_PATH: &str = "CONTACTS_DB_PATH";
const ENV_MIGRATIONS_DIR: &str = "CONTACTS_MIGRATIONS_DIR";
const ENV_HOST: &str = "CONTACTS_HOST";
const ENV_PORT: &str = "CONTACTS_PORT";
const ENV_LOG_LEVEL: &str = "CONTACTS_LOG_LEVEL";

/// Loads `AppConfig` from a YAML or TOML file and layers environment
/// overrides on top.
pub struct ConfigLoader {
    path: PathBuf,
}

impl ConfigLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.contacts/config.yml`, or `./config.yml` when no home directory is known.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .map(|home| home.join(".contacts"))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("config.yml")
    }

    /// Read the config file if it exists, otherwise start from defaults, then
    /// apply environment overrides.
    pub fn load(&self) -> Result<AppConfig> {
        self.load_with(|key| std::env::var(key).ok())
    }

    fn load_with<F>(&self, lookup: F) -> Result<AppConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = if self.path.exists() {
            info!("loading config from {}", self.path.display());
            parse_file(&self.path)?
        } else {
            debug!(
                "config file {} not found, using defaults",
                self.path.display()
            );
            AppConfig::default()
        };

        apply_env_overrides(&mut config, lookup)?;
        Ok(config)
    }
}

fn parse_file(path: &Path) -> Result<AppConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match ext {
        "yml" | "yaml" => serde_yaml::from_str(&contents)
            .map_err(|e| Error::Config(format!("YAML parse error: {e}"))),
        "toml" => {
            toml::from_str(&contents).map_err(|e| Error::Config(format!("TOML parse error: {e}")))
        }
        other => Err(Error::Config(format!(
            "unsupported config extension: {other}"
        ))),
    }
}

/// Environment variables win over file values. `lookup` is injected so tests
/// don't have to mutate the process environment.
fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = lookup(ENV_DB_PATH) {
        config.database.path = PathBuf::from(path);
    }
    if let Some(dir) = lookup(ENV_MIGRATIONS_DIR) {
        config.migrations.dir = Some(PathBuf::from(dir));
    }
    if let Some(host) = lookup(ENV_HOST) {
        config.server.host = host;
    }
    if let Some(port) = lookup(ENV_PORT) {
        config.server.port = port
            .parse()
            .map_err(|_| Error::Config(format!("{ENV_PORT} is not a valid port: {port}")))?;
    }
    if let Some(level) = lookup(ENV_LOG_LEVEL) {
        config.log_level = Some(level);
    }
    Ok(())
}
