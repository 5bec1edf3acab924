use std::path::Path;

use dbdraft_core::Dialect;
use serde::{Deserialize, Serialize};

use super::atomic::write_bytes_atomic;
use super::{ConfigError, ConfigResult};

pub const DEFAULT_SETTINGS_PATH: &str = "dbdraft.toml";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub format: LogFormat,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Dialect used when a command gets no `--dialect`.
    pub default_dialect: Dialect,
    /// Only envelopes from this origin are accepted by `listen`.
    pub trusted_origin: String,
    pub logging: LoggingSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_dialect: Dialect::PostgreSql,
            trusted_origin: "http://localhost:3000".to_string(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Settings {
    fn validate(&self) -> ConfigResult<()> {
        if self.trusted_origin.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "trusted_origin must not be empty".to_string(),
            ));
        }
        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "logging.level must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Read settings from `path`, writing the defaults there first if it does not exist.
pub fn load_or_create_settings(path: &Path) -> ConfigResult<Settings> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        settings.validate()?;
        return Ok(settings);
    }

    let settings = Settings::default();
    save_settings(path, &settings)?;
    Ok(settings)
}

pub fn save_settings(path: &Path, settings: &Settings) -> ConfigResult<()> {
    settings.validate()?;
    let encoded = toml::to_string_pretty(settings)?;
    write_bytes_atomic(path, encoded.as_bytes())
}
