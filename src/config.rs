// ⚙️ Settings - TOML file selected by CLI flag, CONFIG_PATH, or the default path

use crate::error::{EtlError, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "config/settings.toml";
pub const CONFIG_PATH_ENV: &str = "CONFIG_PATH";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub files: FilesConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilesConfig {
    pub providers: PathBuf,
    pub patients: PathBuf,
    pub claims: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_log_file() -> PathBuf {
    PathBuf::from("logs/etl.log")
}

fn default_level() -> String {
    "INFO".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            log_file: default_log_file(),
            level: default_level(),
        }
    }
}

impl Settings {
    /// Load settings, reading `.env` first if one exists
    ///
    /// `explicit` wins over `CONFIG_PATH`, which wins over `config/settings.toml`.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();
        let path = resolve_config_path(explicit, env::var(CONFIG_PATH_ENV).ok());
        Self::from_file(&path)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            EtlError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(content)?;
        Ok(settings)
    }
}

fn resolve_config_path(explicit: Option<&Path>, from_env: Option<String>) -> PathBuf {
    match (explicit, from_env) {
        (Some(path), _) => path.to_path_buf(),
        (None, Some(env_path)) if !env_path.trim().is_empty() => PathBuf::from(env_path),
        _ => PathBuf::from(DEFAULT_CONFIG_PATH),
    }
}
