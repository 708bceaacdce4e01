//! Configuration loading and resolution
//!
//! Each setting is resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing TOML file is not an error: a warning is logged and the
//! defaults apply. A TOML file that exists but does not parse is.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_SPRITE_BASE: &str = "/CharacterSprites";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LOG_LEVEL: &str = "info";

pub const ENV_SERVER_URL: &str = "LINEAGE_SERVER_URL";
pub const ENV_SPRITE_BASE: &str = "LINEAGE_SPRITE_BASE";

/// `[logging]` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// On-disk TOML configuration; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    pub server_url: Option<String>,
    pub sprite_base: Option<String>,
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Fully resolved configuration
#[derive(Debug, Clone, PartialEq)]
pub struct LineageConfig {
    pub server_url: String,
    pub sprite_base: String,
    pub request_timeout: Duration,
    pub log_level: String,
}

impl Default for LineageConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            sprite_base: DEFAULT_SPRITE_BASE.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

/// Platform config file location: `<config_dir>/lineage/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("lineage").join("config.toml"))
}

/// Read a TOML config; `Ok(None)` when the file does not exist
pub fn load_toml_config(path: &Path) -> Result<Option<TomlConfig>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    let config = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;
    Ok(Some(config))
}

/// Write a TOML config, creating parent directories as needed
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Builder that merges CLI, environment, TOML and defaults
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    server_url: Option<String>,
    sprite_base: Option<String>,
    config_file: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_server_url(mut self, url: Option<String>) -> Self {
        self.server_url = url;
        self
    }

    pub fn with_sprite_base(mut self, base: Option<String>) -> Self {
        self.sprite_base = base;
        self
    }

    /// Use this file instead of the platform default location
    pub fn with_config_file(mut self, path: Option<PathBuf>) -> Self {
        self.config_file = path;
        self
    }

    pub fn resolve(&self) -> Result<LineageConfig> {
        let toml = self.load_file()?.unwrap_or_default();
        let defaults = LineageConfig::default();

        let server_url = pick(
            self.server_url.clone(),
            ENV_SERVER_URL,
            toml.server_url,
            defaults.server_url,
        );
        let sprite_base = pick(
            self.sprite_base.clone(),
            ENV_SPRITE_BASE,
            toml.sprite_base,
            defaults.sprite_base,
        );

        if !server_url.starts_with("http://") && !server_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "server_url must be an http(s) URL, got '{}'",
                server_url
            )));
        }

        let request_timeout = toml
            .request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        Ok(LineageConfig {
            server_url,
            sprite_base,
            request_timeout,
            log_level: toml.logging.level,
        })
    }

    fn load_file(&self) -> Result<Option<TomlConfig>> {
        let path = match self.config_file.clone().or_else(default_config_path) {
            Some(path) => path,
            None => return Ok(None),
        };

        match load_toml_config(&path)? {
            Some(config) => {
                info!("Loaded config from {}", path.display());
                Ok(Some(config))
            }
            None => {
                if self.config_file.is_some() {
                    warn!("Config file {} not found, using defaults", path.display());
                }
                Ok(None)
            }
        }
    }
}

fn pick(cli: Option<String>, env_var: &str, toml: Option<String>, default: String) -> String {
    let non_empty = |v: &String| !v.trim().is_empty();
    cli.filter(non_empty)
        .or_else(|| std::env::var(env_var).ok().filter(non_empty))
        .or_else(|| toml.filter(non_empty))
        .unwrap_or(default)
}
