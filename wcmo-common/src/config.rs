//! Configuration loading and library root resolution

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Logging configuration section of the TOML config file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter ("error", "warn", "info", "debug", "trace")
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// TOML configuration file contents (`~/.config/wcmo/config.toml`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Media library root folder
    pub library_root: Option<String>,
    /// Output directory for generated reports
    pub output_dir: Option<String>,
    /// Path to the taxonomy registry file
    pub taxonomy_path: Option<String>,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TomlConfig {
    /// Parse a TOML config document
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Load config from a specific file path
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        Self::from_str(&content)
    }

    /// Load config from the default platform location, if present
    pub fn load_default() -> Option<Self> {
        let path = default_config_path()?;
        if !path.exists() {
            return None;
        }
        match Self::load(&path) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!("Ignoring unreadable config {}: {}", path.display(), e);
                None
            }
        }
    }
}

/// Default configuration file path for the platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("wcmo").join("config.toml"))
}

/// Library root resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_library_root(
    cli_arg: Option<&str>,
    env_var_name: &str,
    config: Option<&TomlConfig>,
) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(root) = config.and_then(|c| c.library_root.as_deref()) {
        return PathBuf::from(root);
    }

    // Priority 4: OS-dependent compiled default
    default_library_root()
}

/// OS-dependent default library root
fn default_library_root() -> PathBuf {
    dirs::picture_dir()
        .or_else(dirs::home_dir)
        .map(|d| d.join("carvings"))
        .unwrap_or_else(|| PathBuf::from("./carvings"))
}
