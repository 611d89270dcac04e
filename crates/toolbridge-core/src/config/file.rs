//! File-based configuration (YAML)
//!
//! User-level config lives at `<config dir>/toolbridge/config.yaml`
//! (`~/.config` on Linux, `~/Library/Application Support` on macOS).

use std::fs;
use std::path::{Path, PathBuf};

use super::error::{ConfigError, ConfigResult};
use super::settings::BridgeConfig;

/// A YAML configuration file
///
/// # Example
///
/// ```no_run
/// use toolbridge_core::config::ConfigFile;
///
/// let config = ConfigFile::user().load()?;
/// # Ok::<(), toolbridge_core::config::ConfigError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The user-level config file
    pub fn user() -> Self {
        let config_dir = dirs::config_dir().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config")
        });
        Self::new(config_dir.join("toolbridge").join("config.yaml"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the file; a missing file yields the defaults
    pub fn load(&self) -> ConfigResult<BridgeConfig> {
        if !self.exists() {
            return Ok(BridgeConfig::default());
        }

        let content = fs::read_to_string(&self.path).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })?;

        parse_yaml(&content).map_err(|message| ConfigError::Parse {
            path: self.path.clone(),
            message,
        })
    }
}

fn parse_yaml(content: &str) -> Result<BridgeConfig, String> {
    if content.trim().is_empty() {
        return Ok(BridgeConfig::default());
    }
    serde_yaml::from_str(content).map_err(|e| e.to_string())
}
