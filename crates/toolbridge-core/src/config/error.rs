//! Configuration errors

use std::path::PathBuf;

/// Errors that can occur while loading or validating configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML in {}: {}", .path.display(), .message)]
    Parse { path: PathBuf, message: String },

    #[error("No registry endpoint configured: set registry.endpoint or TOOLBRIDGE_REGISTRY_URL")]
    MissingEndpoint,

    #[error("Invalid registry endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Invalid value for {field}: {message}")]
    Invalid { field: String, message: String },
}

impl ConfigError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
