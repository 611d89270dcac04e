//! Tool provider endpoint addressing

use std::path::PathBuf;

use super::error::{RegistryError, RegistryResult};

/// Where the MCP server lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEndpoint {
    /// Streamable HTTP transport (`http://` or `https://`)
    Http(String),
    /// Unix domain socket (`unix:///path/to.sock`)
    Unix(PathBuf),
}

impl RegistryEndpoint {
    /// Parse an endpoint string
    pub fn parse(raw: &str) -> RegistryResult<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(RegistryError::InvalidEndpoint("endpoint is empty".to_string()));
        }

        if raw.starts_with("http://") || raw.starts_with("https://") {
            return Ok(RegistryEndpoint::Http(raw.to_string()));
        }

        if let Some(path) = raw.strip_prefix("unix://") {
            if path.is_empty() {
                return Err(RegistryError::InvalidEndpoint(format!(
                    "missing socket path in '{}'",
                    raw
                )));
            }
            return Ok(RegistryEndpoint::Unix(PathBuf::from(path)));
        }

        Err(RegistryError::InvalidEndpoint(format!(
            "unsupported scheme in '{}' (expected http://, https:// or unix://)",
            raw
        )))
    }
}

impl std::fmt::Display for RegistryEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryEndpoint::Http(url) => write!(f, "{}", url),
            RegistryEndpoint::Unix(path) => write!(f, "unix://{}", path.display()),
        }
    }
}
