//! Configuration
//!
//! `BridgeConfig` is loaded from YAML (`ConfigFile`), then overridden from
//! `TOOLBRIDGE_*` environment variables and validated before use.

mod error;
mod file;
mod settings;

pub use error::{ConfigError, ConfigResult};
pub use file::ConfigFile;
pub use settings::{
    BridgeConfig, ModelSettings, RegistrySettings, TimeoutSettings, DEFAULT_MODEL, ENV_API_BASE,
    ENV_MODEL, ENV_PROMPT, ENV_REGISTRY_URL,
};
