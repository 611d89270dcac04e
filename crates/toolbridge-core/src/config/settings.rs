//! Bridge configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::mcp::{RegistryEndpoint, RegistryError, DEFAULT_CLIENT_NAME};
use crate::orchestrator::{OrchestratorOptions, StageTimeouts, ToolErrorMode};
use crate::providers::SamplingConfig;
use crate::secrets::infer_provider;
use crate::tools::{CallPolicy, ToolFilter};

use super::error::{ConfigError, ConfigResult};

pub const ENV_REGISTRY_URL: &str = "TOOLBRIDGE_REGISTRY_URL";
pub const ENV_MODEL: &str = "TOOLBRIDGE_MODEL";
pub const ENV_PROMPT: &str = "TOOLBRIDGE_PROMPT";
pub const ENV_API_BASE: &str = "TOOLBRIDGE_API_BASE";

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Tool registry connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrySettings {
    /// `http(s)://host:port` or `unix:///path/to.sock`
    pub endpoint: Option<String>,
    /// Implementation name announced to the server
    pub client_name: String,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            client_name: DEFAULT_CLIENT_NAME.to_string(),
        }
    }
}

/// Model selection and sampling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub id: String,
    /// Provider used for the API key lookup; inferred from `id` when unset
    pub provider: Option<String>,
    pub api_base: Option<String>,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            id: DEFAULT_MODEL.to_string(),
            provider: None,
            api_base: None,
            temperature: 0.0,
            max_tokens: None,
        }
    }
}

impl ModelSettings {
    pub fn provider(&self) -> &str {
        self.provider
            .as_deref()
            .unwrap_or_else(|| infer_provider(&self.id))
    }

    pub fn sampling(&self) -> SamplingConfig {
        SamplingConfig {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

/// Stage deadlines in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutSettings {
    pub connect_ms: u64,
    pub list_tools_ms: u64,
    pub call_tool_ms: u64,
    pub model_ms: u64,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            connect_ms: 10_000,
            list_tools_ms: 10_000,
            call_tool_ms: 30_000,
            model_ms: 60_000,
        }
    }
}

impl From<TimeoutSettings> for StageTimeouts {
    fn from(t: TimeoutSettings) -> Self {
        StageTimeouts {
            connect: Duration::from_millis(t.connect_ms),
            list_tools: Duration::from_millis(t.list_tools_ms),
            call_tool: Duration::from_millis(t.call_tool_ms),
            model: Duration::from_millis(t.model_ms),
        }
    }
}

/// Complete configuration for a bridge
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub registry: RegistrySettings,
    pub model: ModelSettings,
    /// Prompt used when none is given on the command line
    pub prompt: Option<String>,
    pub timeouts: TimeoutSettings,
    pub tools: ToolFilter,
    pub call_policy: CallPolicy,
    pub on_tool_error: ToolErrorMode,
}

impl BridgeConfig {
    /// Apply `TOOLBRIDGE_*` environment overrides
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from `lookup`; empty values are ignored
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_REGISTRY_URL) {
            self.registry.endpoint = Some(url);
        }
        if let Some(model) = get(ENV_MODEL) {
            self.model.id = model;
        }
        if let Some(prompt) = get(ENV_PROMPT) {
            self.prompt = Some(prompt);
        }
        if let Some(base) = get(ENV_API_BASE) {
            self.model.api_base = Some(base);
        }
    }

    /// The parsed registry endpoint
    pub fn endpoint(&self) -> ConfigResult<RegistryEndpoint> {
        let raw = self
            .registry
            .endpoint
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .ok_or(ConfigError::MissingEndpoint)?;

        RegistryEndpoint::parse(raw).map_err(|e| match e {
            RegistryError::InvalidEndpoint(message) => ConfigError::InvalidEndpoint(message),
            other => ConfigError::InvalidEndpoint(other.to_string()),
        })
    }

    /// Check the configuration before anything connects
    pub fn validate(&self) -> ConfigResult<()> {
        self.endpoint()?;

        if self.model.id.trim().is_empty() {
            return Err(ConfigError::invalid("model.id", "must not be empty"));
        }

        let temperature = self.model.temperature;
        if !temperature.is_finite() || !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigError::invalid(
                "model.temperature",
                format!("{} is outside 0.0 - 2.0", temperature),
            ));
        }

        let t = &self.timeouts;
        for (field, value) in [
            ("timeouts.connect_ms", t.connect_ms),
            ("timeouts.list_tools_ms", t.list_tools_ms),
            ("timeouts.call_tool_ms", t.call_tool_ms),
            ("timeouts.model_ms", t.model_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::invalid(field, "must be greater than zero"));
            }
        }

        Ok(())
    }

    /// Options for an `Orchestrator` built from this configuration
    pub fn orchestrator_options(&self) -> OrchestratorOptions {
        OrchestratorOptions::new()
            .with_sampling(self.model.sampling())
            .with_timeouts(self.timeouts.into())
            .with_filter(self.tools.clone())
            .with_call_policy(self.call_policy)
            .with_tool_error_mode(self.on_tool_error)
    }
}
