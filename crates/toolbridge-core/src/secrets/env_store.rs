//! Environment variable secret store

use std::collections::HashMap;
use std::env;

use once_cell::sync::Lazy;

use super::traits::SecretStore;

/// Mapping from provider names to environment variable names
static ENV_VAR_MAP: Lazy<HashMap<&'static str, Vec<&'static str>>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("gemini", vec!["GEMINI_API_KEY", "GOOGLE_API_KEY"]);
    m.insert("google", vec!["GEMINI_API_KEY", "GOOGLE_API_KEY"]);
    m.insert("openai", vec!["OPENAI_API_KEY"]);
    m.insert("anthropic", vec!["ANTHROPIC_API_KEY"]);
    m.insert("ollama", vec![]); // Ollama doesn't need an API key
    m
});

/// Secret store that reads from environment variables
///
/// Read-only. Variables loaded from a `.env` file by the CLI are visible here.
///
/// # Provider Mapping
///
/// - `gemini` → `GEMINI_API_KEY` or `GOOGLE_API_KEY`
/// - `openai` → `OPENAI_API_KEY`
/// - `anthropic` → `ANTHROPIC_API_KEY`
/// - anything else → `<PROVIDER>_API_KEY`
///
/// Environment variables can also be read directly by their full name.
#[derive(Debug, Default)]
pub struct EnvSecretStore {
    _private: (),
}

impl EnvSecretStore {
    /// Create a new environment variable secret store
    pub fn new() -> Self {
        Self { _private: () }
    }

    fn read(name: &str) -> Option<String> {
        env::var(name).ok().filter(|v| !v.is_empty())
    }
}

impl SecretStore for EnvSecretStore {
    fn name(&self) -> &str {
        "env"
    }

    fn get(&self, key: &str) -> Option<String> {
        self.candidates(key).iter().find_map(|name| Self::read(name))
    }

    fn candidates(&self, key: &str) -> Vec<String> {
        let mut names = vec![key.to_string()];
        if let Some(mapped) = ENV_VAR_MAP.get(key.to_lowercase().as_str()) {
            names.extend(mapped.iter().map(|s| s.to_string()));
        }
        let auto_key = format!("{}_API_KEY", key.to_uppercase());
        if !names.contains(&auto_key) {
            names.push(auto_key);
        }
        names
    }
}
