//! Secret lookup for model API credentials
//!
//! API keys are never embedded in configuration literals. They are looked up
//! by provider name through a `SecretStore`.

mod traits;
mod env_store;
mod memory_store;

pub use traits::{SecretStore, SecretStoreError, SecretStoreResult};
pub use env_store::EnvSecretStore;
pub use memory_store::MemorySecretStore;

/// Infer the provider name from a model identifier
///
/// `gemini/gemini-2.5-flash` style prefixes win; otherwise well-known model
/// families are recognised. Unknown models fall back to `gemini`.
pub fn infer_provider(model_id: &str) -> &str {
    if let Some((provider, _)) = model_id.split_once('/') {
        return provider;
    }
    let lower = model_id.to_lowercase();
    if lower.starts_with("gpt-") || lower.starts_with("o1") || lower.starts_with("o3") {
        "openai"
    } else if lower.starts_with("claude-") {
        "anthropic"
    } else {
        "gemini"
    }
}

/// Look up the API key for `provider`
pub fn resolve_api_key(store: &dyn SecretStore, provider: &str) -> SecretStoreResult<String> {
    store.get(provider).ok_or_else(|| SecretStoreError::NotFound {
        provider: provider.to_string(),
        tried: store.candidates(provider).join(", "),
    })
}
