//! Core traits and types for secret lookup

use thiserror::Error;

/// Errors that can occur during secret lookup
#[derive(Error, Debug)]
pub enum SecretStoreError {
    #[error("No API key found for provider '{provider}' (tried: {tried})")]
    NotFound { provider: String, tried: String },
}

pub type SecretStoreResult<T> = Result<T, SecretStoreError>;

/// Trait for secret storage implementations
///
/// Implementations:
/// - Environment variables (`EnvSecretStore`)
/// - In-memory for testing (`MemorySecretStore`)
pub trait SecretStore: Send + Sync {
    /// Human-readable name of this store
    fn name(&self) -> &str;

    /// Retrieve a secret by key
    ///
    /// The key can be:
    /// - A provider name (e.g., "gemini") which gets mapped to the appropriate env var
    /// - A direct key (e.g., "GEMINI_API_KEY")
    fn get(&self, key: &str) -> Option<String>;

    /// Check if a secret exists
    fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Keys this store would consult for `key`, for error messages
    fn candidates(&self, key: &str) -> Vec<String> {
        vec![key.to_string()]
    }
}
