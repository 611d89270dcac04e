//! Model invocation error types

use std::time::Duration;

use thiserror::Error;

use crate::types::Interrupted;

/// Errors that can occur while invoking the model
#[derive(Error, Debug)]
pub enum ModelError {
    /// Missing API key
    #[error("API key is required for {provider}")]
    MissingApiKey { provider: String },

    /// Transport, auth or quota failure reported by the model API
    #[error("{model} API error: {message}")]
    Api { model: String, message: String },

    /// The response could not be mapped to conversation parts
    #[error("Invalid response from {model}: {message}")]
    InvalidResponse { model: String, message: String },

    /// The model call hit its deadline
    #[error("Model call timed out after {0:?}")]
    Timeout(Duration),

    /// Request was cancelled
    #[error("Request cancelled")]
    Cancelled,
}

impl ModelError {
    /// Create an API error
    pub fn api(model: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            model: model.into(),
            message: message.into(),
        }
    }

    /// Create an invalid response error
    pub fn invalid_response(model: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            model: model.into(),
            message: message.into(),
        }
    }
}

impl From<Interrupted> for ModelError {
    fn from(reason: Interrupted) -> Self {
        match reason {
            Interrupted::TimedOut(after) => ModelError::Timeout(after),
            Interrupted::Cancelled => ModelError::Cancelled,
        }
    }
}

pub type ModelResult<T> = Result<T, ModelError>;
