//! Model invoker trait definition

use async_trait::async_trait;

use crate::types::{ConversationTurn, FunctionDeclaration, ModelResponse};

use super::error::ModelResult;

/// Sampling parameters for a model invocation
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingConfig {
    /// Temperature for response generation (0.0 - 2.0)
    pub temperature: f32,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            max_tokens: None,
        }
    }
}

impl SamplingConfig {
    /// Set temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set max tokens
    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }
}

/// A function-calling capable model
#[async_trait]
pub trait ModelInvoker: Send + Sync {
    /// Model identifier, for logs and errors
    fn model_id(&self) -> &str;

    /// Generate a response for the conversation, offering `declarations` as callable functions
    async fn invoke(
        &self,
        conversation: &[ConversationTurn],
        declarations: &[FunctionDeclaration],
        sampling: &SamplingConfig,
    ) -> ModelResult<ModelResponse>;
}
