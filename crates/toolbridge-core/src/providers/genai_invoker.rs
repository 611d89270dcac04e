//! GenaiInvoker - function-calling model invocation via the genai crate

use async_trait::async_trait;
use std::sync::Arc;

use genai::chat::ChatRequest;
use genai::Client;

use crate::logging::Logger;
use crate::types::{ConversationTurn, FunctionDeclaration, ModelResponse};

use super::error::{ModelError, ModelResult};
use super::genai_adapter::{
    create_client, from_genai_response, to_genai_messages, to_genai_options, to_genai_tools,
};
use super::traits::{ModelInvoker, SamplingConfig};

/// Model invoker backed by any genai-supported API
pub struct GenaiInvoker {
    /// Model identifier as configured, possibly provider-prefixed
    model_id: String,
    client: Client,
    logger: Arc<dyn Logger>,
}

impl GenaiInvoker {
    /// Create an invoker for `model_id`
    pub fn new(
        model_id: impl Into<String>,
        api_key: Option<String>,
        api_base: Option<String>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            model_id: model_id.into(),
            client: create_client(api_key, api_base),
            logger,
        }
    }

    /// Extract model name from a model string
    /// (e.g., "gemini/gemini-2.5-flash" -> "gemini-2.5-flash")
    pub fn extract_model_name(model: &str) -> &str {
        model.split_once('/').map(|(_, name)| name).unwrap_or(model)
    }
}

#[async_trait]
impl ModelInvoker for GenaiInvoker {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn invoke(
        &self,
        conversation: &[ConversationTurn],
        declarations: &[FunctionDeclaration],
        sampling: &SamplingConfig,
    ) -> ModelResult<ModelResponse> {
        let model_name = Self::extract_model_name(&self.model_id);

        self.logger.info(&format!(
            "[GenaiInvoker] invoke: model={}, turns={}, declarations={}",
            model_name,
            conversation.len(),
            declarations.len()
        ));

        let mut chat_req = ChatRequest::new(to_genai_messages(conversation, &self.model_id)?);
        if !declarations.is_empty() {
            chat_req = chat_req.with_tools(to_genai_tools(declarations));
        }

        let response = self
            .client
            .exec_chat(model_name, chat_req, Some(&to_genai_options(sampling)))
            .await
            .map_err(|e| {
                self.logger.error(&format!("[GenaiInvoker] API error: {}", e));
                ModelError::api(&self.model_id, e.to_string())
            })?;

        let response = from_genai_response(response, &self.model_id)?;
        self.logger.debug(&format!(
            "[GenaiInvoker] Response: {} parts, {} function calls",
            response.parts.len(),
            response.function_calls().len()
        ));

        Ok(response)
    }
}
