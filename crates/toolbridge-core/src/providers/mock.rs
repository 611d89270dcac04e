//! Scripted model for testing
//!
//! Replays a queue of canned replies without network and records every
//! invocation, so tests can assert on what the model was shown.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::error::{ModelError, ModelResult};
use super::traits::{ModelInvoker, SamplingConfig};
use crate::types::{ConversationTurn, FunctionCall, FunctionDeclaration, ModelResponse, Part};

/// One scripted reply
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// Return these parts
    Parts(Vec<Part>),
    /// Answer with the text payloads of the function responses in the conversation
    EchoToolResults,
    /// Fail with an API error
    Error(String),
    /// Wait before producing the inner reply
    Delay(Duration, Box<ScriptedReply>),
    /// Never complete
    Hang,
}

/// What the model was asked
#[derive(Debug, Clone)]
pub struct RecordedInvocation {
    pub conversation: Vec<ConversationTurn>,
    pub declarations: Vec<FunctionDeclaration>,
    pub sampling: SamplingConfig,
}

/// Model that replays scripted replies in order
pub struct ScriptedModel {
    model_id: String,
    replies: Mutex<VecDeque<ScriptedReply>>,
    invocations: Mutex<Vec<RecordedInvocation>>,
}

impl Default for ScriptedModel {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedModel {
    /// An empty script; invoking it fails
    pub fn new() -> Self {
        Self {
            model_id: "scripted".to_string(),
            replies: Mutex::new(VecDeque::new()),
            invocations: Mutex::new(Vec::new()),
        }
    }

    /// Queue a reply
    pub fn then(self, reply: ScriptedReply) -> Self {
        self.replies.lock().push_back(reply);
        self
    }

    /// Queue a text-only reply
    pub fn then_text(self, text: impl Into<String>) -> Self {
        self.then(ScriptedReply::Parts(vec![Part::text(text)]))
    }

    /// Queue a reply suggesting one function call
    pub fn then_call(self, call: FunctionCall) -> Self {
        self.then(ScriptedReply::Parts(vec![Part::FunctionCall(call)]))
    }

    /// Queue a reply grounded on the tool results it is shown
    pub fn then_echo_tool_results(self) -> Self {
        self.then(ScriptedReply::EchoToolResults)
    }

    /// Queue an API failure
    pub fn then_error(self, message: impl Into<String>) -> Self {
        self.then(ScriptedReply::Error(message.into()))
    }

    /// Queue a reply that never arrives
    pub fn then_hang(self) -> Self {
        self.then(ScriptedReply::Hang)
    }

    /// Invocations received so far, in order
    pub fn invocations(&self) -> Vec<RecordedInvocation> {
        self.invocations.lock().clone()
    }

    pub fn invocation_count(&self) -> usize {
        self.invocations.lock().len()
    }

    /// Replies not yet consumed
    pub fn remaining(&self) -> usize {
        self.replies.lock().len()
    }

    async fn play(
        &self,
        reply: ScriptedReply,
        conversation: &[ConversationTurn],
    ) -> ModelResult<ModelResponse> {
        let mut reply = reply;
        loop {
            match reply {
                ScriptedReply::Parts(parts) => return Ok(ModelResponse::new(parts)),
                ScriptedReply::EchoToolResults => {
                    let texts: Vec<String> = conversation
                        .iter()
                        .flat_map(|turn| turn.parts.iter())
                        .filter_map(Part::as_function_response)
                        .map(|r| match r.text_payload() {
                            Some(text) => text.to_string(),
                            None => serde_json::Value::Object(r.response.clone()).to_string(),
                        })
                        .collect();
                    return Ok(ModelResponse::new(vec![Part::text(format!(
                        "The tool says: {}",
                        texts.join("; ")
                    ))]));
                }
                ScriptedReply::Error(message) => {
                    return Err(ModelError::api(&self.model_id, message))
                }
                ScriptedReply::Delay(delay, inner) => {
                    tokio::time::sleep(delay).await;
                    reply = *inner;
                }
                ScriptedReply::Hang => {
                    std::future::pending::<()>().await;
                }
            }
        }
    }
}

#[async_trait]
impl ModelInvoker for ScriptedModel {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn invoke(
        &self,
        conversation: &[ConversationTurn],
        declarations: &[FunctionDeclaration],
        sampling: &SamplingConfig,
    ) -> ModelResult<ModelResponse> {
        self.invocations.lock().push(RecordedInvocation {
            conversation: conversation.to_vec(),
            declarations: declarations.to_vec(),
            sampling: sampling.clone(),
        });

        let reply = self.replies.lock().pop_front();
        let Some(reply) = reply else {
            return Err(ModelError::invalid_response(&self.model_id, "script exhausted"));
        };
        self.play(reply, conversation).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FunctionResponse;
    use serde_json::Map;

    #[tokio::test]
    async fn test_replies_in_order_and_records() {
        let model = ScriptedModel::new()
            .then_call(FunctionCall::new("cityTime", Map::new()))
            .then_text("done");

        let conversation = vec![ConversationTurn::user_text("hi")];
        let sampling = SamplingConfig::default();
        let first = model.invoke(&conversation, &[], &sampling).await.unwrap();
        assert!(first.has_function_call());

        let second = model.invoke(&conversation, &[], &sampling).await.unwrap();
        assert_eq!(second.text(), "done");

        assert_eq!(model.invocation_count(), 2);
        assert_eq!(model.invocations()[0].conversation, conversation);
        assert_eq!(model.remaining(), 0);
    }

    #[tokio::test]
    async fn test_echo_tool_results() {
        let call = FunctionCall::new("cityTime", Map::new());
        let conversation = vec![ConversationTurn::new(
            crate::types::Role::Unspecified,
            vec![Part::FunctionResponse(FunctionResponse::text(&call, "3:00 PM in New York"))],
        )];

        let model = ScriptedModel::new().then_echo_tool_results();
        let response = model
            .invoke(&conversation, &[], &SamplingConfig::default())
            .await
            .unwrap();
        assert!(response.text().contains("3:00 PM in New York"));
    }

    #[tokio::test]
    async fn test_delayed_reply() {
        let inner = ScriptedReply::Parts(vec![Part::text("after a pause")]);
        let model = ScriptedModel::new()
            .then(ScriptedReply::Delay(Duration::from_millis(30), Box::new(inner)));

        let started = tokio::time::Instant::now();
        let response = model.invoke(&[], &[], &SamplingConfig::default()).await.unwrap();

        assert_eq!(response.text(), "after a pause");
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[tokio::test]
    async fn test_error_and_exhausted() {
        let model = ScriptedModel::new().then_error("quota exceeded");

        let err = model.invoke(&[], &[], &SamplingConfig::default()).await.unwrap_err();
        assert!(matches!(err, ModelError::Api { .. }));

        let err = model.invoke(&[], &[], &SamplingConfig::default()).await.unwrap_err();
        assert!(matches!(err, ModelError::InvalidResponse { .. }));
    }
}
