//! Tool dispatch
//!
//! Routes function calls suggested by the model to the tool registry and turns
//! the tool's result into a function response for the next model turn.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logging::Logger;
use crate::mcp::{RegistryError, ToolFailureKind, ToolRegistry};
use crate::types::{CancellationToken, ContentItem, FunctionCall, FunctionResponse, ModelResponse};

/// Default deadline for a single tool call
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Which function calls of a model response get dispatched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallPolicy {
    /// Dispatch the first function call, ignore the rest
    #[default]
    FirstWins,
    /// Dispatch every function call in response order, then fold all results
    DispatchAll,
}

/// Errors from dispatching a function call
#[derive(Error, Debug, Clone)]
pub enum DispatchError {
    /// The model named a tool that was not declared in this session
    #[error("Unknown tool '{0}': it was not offered to the model")]
    UnknownTool(String),

    /// The registry failed the call
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The first content item was not text, or there was none
    #[error("Tool '{tool}' returned unsupported content: expected text, found {found}")]
    UnsupportedContent { tool: String, found: String },
}

impl DispatchError {
    /// Stable snake_case label, used in error responses sent to the model
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::UnknownTool(_) => "unknown_tool",
            DispatchError::UnsupportedContent { .. } => "unsupported_content",
            DispatchError::Registry(err) => match err {
                RegistryError::ToolNotFound { .. } => "tool_not_found",
                RegistryError::ToolExecution { kind, .. } => match kind {
                    ToolFailureKind::Failed => "tool_execution_failed",
                    ToolFailureKind::Timeout => "timeout",
                    ToolFailureKind::Cancelled => "cancelled",
                },
                RegistryError::Timeout { .. } => "timeout",
                RegistryError::Cancelled { .. } => "cancelled",
                RegistryError::Connection(_) => "connection",
                RegistryError::Protocol(_) | RegistryError::InvalidEndpoint(_) => "protocol",
            },
        }
    }

    /// Whether the run was cancelled while dispatching
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            DispatchError::Registry(RegistryError::Cancelled { .. })
                | DispatchError::Registry(RegistryError::ToolExecution {
                    kind: ToolFailureKind::Cancelled,
                    ..
                })
        )
    }
}

pub type DispatchResult<T> = Result<T, DispatchError>;

impl FunctionResponse {
    /// Error-indicator response for a failed dispatch
    pub fn from_dispatch_error(call: &FunctionCall, error: &DispatchError) -> Self {
        FunctionResponse::failure(call, error.kind(), error.to_string())
    }
}

/// Pick the calls to dispatch from a model response
pub fn select_calls<'r>(
    response: &'r ModelResponse,
    policy: CallPolicy,
    logger: &dyn Logger,
) -> Vec<&'r FunctionCall> {
    let calls = response.function_calls();
    match policy {
        CallPolicy::DispatchAll => calls,
        CallPolicy::FirstWins => {
            if calls.len() > 1 {
                let ignored: Vec<&str> = calls[1..].iter().map(|c| c.name.as_str()).collect();
                logger.warn(&format!(
                    "[ToolDispatcher] Model suggested {} calls; dispatching '{}' and ignoring {:?}",
                    calls.len(),
                    calls[0].name,
                    ignored
                ));
            }
            calls.into_iter().take(1).collect()
        }
    }
}

/// Routes function calls to a registry session
pub struct ToolDispatcher<'a> {
    registry: &'a dyn ToolRegistry,
    known_tools: HashSet<String>,
    call_timeout: Duration,
    cancel: CancellationToken,
    logger: Arc<dyn Logger>,
}

impl<'a> ToolDispatcher<'a> {
    /// Create a dispatcher for the tools declared in this session
    pub fn new(
        registry: &'a dyn ToolRegistry,
        known_tools: impl IntoIterator<Item = String>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            registry,
            known_tools: known_tools.into_iter().collect(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
            cancel: CancellationToken::new(),
            logger,
        }
    }

    /// Set the per-call deadline and the run's cancellation token
    pub fn with_deadline(mut self, call_timeout: Duration, cancel: CancellationToken) -> Self {
        self.call_timeout = call_timeout;
        self.cancel = cancel;
        self
    }

    /// Whether `name` was declared in this session
    pub fn is_known(&self, name: &str) -> bool {
        self.known_tools.contains(name)
    }

    /// Dispatch one function call
    pub async fn dispatch(&self, call: &FunctionCall) -> DispatchResult<FunctionResponse> {
        if !self.is_known(&call.name) {
            self.logger.warn(&format!(
                "[ToolDispatcher] Model requested undeclared tool '{}'",
                call.name
            ));
            return Err(DispatchError::UnknownTool(call.name.clone()));
        }

        self.logger.info(&format!(
            "[ToolDispatcher] Calling '{}' with args: {}",
            call.name,
            serde_json::Value::Object(call.args.clone())
        ));

        // No retry: the provider may already have executed a timed-out call
        let items = self
            .cancel
            .run_until(self.call_timeout, self.registry.call_tool(&call.name, call.args.clone()))
            .await
            .map_err(|reason| RegistryError::tool_interrupted(&call.name, reason))??;

        let text = first_text(&call.name, &items)?;
        self.logger.debug(&format!(
            "[ToolDispatcher] '{}' returned {} chars",
            call.name,
            text.len()
        ));

        Ok(FunctionResponse::text(call, text))
    }
}

fn first_text(tool: &str, items: &[ContentItem]) -> DispatchResult<String> {
    match items.first() {
        Some(ContentItem::Text { text }) => Ok(text.clone()),
        Some(ContentItem::Other { kind, .. }) => Err(DispatchError::UnsupportedContent {
            tool: tool.to_string(),
            found: kind.clone(),
        }),
        None => Err(DispatchError::UnsupportedContent {
            tool: tool.to_string(),
            found: "empty".to_string(),
        }),
    }
}
