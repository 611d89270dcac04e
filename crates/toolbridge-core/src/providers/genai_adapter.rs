//! Adapter between conversation types and genai types
//!
//! Function-response turns are sent as genai tool responses keyed by the
//! originating call id, falling back to the function name for providers
//! (Gemini) that do not issue ids.

use genai::chat::{
    ChatMessage as GenaiMessage, ChatOptions as GenaiOptions, ChatResponse,
    ContentPart as GenaiPart, Tool as GenaiTool, ToolCall as GenaiToolCall,
    ToolResponse as GenaiToolResponse,
};
use genai::resolver::{AuthData, AuthResolver, Endpoint, ServiceTargetResolver};
use genai::{Client, ModelIden, ServiceTarget};
use serde_json::{json, Map, Value};

use crate::types::{
    ConversationTurn, FunctionCall, FunctionDeclaration, FunctionResponse, ModelResponse, Part,
    Role,
};

use super::error::{ModelError, ModelResult};
use super::traits::SamplingConfig;

// ============================================================================
// Conversation -> genai
// ============================================================================

fn text_message(role: Role, text: String) -> GenaiMessage {
    match role {
        Role::Model => GenaiMessage::assistant(text),
        Role::User | Role::Unspecified => GenaiMessage::user(text),
    }
}

/// Convert a function call to a genai tool call
pub fn to_genai_tool_call(call: &FunctionCall, model: &str) -> ModelResult<GenaiToolCall> {
    let call_id = call.id.clone().unwrap_or_else(|| call.name.clone());
    serde_json::from_value(json!({
        "call_id": call_id,
        "fn_name": call.name,
        "fn_arguments": Value::Object(call.args.clone()),
    }))
    .map_err(|e| {
        ModelError::invalid_response(model, format!("cannot encode call '{}': {}", call.name, e))
    })
}

/// Convert a function response to a genai tool response
pub fn to_genai_tool_response(response: &FunctionResponse) -> GenaiToolResponse {
    let call_id = response.call_id.clone().unwrap_or_else(|| response.name.clone());
    GenaiToolResponse::new(call_id, Value::Object(response.response.clone()).to_string())
}

/// Convert conversation turns to genai messages, preserving part order
///
/// Consecutive text parts of a turn become one message, consecutive calls one
/// assistant tool-call message, and every response its own tool message.
pub fn to_genai_messages(
    turns: &[ConversationTurn],
    model: &str,
) -> ModelResult<Vec<GenaiMessage>> {
    let mut messages = Vec::new();

    for turn in turns {
        let mut texts: Vec<&str> = Vec::new();
        let mut calls: Vec<GenaiToolCall> = Vec::new();

        for part in &turn.parts {
            if !matches!(part, Part::Text(_)) && !texts.is_empty() {
                messages.push(text_message(turn.role, texts.join("\n")));
                texts.clear();
            }
            if !matches!(part, Part::FunctionCall(_)) && !calls.is_empty() {
                messages.push(GenaiMessage::from(std::mem::take(&mut calls)));
            }

            match part {
                Part::Text(text) => texts.push(text),
                Part::FunctionCall(call) => calls.push(to_genai_tool_call(call, model)?),
                Part::FunctionResponse(response) => {
                    messages.push(GenaiMessage::from(to_genai_tool_response(response)))
                }
            }
        }

        if !texts.is_empty() {
            messages.push(text_message(turn.role, texts.join("\n")));
        }
        if !calls.is_empty() {
            messages.push(GenaiMessage::from(calls));
        }
    }

    Ok(messages)
}

/// Convert a function declaration to a genai tool
///
/// genai tools carry no response schema; it stays on the declaration.
pub fn to_genai_tool(declaration: &FunctionDeclaration) -> GenaiTool {
    GenaiTool::new(declaration.name.clone())
        .with_description(declaration.description.clone())
        .with_schema(declaration.parameters_schema.clone())
}

pub fn to_genai_tools(declarations: &[FunctionDeclaration]) -> Vec<GenaiTool> {
    declarations.iter().map(to_genai_tool).collect()
}

/// Convert sampling parameters to genai chat options
pub fn to_genai_options(sampling: &SamplingConfig) -> GenaiOptions {
    let mut options = GenaiOptions::default().with_temperature(sampling.temperature as f64);

    if let Some(max_tokens) = sampling.max_tokens {
        options = options.with_max_tokens(max_tokens);
    }

    options
}

// ============================================================================
// genai -> Conversation
// ============================================================================

/// Convert a genai tool call to a function call
pub fn from_genai_tool_call(tc: GenaiToolCall, model: &str) -> ModelResult<FunctionCall> {
    let args = match tc.fn_arguments {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        // Some OpenAI-compatible servers send the arguments JSON-encoded
        Value::String(raw) => match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => map,
            _ => {
                return Err(ModelError::invalid_response(
                    model,
                    format!("arguments for '{}' are not a JSON object", tc.fn_name),
                ))
            }
        },
        other => {
            return Err(ModelError::invalid_response(
                model,
                format!("arguments for '{}' are not a JSON object: {}", tc.fn_name, other),
            ))
        }
    };

    let mut call = FunctionCall::new(tc.fn_name, args);
    if !tc.call_id.is_empty() {
        call = call.with_id(tc.call_id);
    }
    Ok(call)
}

/// Convert a genai chat response to a model response
pub fn from_genai_response(response: ChatResponse, model: &str) -> ModelResult<ModelResponse> {
    let mut parts = Vec::new();

    for part in response.content.into_parts() {
        match part {
            GenaiPart::Text(text) => parts.push(Part::Text(text)),
            GenaiPart::ToolCall(tc) => {
                parts.push(Part::FunctionCall(from_genai_tool_call(tc, model)?))
            }
            // Reasoning, thought signatures and binary parts are not part of the exchange
            _ => {}
        }
    }

    Ok(ModelResponse::new(parts))
}

// ============================================================================
// Client Creation
// ============================================================================

/// Create a genai Client with explicit auth and an optional endpoint override
///
/// Without an explicit key the resolver returns `None` and genai falls back to
/// its own environment lookup, which is what keyless local servers need.
pub fn create_client(api_key: Option<String>, api_base: Option<String>) -> Client {
    let auth_resolver = AuthResolver::from_resolver_fn(
        move |_model_iden: ModelIden| -> Result<Option<AuthData>, genai::resolver::Error> {
            Ok(api_key.clone().map(AuthData::from_single))
        },
    );

    let target_resolver = ServiceTargetResolver::from_resolver_fn(
        move |target: ServiceTarget| -> Result<ServiceTarget, genai::resolver::Error> {
            let Some(base) = &api_base else {
                return Ok(target);
            };

            Ok(ServiceTarget {
                endpoint: Endpoint::from_owned(base.clone()),
                auth: target.auth,
                model: target.model,
            })
        },
    );

    Client::builder()
        .with_auth_resolver(auth_resolver)
        .with_service_target_resolver(target_resolver)
        .build()
}
