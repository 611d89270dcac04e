//! Conversation types exchanged with the model

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Attribution of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
    Unspecified,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Model => write!(f, "model"),
            Role::Unspecified => write!(f, "unspecified"),
        }
    }
}

/// A function call suggested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Call identifier assigned by the model API, when it has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Name of the declared function
    pub name: String,
    /// Argument values
    #[serde(default)]
    pub args: Map<String, Value>,
}

impl FunctionCall {
    /// Create a new function call without a call id
    pub fn new(name: impl Into<String>, args: Map<String, Value>) -> Self {
        Self {
            id: None,
            name: name.into(),
            args,
        }
    }

    /// Set the call id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Get an argument as a string
    pub fn arg_str(&self, key: &str) -> Option<&str> {
        self.args.get(key).and_then(|v| v.as_str())
    }
}

/// Result of a function call, handed back to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionResponse {
    /// Id of the call this responds to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,
    /// Name of the function that produced this response
    pub name: String,
    /// Response payload
    pub response: Map<String, Value>,
}

impl FunctionResponse {
    /// Successful response carrying the tool's text output
    pub fn text(call: &FunctionCall, text: impl Into<String>) -> Self {
        let mut response = Map::new();
        response.insert("text".to_string(), Value::String(text.into()));
        Self {
            call_id: call.id.clone(),
            name: call.name.clone(),
            response,
        }
    }

    /// Failed response with an explicit error indicator
    pub fn failure(call: &FunctionCall, kind: &str, message: impl Into<String>) -> Self {
        let mut error = Map::new();
        error.insert("kind".to_string(), Value::String(kind.to_string()));
        error.insert("message".to_string(), Value::String(message.into()));

        let mut response = Map::new();
        response.insert("error".to_string(), Value::Object(error));
        Self {
            call_id: call.id.clone(),
            name: call.name.clone(),
            response,
        }
    }

    /// Whether this response carries an error indicator
    pub fn is_error(&self) -> bool {
        self.response.contains_key("error")
    }

    /// The text payload of a successful response
    pub fn text_payload(&self) -> Option<&str> {
        self.response.get("text").and_then(|v| v.as_str())
    }
}

/// One part of a conversation turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Part {
    Text(String),
    FunctionCall(FunctionCall),
    FunctionResponse(FunctionResponse),
}

impl Part {
    /// Create a text part
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text(text.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_function_call(&self) -> Option<&FunctionCall> {
        match self {
            Part::FunctionCall(call) => Some(call),
            _ => None,
        }
    }

    pub fn as_function_response(&self) -> Option<&FunctionResponse> {
        match self {
            Part::FunctionResponse(response) => Some(response),
            _ => None,
        }
    }
}

/// One attributed unit of dialogue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl ConversationTurn {
    pub fn new(role: Role, parts: Vec<Part>) -> Self {
        Self { role, parts }
    }

    /// A user turn with a single text part
    pub fn user_text(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![Part::text(text)])
    }
}

/// Response of one model invocation (first candidate)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelResponse {
    /// Ordered parts of the first candidate
    pub parts: Vec<Part>,
}

impl ModelResponse {
    pub fn new(parts: Vec<Part>) -> Self {
        Self { parts }
    }

    /// Concatenation of all text parts
    pub fn text(&self) -> String {
        self.parts.iter().filter_map(Part::as_text).collect()
    }

    /// All function call parts, in response order
    pub fn function_calls(&self) -> Vec<&FunctionCall> {
        self.parts.iter().filter_map(Part::as_function_call).collect()
    }

    pub fn has_function_call(&self) -> bool {
        self.parts.iter().any(|p| p.as_function_call().is_some())
    }
}
