//! Tool and function declaration types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tool as advertised by the tool provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Tool name
    pub name: String,
    /// Description of what the tool does
    pub description: String,
    /// JSON Schema for the input arguments
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
    /// JSON Schema for the structured output, if the provider declares one
    #[serde(rename = "outputSchema", default, skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Value>,
}

impl ToolDescriptor {
    /// Create a descriptor with an empty object input schema
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: Value::Object(Default::default()),
            output_schema: None,
        }
    }

    /// Set the input schema
    pub fn with_input_schema(mut self, schema: Value) -> Self {
        self.input_schema = schema;
        self
    }

    /// Set the output schema
    pub fn with_output_schema(mut self, schema: Value) -> Self {
        self.output_schema = Some(schema);
        self
    }
}

/// Model-facing description of a callable tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDeclaration {
    /// Function name, unique within one model invocation
    pub name: String,
    /// Description shown to the model
    pub description: String,
    /// JSON Schema of the parameters
    #[serde(rename = "parametersJsonSchema")]
    pub parameters_schema: Value,
    /// JSON Schema of the response
    #[serde(rename = "responseJsonSchema", default, skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Value>,
}

/// One item of a tool call result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentItem {
    /// Text content
    Text {
        text: String,
    },
    /// Any non-text content (image, audio, embedded resource, ...)
    Other {
        kind: String,
        payload: Value,
    },
}

impl ContentItem {
    /// Create a text item
    pub fn text(text: impl Into<String>) -> Self {
        ContentItem::Text { text: text.into() }
    }

    /// Create a non-text item
    pub fn other(kind: impl Into<String>, payload: Value) -> Self {
        ContentItem::Other {
            kind: kind.into(),
            payload,
        }
    }

    /// Kind label ("text" for text items)
    pub fn kind(&self) -> &str {
        match self {
            ContentItem::Text { .. } => "text",
            ContentItem::Other { kind, .. } => kind,
        }
    }

    /// Get the text if this is a text item
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentItem::Text { text } => Some(text),
            ContentItem::Other { .. } => None,
        }
    }
}
