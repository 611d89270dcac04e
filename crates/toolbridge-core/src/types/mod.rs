//! Core types shared across components
//!
//! This module contains the conversation, tool and cancellation types used by
//! the registry client, the model invoker and the orchestrator.

mod conversation;
mod tool;
mod cancellation;

pub use conversation::{ConversationTurn, FunctionCall, FunctionResponse, ModelResponse, Part, Role};
pub use tool::{ContentItem, FunctionDeclaration, ToolDescriptor};
pub use cancellation::{CancellationToken, Interrupted};
