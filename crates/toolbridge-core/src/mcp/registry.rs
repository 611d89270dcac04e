//! Tool registry traits
//!
//! `RegistryConnector` opens a session; `ToolRegistry` is the session.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::types::{ContentItem, ToolDescriptor};

use super::error::RegistryResult;

/// A live session with a tool provider
#[async_trait]
pub trait ToolRegistry: Send + Sync {
    /// List every tool the provider exposes, in provider order
    async fn list_tools(&self) -> RegistryResult<Vec<ToolDescriptor>>;

    /// Execute a named tool
    async fn call_tool(
        &self,
        name: &str,
        args: Map<String, Value>,
    ) -> RegistryResult<Vec<ContentItem>>;

    /// Release the session. Calling it again is a no-op.
    async fn close(&self) -> RegistryResult<()>;
}

/// Opens sessions with a tool provider
#[async_trait]
pub trait RegistryConnector: Send + Sync {
    /// Human-readable target, for logs
    fn target(&self) -> String;

    /// Connect and complete the protocol handshake
    async fn connect(&self) -> RegistryResult<Box<dyn ToolRegistry>>;
}
