//! Tool registry client (MCP)
//!
//! Uses the official rmcp SDK to connect to MCP servers.
//! Supports HTTP (Streamable HTTP) and Unix socket transports.
//!
//! # Example
//!
//! ```rust,ignore
//! use toolbridge_core::mcp::{McpConnector, RegistryConnector, RegistryEndpoint};
//!
//! let endpoint = RegistryEndpoint::parse("http://localhost:8000")?;
//! let connector = McpConnector::new(endpoint, logger);
//!
//! let session = connector.connect().await?;
//! let tools = session.list_tools().await?;
//! let items = session.call_tool("cityTime", args).await?;
//! session.close().await?;
//! ```

mod client;
mod endpoint;
mod error;
mod mock;
mod registry;

pub use client::{McpClient, McpConnector, DEFAULT_CLIENT_NAME};
pub use endpoint::RegistryEndpoint;
pub use error::{RegistryError, RegistryResult, ToolFailureKind};
pub use mock::{MockBehavior, MockConnector, MockToolRegistry};
pub use registry::{RegistryConnector, ToolRegistry};
