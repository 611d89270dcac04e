//! MCP client using the official rmcp SDK
//!
//! Connects to MCP servers over HTTP (Streamable HTTP) or a Unix socket.

#[cfg(unix)]
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rmcp::{
    ServiceError, ServiceExt,
    model::{
        CallToolRequestParams, ClientCapabilities, ClientInfo, Content, ErrorCode, Implementation,
        RawContent, Tool,
    },
    service::{Peer, RunningService},
    RoleClient,
};
use serde_json::{Map, Value};

#[cfg(unix)]
use tokio::net::UnixStream;

use crate::logging::Logger;
use crate::types::{ContentItem, ToolDescriptor};

use super::endpoint::RegistryEndpoint;
use super::error::{RegistryError, RegistryResult};
use super::registry::{RegistryConnector, ToolRegistry};

/// Default implementation name announced during the handshake
pub const DEFAULT_CLIENT_NAME: &str = "toolbridge";

impl From<Tool> for ToolDescriptor {
    fn from(tool: Tool) -> Self {
        Self {
            name: tool.name.to_string(),
            description: tool.description.map(|s| s.to_string()).unwrap_or_default(),
            // input_schema is Arc<JsonObject>, convert to Value
            input_schema: Value::Object(tool.input_schema.as_ref().clone()),
            output_schema: tool
                .output_schema
                .map(|schema| Value::Object(schema.as_ref().clone())),
        }
    }
}

impl From<&Content> for ContentItem {
    fn from(content: &Content) -> Self {
        // Content is Annotated<RawContent>, we access .raw to get RawContent
        let kind = match &content.raw {
            RawContent::Text(text) => return ContentItem::text(text.text.clone()),
            RawContent::Image(_) => "image",
            RawContent::Audio(_) => "audio",
            RawContent::Resource(_) => "resource",
            RawContent::ResourceLink(_) => "resource_link",
            #[allow(unreachable_patterns)]
            _ => "unknown",
        };
        let payload = serde_json::to_value(&content.raw).unwrap_or(Value::Null);
        ContentItem::other(kind, payload)
    }
}

fn client_info(name: &str) -> ClientInfo {
    ClientInfo {
        meta: None,
        protocol_version: Default::default(),
        capabilities: ClientCapabilities::default(),
        client_info: Implementation {
            name: name.to_string(),
            title: Some("Toolbridge".to_string()),
            version: env!("CARGO_PKG_VERSION").to_string(),
            website_url: None,
            icons: None,
        },
    }
}

/// Map an rmcp service error for a session-level operation
fn session_error(err: ServiceError) -> RegistryError {
    match err {
        ServiceError::TransportClosed | ServiceError::TransportSend(_) => {
            RegistryError::Connection(err.to_string())
        }
        other => RegistryError::Protocol(other.to_string()),
    }
}

/// Whether an INVALID_PARAMS message says `tool` itself is unknown
fn names_unknown_tool(tool: &str, message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains(&tool.to_lowercase())
        && (lower.contains("unknown tool") || lower.contains("tool not found"))
}

/// Map an rmcp service error for a tool call
///
/// Only an unknown tool name maps to `ToolNotFound`; any other provider error
/// is a runtime failure and keeps the provider's message.
fn call_error(tool: &str, err: ServiceError) -> RegistryError {
    match err {
        ServiceError::McpError(ref data)
            if data.code == ErrorCode::METHOD_NOT_FOUND
                || (data.code == ErrorCode::INVALID_PARAMS
                    && names_unknown_tool(tool, &data.message)) =>
        {
            RegistryError::ToolNotFound {
                tool: tool.to_string(),
            }
        }
        ServiceError::McpError(data) => RegistryError::tool_failed(tool, data.message.to_string()),
        ServiceError::TransportClosed | ServiceError::TransportSend(_) => {
            RegistryError::Connection(err.to_string())
        }
        other => RegistryError::tool_failed(tool, other.to_string()),
    }
}

/// MCP client session
pub struct McpClient {
    /// Request handle for the session
    peer: Peer<RoleClient>,
    /// The underlying rmcp running service, taken on close
    service: Mutex<Option<RunningService<RoleClient, ClientInfo>>>,
    /// Logger
    logger: Arc<dyn Logger>,
}

impl McpClient {
    fn from_service(
        service: RunningService<RoleClient, ClientInfo>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            peer: service.peer().clone(),
            service: Mutex::new(Some(service)),
            logger,
        }
    }

    /// Connect to an MCP server over a Unix socket
    #[cfg(unix)]
    pub async fn connect_unix<P: AsRef<Path>>(
        socket_path: P,
        client_name: &str,
        logger: Arc<dyn Logger>,
    ) -> RegistryResult<Self> {
        let path = socket_path.as_ref();
        logger.info(&format!("[McpClient] Connecting to Unix socket: {:?}", path));

        let stream = UnixStream::connect(path)
            .await
            .map_err(|e| RegistryError::Connection(e.to_string()))?;

        let service = client_info(client_name)
            .serve(stream)
            .await
            .map_err(|e| RegistryError::Connection(format!("initialization failed: {}", e)))?;

        logger.info("[McpClient] Connected and initialized successfully");

        Ok(Self::from_service(service, logger))
    }

    /// Connect to an MCP server over HTTP (Streamable HTTP transport)
    pub async fn connect_http(
        url: &str,
        client_name: &str,
        logger: Arc<dyn Logger>,
    ) -> RegistryResult<Self> {
        use rmcp::transport::StreamableHttpClientTransport;

        logger.info(&format!("[McpClient] Connecting to HTTP: {}", url));

        let transport = StreamableHttpClientTransport::from_uri(url);

        let service = client_info(client_name)
            .serve(transport)
            .await
            .map_err(|e| RegistryError::Connection(format!("initialization failed: {}", e)))?;

        logger.info("[McpClient] Connected and initialized successfully");

        Ok(Self::from_service(service, logger))
    }

    /// Get server info
    pub fn server_info(&self) -> Option<Implementation> {
        self.peer.peer_info().map(|info| info.server_info.clone())
    }
}

#[async_trait]
impl ToolRegistry for McpClient {
    async fn list_tools(&self) -> RegistryResult<Vec<ToolDescriptor>> {
        let tools = self.peer.list_all_tools().await.map_err(session_error)?;

        self.logger.info(&format!("[McpClient] Listed {} tools", tools.len()));

        let descriptors: Vec<ToolDescriptor> =
            tools.into_iter().map(ToolDescriptor::from).collect();
        if descriptors.iter().any(|t| t.name.is_empty()) {
            return Err(RegistryError::Protocol(
                "tool listing contains a tool with an empty name".to_string(),
            ));
        }
        Ok(descriptors)
    }

    async fn call_tool(
        &self,
        name: &str,
        args: Map<String, Value>,
    ) -> RegistryResult<Vec<ContentItem>> {
        self.logger.info(&format!("[McpClient] Calling tool: {}", name));

        let params = CallToolRequestParams {
            meta: None,
            name: name.to_owned().into(),
            arguments: Some(args),
            task: None,
        };

        let result = self
            .peer
            .call_tool(params)
            .await
            .map_err(|e| call_error(name, e))?;

        let items: Vec<ContentItem> = result.content.iter().map(ContentItem::from).collect();

        if result.is_error.unwrap_or(false) {
            let message = items
                .iter()
                .filter_map(ContentItem::as_text)
                .collect::<Vec<_>>()
                .join("\n");
            return Err(RegistryError::tool_failed(name, message));
        }

        Ok(items)
    }

    async fn close(&self) -> RegistryResult<()> {
        let service = self.service.lock().take();
        match service {
            Some(service) => {
                self.logger.info("[McpClient] Closing connection");
                service
                    .cancel()
                    .await
                    .map_err(|e| RegistryError::Protocol(e.to_string()))?;
                Ok(())
            }
            None => {
                self.logger.debug("[McpClient] Connection already closed");
                Ok(())
            }
        }
    }
}

/// Opens `McpClient` sessions for a configured endpoint
pub struct McpConnector {
    endpoint: RegistryEndpoint,
    client_name: String,
    logger: Arc<dyn Logger>,
}

impl McpConnector {
    pub fn new(endpoint: RegistryEndpoint, logger: Arc<dyn Logger>) -> Self {
        Self {
            endpoint,
            client_name: DEFAULT_CLIENT_NAME.to_string(),
            logger,
        }
    }

    /// Set the implementation name announced to the server
    pub fn with_client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = name.into();
        self
    }
}

#[async_trait]
impl RegistryConnector for McpConnector {
    fn target(&self) -> String {
        self.endpoint.to_string()
    }

    async fn connect(&self) -> RegistryResult<Box<dyn ToolRegistry>> {
        let client = match &self.endpoint {
            RegistryEndpoint::Http(url) => {
                McpClient::connect_http(url, &self.client_name, Arc::clone(&self.logger)).await?
            }
            #[cfg(unix)]
            RegistryEndpoint::Unix(path) => {
                McpClient::connect_unix(path, &self.client_name, Arc::clone(&self.logger)).await?
            }
            #[cfg(not(unix))]
            RegistryEndpoint::Unix(path) => {
                return Err(RegistryError::InvalidEndpoint(format!(
                    "unix sockets are not supported on this platform: {}",
                    path.display()
                )));
            }
        };

        if let Some(info) = client.server_info() {
            self.logger.info(&format!(
                "[McpConnector] Server: {} {}",
                info.name, info.version
            ));
        }

        Ok(Box::new(client))
    }
}
