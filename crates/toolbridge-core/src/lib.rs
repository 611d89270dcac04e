//! Toolbridge Core
//!
//! Bridges a function-calling language model with tools discovered from an
//! MCP server: discover tools, declare them to the model, dispatch the call the
//! model suggests, and hand the result back for a grounded answer.
//!
//! ## Orchestration
//!
//! ```rust,ignore
//! use toolbridge_core::{
//!     GenaiInvoker, McpConnector, Orchestrator, OrchestratorOptions, RegistryEndpoint,
//! };
//!
//! let endpoint = RegistryEndpoint::parse("http://localhost:8000")?;
//! let connector = McpConnector::new(endpoint, logger.clone());
//! let model = GenaiInvoker::new("gemini-2.5-flash", Some(api_key), None, logger.clone());
//!
//! let orchestrator = Orchestrator::new(
//!     Arc::new(connector),
//!     Arc::new(model),
//!     OrchestratorOptions::new(),
//!     logger,
//! );
//! let report = orchestrator.run("What is the time in ny?").await?;
//! println!("{}", report.text);
//! ```

pub mod types;
pub mod secrets;
pub mod logging;
pub mod config;
pub mod providers;
pub mod tools;
pub mod mcp;
pub mod conversation;
pub mod orchestrator;

// Re-export commonly used types
pub use types::{
    CancellationToken, ContentItem, ConversationTurn, FunctionCall, FunctionDeclaration,
    FunctionResponse, Interrupted, ModelResponse, Part, Role, ToolDescriptor,
};

pub use secrets::{
    infer_provider, resolve_api_key, EnvSecretStore, MemorySecretStore, SecretStore,
    SecretStoreError, SecretStoreResult,
};

pub use logging::{Logger, NoOpLogger, SharedLogger, TracingLogger};

pub use config::{BridgeConfig, ConfigError, ConfigFile, ConfigResult};

pub use providers::{GenaiInvoker, ModelError, ModelInvoker, ModelResult, SamplingConfig};

pub use tools::{CallPolicy, DispatchError, ToolDispatcher, ToolFilter};

pub use mcp::{
    McpClient, McpConnector, RegistryConnector, RegistryEndpoint, RegistryError, RegistryResult,
    ToolRegistry,
};

pub use orchestrator::{
    OrchestrationError, OrchestrationResult, Orchestrator, OrchestratorOptions, OrchestratorState,
    RunReport, Stage, StageTimeouts, TerminalState, ToolErrorMode, ToolExchange,
};
