//! Mock tool registry for testing
//!
//! Serves a scripted tool set without any network. Clones share state, so a
//! test can keep a handle while the orchestrator owns the boxed session.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value};

use crate::types::{ContentItem, ToolDescriptor};

use super::error::{RegistryError, RegistryResult};
use super::registry::{RegistryConnector, ToolRegistry};

/// What a mock tool does when called
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Return these content items
    Reply(Vec<ContentItem>),
    /// Fail with this error
    Fail(RegistryError),
    /// Never complete
    Hang,
}

impl MockBehavior {
    /// Reply with a single text item
    pub fn text(text: impl Into<String>) -> Self {
        MockBehavior::Reply(vec![ContentItem::text(text)])
    }
}

#[derive(Default)]
struct MockState {
    tools: Mutex<Vec<ToolDescriptor>>,
    behaviors: Mutex<HashMap<String, MockBehavior>>,
    list_failure: Mutex<Option<RegistryError>>,
    calls: Mutex<Vec<(String, Map<String, Value>)>>,
    list_count: AtomicUsize,
    close_count: AtomicUsize,
}

/// Scripted tool registry
#[derive(Clone, Default)]
pub struct MockToolRegistry {
    state: Arc<MockState>,
}

impl MockToolRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool and its behavior
    pub fn with_tool(self, descriptor: ToolDescriptor, behavior: MockBehavior) -> Self {
        self.state
            .behaviors
            .lock()
            .insert(descriptor.name.clone(), behavior);
        self.state.tools.lock().push(descriptor);
        self
    }

    /// Make `list_tools` fail
    pub fn with_list_failure(self, error: RegistryError) -> Self {
        *self.state.list_failure.lock() = Some(error);
        self
    }

    /// Calls received so far, in order
    pub fn calls(&self) -> Vec<(String, Map<String, Value>)> {
        self.state.calls.lock().clone()
    }

    /// Names of the tools called so far, in order
    pub fn called_names(&self) -> Vec<String> {
        self.state.calls.lock().iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn list_count(&self) -> usize {
        self.state.list_count.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> usize {
        self.state.close_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ToolRegistry for MockToolRegistry {
    async fn list_tools(&self) -> RegistryResult<Vec<ToolDescriptor>> {
        self.state.list_count.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.state.list_failure.lock().clone() {
            return Err(error);
        }
        Ok(self.state.tools.lock().clone())
    }

    async fn call_tool(
        &self,
        name: &str,
        args: Map<String, Value>,
    ) -> RegistryResult<Vec<ContentItem>> {
        self.state.calls.lock().push((name.to_string(), args));

        let behavior = self.state.behaviors.lock().get(name).cloned();
        match behavior {
            Some(MockBehavior::Reply(items)) => Ok(items),
            Some(MockBehavior::Fail(error)) => Err(error),
            Some(MockBehavior::Hang) => {
                std::future::pending::<()>().await;
                Ok(Vec::new())
            }
            None => Err(RegistryError::ToolNotFound {
                tool: name.to_string(),
            }),
        }
    }

    async fn close(&self) -> RegistryResult<()> {
        self.state.close_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Connector handing out sessions backed by a shared `MockToolRegistry`
#[derive(Clone, Default)]
pub struct MockConnector {
    registry: MockToolRegistry,
    connect_failure: Option<RegistryError>,
    connect_count: Arc<AtomicUsize>,
}

impl MockConnector {
    pub fn new(registry: MockToolRegistry) -> Self {
        Self {
            registry,
            connect_failure: None,
            connect_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Make every connect attempt fail
    pub fn failing(error: RegistryError) -> Self {
        Self {
            connect_failure: Some(error),
            ..Self::default()
        }
    }

    /// The shared registry handle
    pub fn registry(&self) -> &MockToolRegistry {
        &self.registry
    }

    pub fn connect_count(&self) -> usize {
        self.connect_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RegistryConnector for MockConnector {
    fn target(&self) -> String {
        "mock://registry".to_string()
    }

    async fn connect(&self) -> RegistryResult<Box<dyn ToolRegistry>> {
        self.connect_count.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = &self.connect_failure {
            return Err(error.clone());
        }
        Ok(Box::new(self.registry.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[tokio::test]
    async fn test_mock_registry_reply_and_record() {
        let registry = MockToolRegistry::new().with_tool(
            ToolDescriptor::new("cityTime", "Get the time"),
            MockBehavior::text("3:00 PM in New York"),
        );

        let tools = registry.list_tools().await.unwrap();
        assert_eq!(tools.len(), 1);

        let items = registry.call_tool("cityTime", args(json!({ "city": "nyc" }))).await.unwrap();
        assert_eq!(items, vec![ContentItem::text("3:00 PM in New York")]);
        assert_eq!(registry.called_names(), vec!["cityTime"]);
        assert_eq!(registry.calls()[0].1["city"], "nyc");
    }

    #[tokio::test]
    async fn test_mock_registry_unknown_tool() {
        let registry = MockToolRegistry::new();
        let err = registry.call_tool("missing", Map::new()).await.unwrap_err();
        assert!(matches!(err, RegistryError::ToolNotFound { .. }));
    }

    #[tokio::test]
    async fn test_mock_connector_shares_state() {
        let connector = MockConnector::new(MockToolRegistry::new());
        let session = connector.connect().await.unwrap();
        session.close().await.unwrap();

        assert_eq!(connector.connect_count(), 1);
        assert_eq!(connector.registry().close_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_connector_failure() {
        let connector = MockConnector::failing(RegistryError::Connection("refused".to_string()));
        assert!(connector.connect().await.is_err());
    }
}
