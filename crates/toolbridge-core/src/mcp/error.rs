//! Tool registry error types

use std::time::Duration;

use thiserror::Error;

use crate::types::Interrupted;

/// How a tool execution failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolFailureKind {
    /// The provider reported a runtime failure
    Failed,
    /// The call did not complete within its deadline
    Timeout,
    /// The run was cancelled while the call was in flight
    Cancelled,
}

impl std::fmt::Display for ToolFailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolFailureKind::Failed => write!(f, "failed"),
            ToolFailureKind::Timeout => write!(f, "timed out"),
            ToolFailureKind::Cancelled => write!(f, "was cancelled"),
        }
    }
}

/// Errors from the tool provider session
#[derive(Error, Debug, Clone)]
pub enum RegistryError {
    /// Transport unreachable or handshake failed
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Malformed listing or response
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The provider does not know the tool
    #[error("Tool not found: {tool}")]
    ToolNotFound { tool: String },

    /// The tool ran (or may have run) but did not produce a result
    #[error("Tool '{tool}' {kind}: {message}")]
    ToolExecution {
        tool: String,
        kind: ToolFailureKind,
        message: String,
    },

    /// A session-level operation hit its deadline
    #[error("{operation} timed out after {after:?}")]
    Timeout { operation: String, after: Duration },

    /// A session-level operation was cancelled
    #[error("{operation} was cancelled")]
    Cancelled { operation: String },

    /// Endpoint string could not be used
    #[error("Invalid registry endpoint: {0}")]
    InvalidEndpoint(String),
}

impl RegistryError {
    /// Create a tool execution failure reported by the provider
    pub fn tool_failed(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolExecution {
            tool: tool.into(),
            kind: ToolFailureKind::Failed,
            message: message.into(),
        }
    }

    /// Map an interrupted session operation (connect, list)
    pub fn interrupted(operation: impl Into<String>, reason: Interrupted) -> Self {
        match reason {
            Interrupted::TimedOut(after) => Self::Timeout {
                operation: operation.into(),
                after,
            },
            Interrupted::Cancelled => Self::Cancelled {
                operation: operation.into(),
            },
        }
    }

    /// Map an interrupted tool call
    pub fn tool_interrupted(tool: impl Into<String>, reason: Interrupted) -> Self {
        let (kind, message) = match reason {
            Interrupted::TimedOut(after) => (
                ToolFailureKind::Timeout,
                format!(
                    "no result within {:?}; the provider may still have executed the call",
                    after
                ),
            ),
            Interrupted::Cancelled => (
                ToolFailureKind::Cancelled,
                "run cancelled while the call was in flight".to_string(),
            ),
        };
        Self::ToolExecution {
            tool: tool.into(),
            kind,
            message,
        }
    }

    /// The failure kind, if this is a tool execution error
    pub fn failure_kind(&self) -> Option<ToolFailureKind> {
        match self {
            RegistryError::ToolExecution { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

pub type RegistryResult<T> = Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_interrupted_timeout() {
        let err = RegistryError::tool_interrupted(
            "cityTime",
            Interrupted::TimedOut(Duration::from_secs(2)),
        );
        assert_eq!(err.failure_kind(), Some(ToolFailureKind::Timeout));
        assert!(err.to_string().starts_with("Tool 'cityTime' timed out"));
    }

    #[test]
    fn test_interrupted_operation() {
        let err = RegistryError::interrupted("list_tools", Interrupted::Cancelled);
        assert!(matches!(err, RegistryError::Cancelled { .. }));
        assert_eq!(err.failure_kind(), None);
    }
}
