//! Orchestration errors

use thiserror::Error;

use crate::mcp::RegistryError;
use crate::providers::ModelError;
use crate::tools::DispatchError;

use super::state::Stage;

/// A run failure, attributed to the stage where it happened
#[derive(Error, Debug)]
pub enum OrchestrationError {
    #[error("Tool registry failed during {stage}: {source}")]
    Registry {
        stage: Stage,
        #[source]
        source: RegistryError,
    },

    #[error("Model failed during {stage}: {source}")]
    Model {
        stage: Stage,
        #[source]
        source: ModelError,
    },

    #[error("Dispatch of '{tool}' failed: {source}")]
    Dispatch {
        tool: String,
        #[source]
        source: DispatchError,
    },
}

impl OrchestrationError {
    pub fn registry(stage: Stage, source: RegistryError) -> Self {
        Self::Registry { stage, source }
    }

    pub fn model(stage: Stage, source: ModelError) -> Self {
        Self::Model { stage, source }
    }

    pub fn dispatch(tool: impl Into<String>, source: DispatchError) -> Self {
        Self::Dispatch {
            tool: tool.into(),
            source,
        }
    }

    /// Stage the failure is attributed to
    pub fn stage(&self) -> Stage {
        match self {
            OrchestrationError::Registry { stage, .. }
            | OrchestrationError::Model { stage, .. } => *stage,
            OrchestrationError::Dispatch { .. } => Stage::Dispatch,
        }
    }

    /// Tool involved, for dispatch failures
    pub fn tool(&self) -> Option<&str> {
        match self {
            OrchestrationError::Dispatch { tool, .. } => Some(tool),
            _ => None,
        }
    }
}

pub type OrchestrationResult<T> = Result<T, OrchestrationError>;
