//! Run options

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::providers::SamplingConfig;
use crate::tools::{CallPolicy, ToolFilter, DEFAULT_CALL_TIMEOUT};

/// Per-stage deadlines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageTimeouts {
    pub connect: Duration,
    pub list_tools: Duration,
    pub call_tool: Duration,
    pub model: Duration,
}

impl Default for StageTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(10),
            list_tools: Duration::from_secs(10),
            call_tool: DEFAULT_CALL_TIMEOUT,
            model: Duration::from_secs(60),
        }
    }
}

/// What happens when a dispatched call fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorMode {
    /// Send an error-indicator function response to the model and continue
    #[default]
    ReportToModel,
    /// End the run with a dispatch error
    Abort,
}

/// Everything a run needs besides its collaborators
#[derive(Debug, Clone, Default)]
pub struct OrchestratorOptions {
    pub sampling: SamplingConfig,
    pub timeouts: StageTimeouts,
    pub filter: ToolFilter,
    pub call_policy: CallPolicy,
    pub on_tool_error: ToolErrorMode,
}

impl OrchestratorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sampling(mut self, sampling: SamplingConfig) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn with_timeouts(mut self, timeouts: StageTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn with_filter(mut self, filter: ToolFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_call_policy(mut self, policy: CallPolicy) -> Self {
        self.call_policy = policy;
        self
    }

    pub fn with_tool_error_mode(mut self, mode: ToolErrorMode) -> Self {
        self.on_tool_error = mode;
        self
    }
}
