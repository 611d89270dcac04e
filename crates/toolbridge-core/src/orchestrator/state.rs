//! Run states and stages

use std::fmt;

use serde::Serialize;

/// Where a run is in the discover → ask → call → re-ask pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrchestratorState {
    Idle,
    ToolsDiscovered,
    FirstResponseReceived,
    FunctionCallPending,
    ToolInvoked,
    FinalResponseReceived,
    DirectAnswer,
    Failed,
}

impl OrchestratorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrchestratorState::Idle => "idle",
            OrchestratorState::ToolsDiscovered => "tools_discovered",
            OrchestratorState::FirstResponseReceived => "first_response_received",
            OrchestratorState::FunctionCallPending => "function_call_pending",
            OrchestratorState::ToolInvoked => "tool_invoked",
            OrchestratorState::FinalResponseReceived => "final_response_received",
            OrchestratorState::DirectAnswer => "direct_answer",
            OrchestratorState::Failed => "failed",
        }
    }
}

impl fmt::Display for OrchestratorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a successful run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalState {
    /// The model answered after seeing tool results
    FinalAnswer,
    /// The model answered without suggesting a usable function call
    DirectAnswer,
}

/// Pipeline stage an error is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Connect,
    ListTools,
    FirstModelCall,
    Dispatch,
    SecondModelCall,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Connect => "connect",
            Stage::ListTools => "list_tools",
            Stage::FirstModelCall => "first_model_call",
            Stage::Dispatch => "dispatch",
            Stage::SecondModelCall => "second_model_call",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
