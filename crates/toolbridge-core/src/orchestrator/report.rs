//! Run report

use crate::tools::DispatchError;
use crate::types::{ConversationTurn, FunctionCall, FunctionResponse};

use super::state::{OrchestratorState, TerminalState};

/// One dispatched call and what was sent back to the model
#[derive(Debug, Clone)]
pub struct ToolExchange {
    pub call: FunctionCall,
    pub response: FunctionResponse,
    /// Set when `response` is an error indicator
    pub error: Option<DispatchError>,
}

impl ToolExchange {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub terminal: TerminalState,
    /// Final answer text
    pub text: String,
    pub exchanges: Vec<ToolExchange>,
    /// Conversation as last sent to the model
    pub conversation: Vec<ConversationTurn>,
    /// States visited, starting at `Idle`
    pub states: Vec<OrchestratorState>,
}

impl RunReport {
    pub fn is_direct_answer(&self) -> bool {
        self.terminal == TerminalState::DirectAnswer
    }

    /// Names of the tools that were dispatched, in order
    pub fn tools_called(&self) -> Vec<&str> {
        self.exchanges.iter().map(|e| e.call.name.as_str()).collect()
    }
}
