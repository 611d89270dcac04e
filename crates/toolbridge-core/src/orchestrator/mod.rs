//! Run orchestration
//!
//! ```text
//! Idle → ToolsDiscovered → FirstResponseReceived ─┬─ FunctionCallPending
//!                                                 │    → ToolInvoked → FinalResponseReceived
//!                                                 └─ DirectAnswer
//! ```
//!
//! Any stage may end in `Failed`; the registry session is closed either way.

mod engine;
mod error;
mod options;
mod report;
mod state;

pub use engine::Orchestrator;
pub use error::{OrchestrationError, OrchestrationResult};
pub use options::{OrchestratorOptions, StageTimeouts, ToolErrorMode};
pub use report::{RunReport, ToolExchange};
pub use state::{OrchestratorState, Stage, TerminalState};
