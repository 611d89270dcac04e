//! Model invocation
//!
//! `ModelInvoker` is the seam between the orchestrator and a function-calling
//! model. `GenaiInvoker` talks to real APIs through the `genai` crate (Gemini,
//! OpenAI, Anthropic, Ollama and OpenAI-compatible endpoints via `api_base`).
//!
//! The `ScriptedModel` is kept for testing purposes.

mod traits;
mod error;
mod genai_adapter;
mod genai_invoker;
mod mock;

pub use traits::{ModelInvoker, SamplingConfig};
pub use error::{ModelError, ModelResult};
pub use genai_invoker::GenaiInvoker;
pub use mock::{RecordedInvocation, ScriptedModel, ScriptedReply};
