//! Tool translation, filtering and dispatch
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────┐   tools/list    ┌─────────────────────┐
//! │  ToolFilter → translate_all  │ ◀────────────── │                     │
//! │  (FunctionDeclarations)      │                 │  MCP server         │
//! └──────────────────────────────┘                 │  (ToolRegistry)     │
//! ┌──────────────────────────────┐   tools/call    │                     │
//! │  ToolDispatcher              │ ──────────────▶ │                     │
//! │  FunctionCall → Response     │                 └─────────────────────┘
//! └──────────────────────────────┘
//! ```

mod dispatcher;
mod filter;
mod schema;

pub use dispatcher::{
    select_calls, CallPolicy, DispatchError, DispatchResult, ToolDispatcher, DEFAULT_CALL_TIMEOUT,
};
pub use filter::ToolFilter;
pub use schema::{to_function_declaration, translate_all};
