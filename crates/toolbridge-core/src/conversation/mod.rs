//! Conversation assembly
//!
//! Conversations are rebuilt rather than edited: every builder returns a new
//! vector and leaves the prior turns untouched.

mod builder;

pub use builder::{build_initial, build_with_tool_result, build_with_tool_results};
