//! Tool filtering applied to a provider listing

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::types::ToolDescriptor;

/// Allow/deny list for discovered tools
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolFilter {
    /// If set, only include tools with these names
    #[serde(default)]
    pub include: Option<HashSet<String>>,
    /// Exclude tools with these names
    #[serde(default)]
    pub exclude: HashSet<String>,
}

impl ToolFilter {
    /// A filter that lets every tool through
    pub fn new() -> Self {
        Self::default()
    }

    /// Include only specific tools
    pub fn with_include(mut self, names: impl IntoIterator<Item = String>) -> Self {
        self.include = Some(names.into_iter().collect());
        self
    }

    /// Exclude specific tools
    pub fn with_exclude(mut self, names: impl IntoIterator<Item = String>) -> Self {
        self.exclude = names.into_iter().collect();
        self
    }

    /// Check if a tool matches this filter
    pub fn matches(&self, tool: &ToolDescriptor) -> bool {
        if self.exclude.contains(&tool.name) {
            return false;
        }

        if let Some(ref include) = self.include {
            if !include.contains(&tool.name) {
                return false;
            }
        }

        true
    }

    /// Keep the matching tools, in listing order
    pub fn apply(&self, tools: Vec<ToolDescriptor>) -> Vec<ToolDescriptor> {
        tools.into_iter().filter(|t| self.matches(t)).collect()
    }
}
