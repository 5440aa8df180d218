//! Tools the engine may request mid-turn
//!
//! The registry both advertises tool declarations to the engine and
//! dispatches requested calls by name.

mod shopping_search;
mod today;

pub use shopping_search::ShoppingSearchTool;
pub use today::TodayTool;

use crate::config::SearchConfig;
use crate::llm::{ToolPayload, ToolSpec};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Failure raised by a tool handler
#[derive(Debug, Clone, Error)]
pub enum ToolFailure {
    #[error("missing credential: {0} is not configured")]
    MissingCredential(&'static str),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("upstream request failed: {0}")]
    Upstream(String),
}

/// Errors from resolving or executing a tool
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error("tool {tool_name} failed: {cause}")]
    Execution {
        tool_name: String,
        #[source]
        cause: ToolFailure,
    },
    #[error("tool {0} is registered more than once")]
    DuplicateTool(String),
}

/// Trait for tools that can be requested by the engine
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name
    fn name(&self) -> &str;

    /// Tool description for the engine
    fn description(&self) -> String;

    /// JSON schema for tool input
    fn input_schema(&self) -> Value;

    /// Execute the tool
    async fn run(&self, input: Value) -> Result<ToolPayload, ToolFailure>;
}

/// Collection of tools available to every conversation
///
/// Built once at startup and shared read-only across sessions.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the stylist's two tools
    pub fn standard(search: &SearchConfig) -> Result<Self, ToolError> {
        let mut registry = Self::new();
        registry.register(Arc::new(TodayTool::default()))?;
        registry.register(Arc::new(ShoppingSearchTool::new(search)))?;
        Ok(registry)
    }

    /// Add a tool. Names must be unique.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), ToolError> {
        if self.tools.iter().any(|t| t.name() == tool.name()) {
            return Err(ToolError::DuplicateTool(tool.name().to_string()));
        }
        self.tools.push(tool);
        Ok(())
    }

    /// Look up a tool by name
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Tool>, ToolError> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .cloned()
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))
    }

    /// Get all tool definitions for the engine
    pub fn definitions(&self) -> Vec<ToolSpec> {
        self.tools
            .iter()
            .map(|t| ToolSpec {
                name: t.name().to_string(),
                description: t.description(),
                input_schema: t.input_schema(),
            })
            .collect()
    }

    /// Execute a tool by name. Handler failures are wrapped, never retried.
    pub async fn execute(&self, name: &str, input: Value) -> Result<ToolPayload, ToolError> {
        let tool = self.resolve(name)?;

        match tool.run(input).await {
            Ok(payload) => {
                tracing::info!(tool = %name, "Tool completed");
                Ok(payload)
            }
            Err(cause) => {
                tracing::warn!(tool = %name, error = %cause, "Tool failed");
                Err(ToolError::Execution {
                    tool_name: name.to_string(),
                    cause,
                })
            }
        }
    }
}
