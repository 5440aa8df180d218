//! Trait abstractions for the loop's I/O
//!
//! The loop only sees these seams, so tests drive it with mocks and the
//! server drives it with the real engine and tool registry.

use crate::llm::{LlmError, LlmRequest, LlmResponse, LlmService, ToolPayload, ToolSpec};
use crate::tools::{ToolError, ToolRegistry};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Client for making engine requests
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Complete an engine request
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

/// Executor for tools
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Execute a tool by name
    async fn execute(&self, name: &str, input: Value) -> Result<ToolPayload, ToolError>;

    /// Get tool definitions for the engine
    fn definitions(&self) -> Vec<ToolSpec>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: LlmClient + ?Sized> LlmClient for Arc<T> {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        (**self).complete(request).await
    }

    fn model_id(&self) -> &str {
        (**self).model_id()
    }
}

#[async_trait]
impl<T: ToolExecutor + ?Sized> ToolExecutor for Arc<T> {
    async fn execute(&self, name: &str, input: Value) -> Result<ToolPayload, ToolError> {
        (**self).execute(name, input).await
    }

    fn definitions(&self) -> Vec<ToolSpec> {
        (**self).definitions()
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

/// Adapter to use an `LlmService` as `LlmClient`
pub struct ServiceLlmClient {
    service: Arc<dyn LlmService>,
}

impl ServiceLlmClient {
    pub fn new(service: Arc<dyn LlmService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl LlmClient for ServiceLlmClient {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.service.complete(request).await
    }

    fn model_id(&self) -> &str {
        self.service.model_id()
    }
}

#[async_trait]
impl ToolExecutor for ToolRegistry {
    async fn execute(&self, name: &str, input: Value) -> Result<ToolPayload, ToolError> {
        ToolRegistry::execute(self, name, input).await
    }

    fn definitions(&self) -> Vec<ToolSpec> {
        ToolRegistry::definitions(self)
    }
}
