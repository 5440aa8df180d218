//! Mock implementations for testing
//!
//! These mocks let the loop run without a real engine or real tools.

use super::traits::{LlmClient, ToolExecutor};
use crate::llm::{
    ContentBlock, LlmError, LlmRequest, LlmResponse, ToolPayload, ToolSpec, Usage,
};
use crate::tools::{ToolError, ToolFailure};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

// ============================================================================
// Response builders
// ============================================================================

/// Engine response with a single text block
pub fn text_response(text: &str) -> LlmResponse {
    LlmResponse {
        content: vec![ContentBlock::text(text)],
        end_turn: true,
        usage: Usage::default(),
    }
}

/// Engine response requesting one tool
pub fn tool_response(tool_use_id: &str, name: &str, input: Value) -> LlmResponse {
    LlmResponse {
        content: vec![ContentBlock::tool_request(tool_use_id, name, input)],
        end_turn: false,
        usage: Usage::default(),
    }
}

/// Payload from a JSON object literal
pub fn payload(value: Value) -> ToolPayload {
    match value {
        Value::Object(map) => map,
        other => panic!("payload must be an object, got {other}"),
    }
}

// ============================================================================
// Mock LLM Client
// ============================================================================

/// Mock engine client that returns queued responses
pub struct MockLlmClient {
    responses: Mutex<VecDeque<Result<LlmResponse, LlmError>>>,
    model_id: String,
    /// Record of all requests made
    pub requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlmClient {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            model_id: model_id.into(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful response
    pub fn queue_response(&self, response: LlmResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    /// Queue an error response
    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock response queued")))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// ============================================================================
// Mock Tool Executor
// ============================================================================

/// Mock tool executor with predefined outputs
pub struct MockToolExecutor {
    outputs: HashMap<String, Result<ToolPayload, ToolFailure>>,
    definitions: Vec<ToolSpec>,
    /// Record of tool executions
    pub executions: Mutex<Vec<(String, Value)>>,
}

impl MockToolExecutor {
    pub fn new() -> Self {
        Self {
            outputs: HashMap::new(),
            definitions: Vec::new(),
            executions: Mutex::new(Vec::new()),
        }
    }

    /// Add a tool with a predefined payload
    pub fn with_tool(self, name: impl Into<String>, payload: ToolPayload) -> Self {
        self.with_output(name.into(), Ok(payload))
    }

    /// Add a tool whose handler always fails
    pub fn with_failure(self, name: impl Into<String>, failure: ToolFailure) -> Self {
        self.with_output(name.into(), Err(failure))
    }

    fn with_output(mut self, name: String, output: Result<ToolPayload, ToolFailure>) -> Self {
        self.definitions.push(ToolSpec {
            name: name.clone(),
            description: format!("Mock {name}"),
            input_schema: serde_json::json!({ "type": "object", "properties": {} }),
        });
        self.outputs.insert(name, output);
        self
    }

    /// Get recorded executions
    pub fn recorded_executions(&self) -> Vec<(String, Value)> {
        self.executions.lock().unwrap().clone()
    }
}

impl Default for MockToolExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolExecutor for MockToolExecutor {
    async fn execute(&self, name: &str, input: Value) -> Result<ToolPayload, ToolError> {
        self.executions
            .lock()
            .unwrap()
            .push((name.to_string(), input));

        match self.outputs.get(name) {
            None => Err(ToolError::UnknownTool(name.to_string())),
            Some(Ok(payload)) => Ok(payload.clone()),
            Some(Err(failure)) => Err(ToolError::Execution {
                tool_name: name.to_string(),
                cause: failure.clone(),
            }),
        }
    }

    fn definitions(&self) -> Vec<ToolSpec> {
        self.definitions.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_mock_llm_client() {
        let mock = MockLlmClient::new("test-model");
        mock.queue_response(text_response("Hello"));

        let request = LlmRequest {
            messages: vec![],
            tools: vec![],
            max_tokens: Some(100),
        };

        let response = mock.complete(&request).await.unwrap();
        assert_eq!(response.content, vec![ContentBlock::text("Hello")]);
        assert!(response.end_turn);

        // Second call should fail (no more responses)
        let result = mock.complete(&request).await;
        assert!(result.is_err());
        assert_eq!(mock.recorded_requests().len(), 2);
    }

    #[tokio::test]
    async fn test_mock_tool_executor() {
        let executor = MockToolExecutor::new()
            .with_tool("get_today_date", payload(json!({"today": "2024-01-01"})))
            .with_failure("search_tool", ToolFailure::Upstream("down".to_string()));

        let result = executor.execute("get_today_date", json!({})).await;
        assert_eq!(result.unwrap()["today"], "2024-01-01");

        let result = executor.execute("search_tool", json!({"query": "hat"})).await;
        assert!(matches!(result, Err(ToolError::Execution { .. })));

        let result = executor.execute("unknown", json!({})).await;
        assert!(matches!(result, Err(ToolError::UnknownTool(_))));

        assert_eq!(executor.recorded_executions().len(), 3);
        assert_eq!(executor.definitions().len(), 2);
    }
}
