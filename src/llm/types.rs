//! Common types for engine interactions

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Structured data returned by a tool. Opaque to the loop.
pub type ToolPayload = Map<String, Value>;

/// One entry in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Turn {
    UserText {
        text: String,
    },
    AssistantMessage {
        content: Vec<ContentBlock>,
    },
    ToolResult {
        tool_use_id: String,
        payload: ToolPayload,
        status: ToolStatus,
    },
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Turn::UserText { text: text.into() }
    }

    pub fn assistant(content: Vec<ContentBlock>) -> Self {
        Turn::AssistantMessage { content }
    }

    pub fn tool_success(tool_use_id: impl Into<String>, payload: ToolPayload) -> Self {
        Turn::ToolResult {
            tool_use_id: tool_use_id.into(),
            payload,
            status: ToolStatus::Success,
        }
    }

    /// Which side of the exchange sent this turn
    pub fn role(&self) -> MessageRole {
        match self {
            Turn::AssistantMessage { .. } => MessageRole::Assistant,
            Turn::UserText { .. } | Turn::ToolResult { .. } => MessageRole::User,
        }
    }
}

/// Message role on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    User,
    Assistant,
}

/// Outcome marker carried back to the engine with a tool result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    Success,
    Error,
}

/// Content block in an assistant message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolRequest {
        tool_use_id: String,
        name: String,
        input: Value,
    },
}

impl ContentBlock {
    pub fn text(s: impl Into<String>) -> Self {
        ContentBlock::Text { text: s.into() }
    }

    pub fn tool_request(
        tool_use_id: impl Into<String>,
        name: impl Into<String>,
        input: Value,
    ) -> Self {
        ContentBlock::ToolRequest {
            tool_use_id: tool_use_id.into(),
            name: name.into(),
            input,
        }
    }
}

/// A tool request lifted out of a content block
#[derive(Debug, Clone, PartialEq)]
pub struct ToolRequest {
    pub tool_use_id: String,
    pub name: String,
    pub input: Value,
}

/// The first tool request in `content`, if any. Later requests are ignored.
pub fn first_tool_request(content: &[ContentBlock]) -> Option<ToolRequest> {
    content.iter().find_map(|block| match block {
        ContentBlock::ToolRequest {
            tool_use_id,
            name,
            input,
        } => Some(ToolRequest {
            tool_use_id: tool_use_id.clone(),
            name: name.clone(),
            input: input.clone(),
        }),
        ContentBlock::Text { .. } => None,
    })
}

/// Tool declaration advertised to the engine
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Engine request
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub messages: Vec<Turn>,
    pub tools: Vec<ToolSpec>,
    pub max_tokens: Option<u32>,
}

/// Engine response: the content of one assistant message.
///
/// `end_turn` is reported for logging; the loop only looks at `content`.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub end_turn: bool,
    pub usage: Usage,
}

/// Usage statistics
#[derive(Debug, Clone, Copy, Default)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}
