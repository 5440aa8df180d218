//! The conversation loop
//!
//! Alternates between engine calls and engine-requested tool calls until the
//! engine answers without asking for a tool.

mod traits;
mod turn_loop;

#[cfg(test)]
mod proptests;
#[cfg(test)]
pub mod testing;

pub use traits::*;
pub use turn_loop::{ConversationLoop, LoopConfig};

use crate::llm::{ContentBlock, LlmError};
use crate::tools::{ToolError, ToolRegistry};
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Loop wired to the real engine and tool registry
pub type ProductionLoop = ConversationLoop<ServiceLlmClient, Arc<ToolRegistry>>;

/// Where the fixed stylist instruction lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InstructionMode {
    /// Stored once as the first turn of the conversation
    #[default]
    Stateful,
    /// Prepended to every engine request, never stored
    Stateless,
}

impl FromStr for InstructionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stateful" => Ok(Self::Stateful),
            "stateless" => Ok(Self::Stateless),
            other => Err(format!("unknown instruction mode: {other}")),
        }
    }
}

/// Result of a completed turn
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// Content of the final assistant message
    pub reply: Vec<ContentBlock>,
    pub engine_calls: u32,
    /// Tool requests executed before the final message
    pub tool_rounds: u32,
}

/// Failures that end a turn. Nothing is retried.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error(transparent)]
    Tool(#[from] ToolError),
    #[error("engine call failed: {0}")]
    Engine(#[from] LlmError),
    #[error("turn stopped after {0} tool rounds")]
    RoundLimit(u32),
}
