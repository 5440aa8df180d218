//! Conversation state: the append-only turn log replayed on every engine call

use crate::llm::{ContentBlock, Turn};
use serde::Serialize;

/// Ordered log of turns for one session.
///
/// Only the conversation loop appends; everyone else reads.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub(crate) fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Turns as they are sent to the engine.
    ///
    /// A tool request is only replayed when the very next turn carries its
    /// result. Requests left behind by an aborted turn (or ignored because an
    /// earlier request in the same message was acted on) are dropped, and an
    /// assistant message with nothing left is skipped entirely. The stored log
    /// is not modified.
    pub fn replay(&self) -> Vec<Turn> {
        let mut out = Vec::with_capacity(self.turns.len());

        for (i, turn) in self.turns.iter().enumerate() {
            let Turn::AssistantMessage { content } = turn else {
                out.push(turn.clone());
                continue;
            };

            let answered = match self.turns.get(i + 1) {
                Some(Turn::ToolResult { tool_use_id, .. }) => Some(tool_use_id.as_str()),
                _ => None,
            };

            let kept: Vec<ContentBlock> = content
                .iter()
                .filter(|block| match block {
                    ContentBlock::Text { .. } => true,
                    ContentBlock::ToolRequest { tool_use_id, .. } => {
                        answered == Some(tool_use_id.as_str())
                    }
                })
                .cloned()
                .collect();

            if !kept.is_empty() {
                out.push(Turn::AssistantMessage { content: kept });
            }
        }

        out
    }
}
