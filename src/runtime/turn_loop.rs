//! Turn driver: engine call, inspect, maybe run one tool, repeat

use super::traits::{LlmClient, ToolExecutor};
use super::{InstructionMode, TurnError, TurnOutcome};
use crate::conversation::Conversation;
use crate::llm::{first_tool_request, ContentBlock, LlmRequest, ToolRequest, ToolSpec, Turn};

/// Loop settings fixed for the process lifetime
#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub instruction: String,
    pub mode: InstructionMode,
    pub max_tool_rounds: u32,
    pub max_tokens: Option<u32>,
}

/// Where a turn currently stands
#[derive(Debug, Clone, PartialEq)]
enum LoopState {
    AwaitingEngine,
    EngineResponded { content: Vec<ContentBlock> },
    ToolRequested { request: ToolRequest },
    Final { content: Vec<ContentBlock> },
}

/// Drives one conversation turn at a time.
///
/// Holds no per-session data, so a single instance serves every session;
/// the caller hands in the `Conversation` and must not run two turns on the
/// same one concurrently.
pub struct ConversationLoop<L, T>
where
    L: LlmClient,
    T: ToolExecutor,
{
    llm: L,
    tools: T,
    tool_specs: Vec<ToolSpec>,
    config: LoopConfig,
}

impl<L, T> ConversationLoop<L, T>
where
    L: LlmClient,
    T: ToolExecutor,
{
    pub fn new(llm: L, tools: T, config: LoopConfig) -> Self {
        let tool_specs = tools.definitions();
        Self {
            llm,
            tools,
            tool_specs,
            config,
        }
    }

    /// Tool declarations advertised on every engine call
    pub fn tool_specs(&self) -> &[ToolSpec] {
        &self.tool_specs
    }

    /// Append the user's input and run the turn to completion.
    pub async fn run_turn(
        &self,
        conversation: &mut Conversation,
        user_text: impl Into<String>,
    ) -> Result<TurnOutcome, TurnError> {
        if self.config.mode == InstructionMode::Stateful && conversation.is_empty() {
            conversation.push(Turn::user(self.config.instruction.clone()));
        }
        conversation.push(Turn::user(user_text));
        self.drive(conversation).await
    }

    /// Run engine/tool rounds until the engine returns a message without a
    /// tool request.
    ///
    /// Appends one assistant message per engine call and one tool result per
    /// executed request. On failure the turn stops where it is; no tool
    /// result is written for a request that did not succeed.
    pub async fn drive(&self, conversation: &mut Conversation) -> Result<TurnOutcome, TurnError> {
        let mut state = LoopState::AwaitingEngine;
        let mut engine_calls: u32 = 0;
        let mut tool_rounds: u32 = 0;

        loop {
            state = match state {
                LoopState::AwaitingEngine => {
                    let content = self.call_engine(conversation).await?;
                    engine_calls += 1;
                    conversation.push(Turn::assistant(content.clone()));
                    LoopState::EngineResponded { content }
                }

                LoopState::EngineResponded { content } => match first_tool_request(&content) {
                    Some(request) => LoopState::ToolRequested { request },
                    None => LoopState::Final { content },
                },

                LoopState::ToolRequested { request } => {
                    if tool_rounds >= self.config.max_tool_rounds {
                        tracing::warn!(
                            limit = self.config.max_tool_rounds,
                            tool = %request.name,
                            "Tool round limit reached"
                        );
                        return Err(TurnError::RoundLimit(self.config.max_tool_rounds));
                    }

                    tracing::debug!(
                        tool = %request.name,
                        tool_use_id = %request.tool_use_id,
                        "Executing requested tool"
                    );
                    let payload = self
                        .tools
                        .execute(&request.name, request.input)
                        .await?;

                    conversation.push(Turn::tool_success(request.tool_use_id, payload));
                    tool_rounds += 1;
                    LoopState::AwaitingEngine
                }

                LoopState::Final { content } => {
                    tracing::debug!(
                        model = %self.llm.model_id(),
                        engine_calls,
                        tool_rounds,
                        "Turn complete"
                    );
                    return Ok(TurnOutcome {
                        reply: content,
                        engine_calls,
                        tool_rounds,
                    });
                }
            };
        }
    }

    async fn call_engine(&self, conversation: &Conversation) -> Result<Vec<ContentBlock>, TurnError> {
        let mut messages = Vec::with_capacity(conversation.len() + 1);
        if self.config.mode == InstructionMode::Stateless {
            messages.push(Turn::user(self.config.instruction.clone()));
        }
        messages.extend(conversation.replay());

        let request = LlmRequest {
            messages,
            tools: self.tool_specs.clone(),
            max_tokens: self.config.max_tokens,
        };

        let response = self.llm.complete(&request).await?;
        Ok(response.content)
    }
}
