//! Property-based tests for the conversation loop
//!
//! Whatever sequence of tool requests the engine produces, every tool result
//! written to the conversation answers the request in the assistant message
//! directly before it, and there is exactly one result per executed request.

use super::testing::{payload, text_response, tool_response, MockLlmClient, MockToolExecutor};
use super::{ConversationLoop, InstructionMode, LoopConfig};
use crate::conversation::Conversation;
use crate::llm::{first_tool_request, ContentBlock, LlmResponse, Turn, Usage};
use proptest::prelude::*;
use serde_json::json;
use std::sync::Arc;

/// One engine response that asks for a tool, possibly padded with extra blocks
fn arb_tool_step() -> impl Strategy<Value = (String, bool, bool)> {
    (
        prop_oneof![
            Just("get_today_date".to_string()),
            Just("search_tool".to_string()),
        ],
        any::<bool>(), // leading text block
        any::<bool>(), // trailing second request
    )
}

fn step_response(index: usize, step: &(String, bool, bool)) -> LlmResponse {
    let (name, leading_text, second_request) = step;
    let mut response = tool_response(&format!("tu_{index}"), name, json!({"query": "dress"}));
    if *leading_text {
        response.content.insert(0, ContentBlock::text("Let me check."));
    }
    if *second_request {
        response.content.push(ContentBlock::tool_request(
            format!("tu_{index}_extra"),
            "get_today_date",
            json!({}),
        ));
    }
    response
}

fn run_turns(steps: &[(String, bool, bool)], final_empty: bool) -> (Conversation, usize) {
    let llm = Arc::new(MockLlmClient::new("test-model"));
    for (i, step) in steps.iter().enumerate() {
        llm.queue_response(step_response(i, step));
    }
    if final_empty {
        llm.queue_response(LlmResponse {
            content: vec![],
            end_turn: true,
            usage: Usage::default(),
        });
    } else {
        llm.queue_response(text_response("Here are some picks."));
    }

    let tools = Arc::new(
        MockToolExecutor::new()
            .with_tool("get_today_date", payload(json!({"today": "2024-06-01"})))
            .with_tool("search_tool", payload(json!({"results": []}))),
    );
    let runtime = ConversationLoop::new(
        llm,
        tools.clone(),
        LoopConfig {
            instruction: "Be stylish.".to_string(),
            mode: InstructionMode::Stateful,
            max_tool_rounds: 32,
            max_tokens: None,
        },
    );

    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let mut conv = Conversation::default();
    rt.block_on(runtime.run_turn(&mut conv, "What should I wear?"))
        .unwrap();

    (conv, tools.recorded_executions().len())
}

proptest! {
    #[test]
    fn tool_results_pair_with_preceding_request(
        steps in prop::collection::vec(arb_tool_step(), 0..8),
        final_empty in any::<bool>(),
    ) {
        let (conv, executed) = run_turns(&steps, final_empty);
        let turns = conv.turns();

        let results = turns
            .iter()
            .filter(|t| matches!(t, Turn::ToolResult { .. }))
            .count();
        prop_assert_eq!(results, executed);
        prop_assert_eq!(results, steps.len());

        for (i, turn) in turns.iter().enumerate() {
            if let Turn::ToolResult { tool_use_id, .. } = turn {
                prop_assert!(i > 0);
                let Turn::AssistantMessage { content } = &turns[i - 1] else {
                    return Err(TestCaseError::fail("tool result not preceded by assistant message"));
                };
                let request = first_tool_request(content);
                prop_assert_eq!(request.map(|r| r.tool_use_id), Some(tool_use_id.clone()));
            }
        }

        // Instruction + user input, two turns per round trip, one final answer
        prop_assert_eq!(turns.len(), 2 + 2 * steps.len() + 1);
        let is_final_assistant = matches!(turns.last(), Some(Turn::AssistantMessage { content }) if first_tool_request(content).is_none());
        prop_assert!(is_final_assistant);
    }

    #[test]
    fn replay_never_carries_unanswered_requests(
        steps in prop::collection::vec(arb_tool_step(), 0..8),
    ) {
        let (conv, _) = run_turns(&steps, false);
        let replay = conv.replay();

        for (i, turn) in replay.iter().enumerate() {
            if let Turn::AssistantMessage { content } = turn {
                for block in content {
                    if let ContentBlock::ToolRequest { tool_use_id, .. } = block {
                        let answered = matches!(
                            replay.get(i + 1),
                            Some(Turn::ToolResult { tool_use_id: id, .. }) if id == tool_use_id
                        );
                        prop_assert!(answered);
                    }
                }
            }
        }
    }
}
