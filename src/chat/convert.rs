// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Conversion of client conversation history into provider messages

use crate::llm::message::{ContentBlock, Message};
use crate::protocol::{InvocationState, ToolInvocation, UiMessage, UiRole};

use super::prompt::build_system_prompt;

/// Result text recorded for calls that never received an answer
pub const ABANDONED_RESULT: &str = "Tool call was abandoned before it completed";

/// Provider-ready history
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedHistory {
    pub system: String,
    pub messages: Vec<Message>,
}

/// Convert UI messages into provider messages plus the full system prompt.
///
/// Each assistant message becomes an assistant message with its text and
/// tool-use blocks, followed by one message holding the tool results.
/// Invocations still waiting for a result are dropped.
pub fn convert_history(messages: &[UiMessage]) -> ConvertedHistory {
    let mut system_sections = Vec::new();
    let mut converted = Vec::with_capacity(messages.len());

    for message in messages {
        match message.role {
            UiRole::System => system_sections.push(message.content.as_str()),
            UiRole::User => converted.push(Message::user(message.content.clone())),
            UiRole::Assistant => convert_assistant(message, &mut converted),
        }
    }

    ConvertedHistory {
        system: build_system_prompt(system_sections),
        messages: converted,
    }
}

fn convert_assistant(message: &UiMessage, out: &mut Vec<Message>) {
    let mut blocks = Vec::new();
    let mut results = Vec::new();

    if !message.content.is_empty() {
        blocks.push(ContentBlock::Text {
            text: message.content.clone(),
        });
    }

    for invocation in &message.tool_invocations {
        let Some(result) = result_block(invocation) else {
            tracing::warn!(
                tool_call_id = %invocation.tool_call_id,
                tool = %invocation.tool_name,
                "dropping tool call without a result"
            );
            continue;
        };
        blocks.push(ContentBlock::ToolUse {
            id: invocation.tool_call_id.clone(),
            name: invocation.tool_name.clone(),
            input: invocation.args.clone(),
        });
        results.push(result);
    }

    if blocks.is_empty() {
        return;
    }
    out.push(Message::assistant_blocks(blocks));
    if !results.is_empty() {
        out.push(Message::tool_results(results));
    }
}

fn result_block(invocation: &ToolInvocation) -> Option<ContentBlock> {
    match invocation.state {
        InvocationState::Result => {
            let content = invocation
                .result
                .as_ref()
                .map(|value| value.to_string())
                .unwrap_or_else(|| "null".to_string());
            Some(ContentBlock::ToolResult {
                tool_use_id: invocation.tool_call_id.clone(),
                content,
                is_error: invocation.is_error(),
            })
        }
        InvocationState::Abandoned => Some(ContentBlock::ToolResult {
            tool_use_id: invocation.tool_call_id.clone(),
            content: ABANDONED_RESULT.to_string(),
            is_error: true,
        }),
        InvocationState::Call | InvocationState::PartialCall => None,
    }
}

/// Assistant messages carrying tool calls since the last user message
pub fn tool_rounds_since_last_user(messages: &[UiMessage]) -> usize {
    messages
        .iter()
        .rev()
        .take_while(|m| m.role != UiRole::User)
        .filter(|m| m.role == UiRole::Assistant && !m.tool_invocations.is_empty())
        .count()
}
