// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Conversation wire types exchanged between client and server

use serde::{Deserialize, Serialize};

use crate::config::LlmSettings;

/// Role of a conversation message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UiRole {
    User,
    Assistant,
    System,
}

/// A message as the client stores and sends it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiMessage {
    pub id: String,
    pub role: UiRole,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_invocations: Vec<ToolInvocation>,
}

/// Lifecycle of a single tool call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InvocationState {
    /// Arguments still streaming
    PartialCall,
    /// Requested, waiting for a result
    Call,
    /// Result attached
    Result,
    /// The turn ended before the call was answered
    Abandoned,
}

/// A tool call requested by the model and, eventually, its result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolInvocation {
    pub state: InvocationState,
    pub tool_call_id: String,
    pub tool_name: String,
    #[serde(default)]
    pub args: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
}

/// Body of `POST /api/chat`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub messages: Vec<UiMessage>,
    #[serde(default)]
    pub settings: LlmSettings,
}

/// Body of `POST /api/models`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelsRequest {
    #[serde(default)]
    pub settings: LlmSettings,
}

fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

impl UiMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            role: UiRole::User,
            content: content.into(),
            tool_invocations: vec![],
        }
    }

    /// An empty assistant message to be filled from a response stream
    pub fn assistant(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: UiRole::Assistant,
            content: String::new(),
            tool_invocations: vec![],
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            role: UiRole::System,
            content: content.into(),
            tool_invocations: vec![],
        }
    }

    /// Invocations still waiting for a result
    pub fn pending_invocations(&self) -> impl Iterator<Item = &ToolInvocation> {
        self.tool_invocations
            .iter()
            .filter(|inv| inv.state == InvocationState::Call)
    }

    /// Find an invocation by its tool call id
    pub fn invocation_mut(&mut self, tool_call_id: &str) -> Option<&mut ToolInvocation> {
        self.tool_invocations
            .iter_mut()
            .find(|inv| inv.tool_call_id == tool_call_id)
    }

    /// Mark every unanswered invocation as abandoned, returning how many changed
    pub fn abandon_pending(&mut self) -> usize {
        let mut abandoned = 0;
        for inv in &mut self.tool_invocations {
            if matches!(
                inv.state,
                InvocationState::Call | InvocationState::PartialCall
            ) {
                inv.state = InvocationState::Abandoned;
                abandoned += 1;
            }
        }
        abandoned
    }
}

impl ToolInvocation {
    /// A freshly requested call
    pub fn call(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        args: serde_json::Value,
    ) -> Self {
        Self {
            state: InvocationState::Call,
            tool_call_id: tool_call_id.into(),
            tool_name: tool_name.into(),
            args,
            result: None,
        }
    }

    /// Attach the result. A call receives at most one result.
    pub fn resolve(&mut self, result: serde_json::Value) -> bool {
        if self.state != InvocationState::Call {
            return false;
        }
        self.result = Some(result);
        self.state = InvocationState::Result;
        true
    }

    /// Whether the attached result reports failure
    pub fn is_error(&self) -> bool {
        self.result
            .as_ref()
            .and_then(|r| r.get("status"))
            .and_then(|s| s.as_str())
            == Some("error")
    }
}
