// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Client side of the agent loop
//!
//! A user turn is a sequence of steps. Each step sends the whole conversation,
//! reads one streamed assistant message and runs the tools it asked for. The
//! turn ends when a step requests no tools, the step budget is spent, or the
//! caller cancels.

use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

use crate::config::LlmSettings;
use crate::error::{ApiError, Result, ZenithError};
use crate::protocol::{
    ChatRequest, DataStreamPart, FinishReason, ToolInvocation, UiMessage,
};
use crate::tools::ToolExecutor;

use super::transport::ChatTransport;

/// Default number of requests a single turn may make
pub const DEFAULT_MAX_STEPS: usize = 5;

/// Output hooks for a running turn.
///
/// Frontends implement this to render text and tool activity as it happens.
pub trait TurnObserver: Send {
    fn on_step_start(&mut self, _step: usize) {}

    fn on_text(&mut self, _text: &str) {}

    fn on_tool_call(&mut self, _invocation: &ToolInvocation) {}

    fn on_tool_result(&mut self, _invocation: &ToolInvocation) {}
}

/// No-op observer for callers that don't need output hooks.
#[derive(Debug, Default)]
pub struct NoopTurnObserver;

impl TurnObserver for NoopTurnObserver {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStop {
    /// The last step requested no tools
    Completed,
    /// Every allowed step was used
    StepLimit,
    /// The cancellation token fired
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnOutcome {
    /// Requests sent during the turn
    pub steps: usize,
    pub stop: TurnStop,
}

/// How a single step's stream ended
enum StepEnd {
    Finished,
    Cancelled,
    Failed(ZenithError),
}

/// Why a running tool was cut short
enum Interrupt {
    Cancelled,
    Expired,
}

/// Conversation state plus everything needed to run turns
pub struct AgentSession {
    messages: Vec<UiMessage>,
    executor: ToolExecutor,
    settings: LlmSettings,
    transport: Arc<dyn ChatTransport>,
    max_steps: usize,
    turn_timeout: Option<Duration>,
}

impl std::fmt::Debug for AgentSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentSession")
            .field("messages", &self.messages.len())
            .field("executor", &self.executor)
            .field("provider", &self.settings.selected_provider)
            .field("max_steps", &self.max_steps)
            .field("turn_timeout", &self.turn_timeout)
            .finish()
    }
}

impl AgentSession {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        executor: ToolExecutor,
        settings: LlmSettings,
    ) -> Self {
        Self {
            messages: Vec::new(),
            executor,
            settings,
            transport,
            max_steps: DEFAULT_MAX_STEPS,
            turn_timeout: None,
        }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    /// Bound the whole turn, tool runs included
    pub fn with_turn_timeout(mut self, turn_timeout: Duration) -> Self {
        self.turn_timeout = Some(turn_timeout);
        self
    }

    pub fn messages(&self) -> &[UiMessage] {
        &self.messages
    }

    pub fn executor(&self) -> &ToolExecutor {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut ToolExecutor {
        &mut self.executor
    }

    pub fn settings(&self) -> &LlmSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut LlmSettings {
        &mut self.settings
    }

    /// Forget the conversation, keeping the project
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Run one user turn to completion, cancellation or failure
    pub async fn send(
        &mut self,
        text: impl Into<String>,
        cancel: &CancellationToken,
        observer: &mut dyn TurnObserver,
    ) -> Result<TurnOutcome> {
        self.messages.push(UiMessage::user(text));

        tracing::info!(
            target: "zenith.agent",
            provider = %self.settings.selected_provider,
            max_steps = self.max_steps,
            "turn start"
        );

        let deadline = self.turn_timeout.map(|timeout| Instant::now() + timeout);
        let expired = expire_at(deadline);
        tokio::pin!(expired);

        for step in 1..=self.max_steps {
            if cancel.is_cancelled() {
                return Ok(self.finish(step - 1, TurnStop::Cancelled));
            }
            observer.on_step_start(step);

            let request = ChatRequest {
                messages: self.messages.clone(),
                settings: self.settings.clone(),
            };
            let mut parts = tokio::select! {
                _ = cancel.cancelled() => return Ok(self.finish(step - 1, TurnStop::Cancelled)),
                _ = &mut expired => {
                    tracing::warn!(target: "zenith.agent", step, "turn deadline expired before the response");
                    return Err(ZenithError::TurnTimeout);
                }
                parts = self.transport.send(&request) => parts?,
            };

            let mut assistant = UiMessage::assistant(format!("msg-{}", uuid::Uuid::new_v4().simple()));
            let mut error_text: Option<String> = None;
            let mut finish_reason: Option<FinishReason> = None;

            let end = loop {
                let part = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break StepEnd::Cancelled,
                    _ = &mut expired => break StepEnd::Failed(ZenithError::TurnTimeout),
                    part = parts.next() => part,
                };
                let part = match part {
                    None => break StepEnd::Finished,
                    Some(Err(e)) => break StepEnd::Failed(e),
                    Some(Ok(part)) => part,
                };

                match part {
                    DataStreamPart::StartStep { message_id } => assistant.id = message_id,
                    DataStreamPart::Text(text) => {
                        observer.on_text(&text);
                        assistant.content.push_str(&text);
                    }
                    DataStreamPart::ToolCall(call) => {
                        let invocation =
                            ToolInvocation::call(call.tool_call_id, call.tool_name, call.args);
                        observer.on_tool_call(&invocation);
                        assistant.tool_invocations.push(invocation);
                    }
                    DataStreamPart::Error(message) => error_text = Some(message),
                    DataStreamPart::FinishStep(_) => {}
                    DataStreamPart::FinishMessage(finish) => {
                        finish_reason = Some(finish.finish_reason)
                    }
                }
            };

            let end = match (end, error_text) {
                (StepEnd::Finished, Some(message)) => {
                    StepEnd::Failed(if finish_reason == Some(FinishReason::Timeout) {
                        ZenithError::TurnTimeout
                    } else {
                        ZenithError::Api(ApiError::StreamError(message))
                    })
                }
                (end, _) => end,
            };

            match end {
                StepEnd::Finished => {}
                StepEnd::Cancelled => {
                    let abandoned = assistant.abandon_pending();
                    tracing::info!(target: "zenith.agent", step, abandoned, "turn cancelled while streaming");
                    self.messages.push(assistant);
                    return Ok(self.finish(step, TurnStop::Cancelled));
                }
                StepEnd::Failed(e) => {
                    assistant.abandon_pending();
                    self.messages.push(assistant);
                    tracing::warn!(target: "zenith.agent", step, error = %e, "turn failed");
                    return Err(e);
                }
            }

            let pending: Vec<(String, String, serde_json::Value)> = assistant
                .pending_invocations()
                .map(|inv| (inv.tool_call_id.clone(), inv.tool_name.clone(), inv.args.clone()))
                .collect();
            self.messages.push(assistant);
            let index = self.messages.len() - 1;

            if pending.is_empty() {
                return Ok(self.finish(step, TurnStop::Completed));
            }

            for (tool_call_id, tool_name, args) in pending {
                if cancel.is_cancelled() {
                    let abandoned = self.messages[index].abandon_pending();
                    tracing::info!(target: "zenith.agent", step, abandoned, "turn cancelled between tools");
                    return Ok(self.finish(step, TurnStop::Cancelled));
                }

                let run = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(Interrupt::Cancelled),
                    _ = &mut expired => Err(Interrupt::Expired),
                    outcome = self.executor.execute(&tool_name, args) => Ok(outcome),
                };
                let outcome = match run {
                    Ok(outcome) => outcome,
                    Err(Interrupt::Cancelled) => {
                        let abandoned = self.messages[index].abandon_pending();
                        tracing::info!(target: "zenith.agent", step, abandoned, tool = %tool_name, "turn cancelled while a tool was running");
                        return Ok(self.finish(step, TurnStop::Cancelled));
                    }
                    Err(Interrupt::Expired) => {
                        let abandoned = self.messages[index].abandon_pending();
                        tracing::warn!(target: "zenith.agent", step, abandoned, tool = %tool_name, "turn deadline expired while a tool was running");
                        return Err(ZenithError::TurnTimeout);
                    }
                };
                if let Some(invocation) = self.messages[index].invocation_mut(&tool_call_id) {
                    if invocation.resolve(outcome.to_value()) {
                        observer.on_tool_result(invocation);
                    }
                }
            }
        }

        Ok(self.finish(self.max_steps, TurnStop::StepLimit))
    }

    fn finish(&self, steps: usize, stop: TurnStop) -> TurnOutcome {
        tracing::info!(
            target: "zenith.agent",
            steps,
            stop = ?stop,
            messages = self.messages.len(),
            "turn complete"
        );
        TurnOutcome { steps, stop }
    }
}

/// Resolves at `deadline`, or never when there is none
async fn expire_at(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}
