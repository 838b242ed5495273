// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Server side of the agent loop
//!
//! One request is one generation step: the engine resolves a provider from the
//! request's settings, streams a single completion and translates it into data
//! stream parts. Tool calls are forwarded to the client, which runs them and
//! sends the results back in its next request.

use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};

use crate::config::ServerConfig;
use crate::error::{Result, ZenithError};
use crate::llm::provider::{CompletionRequest, EventStream, StopReason, ToolDefinition};
use crate::llm::ProviderResolver;
use crate::protocol::{
    ChatRequest, DataStreamPart, FinishMessagePart, FinishReason, FinishStepPart, TokenUsage,
    ToolCallPart,
};
use crate::tools::tool_definitions;

use super::convert::{convert_history, tool_rounds_since_last_user};
use super::streaming::{StreamAccumulator, StreamEventResult};

/// Message sent in the error part when the deadline passes
pub const TIMEOUT_MESSAGE: &str = "Turn exceeded its time limit";

/// Data stream parts for one response
pub type PartStream = Pin<Box<dyn Stream<Item = DataStreamPart> + Send>>;

/// Runs generation steps for incoming chat requests
#[derive(Clone)]
pub struct ChatEngine {
    resolver: Arc<dyn ProviderResolver>,
    config: ServerConfig,
    turn_timeout: Duration,
    tools: Arc<Vec<ToolDefinition>>,
}

impl std::fmt::Debug for ChatEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatEngine")
            .field("config", &self.config)
            .field("turn_timeout", &self.turn_timeout)
            .field("tools", &self.tools.len())
            .finish()
    }
}

impl ChatEngine {
    pub fn new(resolver: Arc<dyn ProviderResolver>, config: ServerConfig) -> Self {
        let turn_timeout = config.turn_timeout();
        Self {
            resolver,
            config,
            turn_timeout,
            tools: Arc::new(tool_definitions()),
        }
    }

    /// Override the per-response deadline
    pub fn with_turn_timeout(mut self, turn_timeout: Duration) -> Self {
        self.turn_timeout = turn_timeout;
        self
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Validate the request and open the provider stream.
    ///
    /// Errors returned here happen before any part is produced. Failures after
    /// that point are reported in-band as an error part followed by a finish part.
    pub async fn start_turn(&self, request: ChatRequest) -> Result<PartStream> {
        let handle = self.resolver.resolve(&request.settings)?;

        let rounds = tool_rounds_since_last_user(&request.messages);
        if rounds >= self.config.max_steps {
            tracing::warn!(
                target: "zenith.chat.engine",
                rounds,
                max_steps = self.config.max_steps,
                "refusing request past the step limit"
            );
            return Err(ZenithError::StepLimitExceeded(self.config.max_steps));
        }

        let history = convert_history(&request.messages);
        let completion = CompletionRequest::new(handle.model.clone(), history.messages)
            .with_system(history.system)
            .with_tools(self.tools.as_ref().clone())
            .with_max_tokens(self.config.max_tokens)
            .with_temperature(self.config.temperature);

        tracing::info!(
            target: "zenith.chat.engine",
            provider = handle.provider.name(),
            model = %handle.model,
            messages = request.messages.len(),
            rounds,
            "chat turn start"
        );

        let deadline = Instant::now() + self.turn_timeout;
        let events = match timeout_at(deadline, handle.provider.complete_stream(completion)).await
        {
            Ok(events) => events?,
            Err(_) => return Err(ZenithError::TurnTimeout),
        };

        Ok(translate(events, deadline))
    }
}

fn finish_message(reason: FinishReason, usage: TokenUsage) -> DataStreamPart {
    DataStreamPart::FinishMessage(FinishMessagePart {
        finish_reason: reason,
        usage,
    })
}

fn translate(mut events: EventStream, deadline: Instant) -> PartStream {
    Box::pin(async_stream::stream! {
        yield DataStreamPart::StartStep {
            message_id: format!("msg-{}", uuid::Uuid::new_v4().simple()),
        };

        let mut accumulator = StreamAccumulator::new();
        loop {
            let next = match timeout_at(deadline, events.next()).await {
                Ok(next) => next,
                Err(_) => {
                    tracing::warn!(target: "zenith.chat.engine", "turn deadline expired");
                    yield DataStreamPart::Error(TIMEOUT_MESSAGE.to_string());
                    yield finish_message(FinishReason::Timeout, accumulator.usage().into());
                    return;
                }
            };

            let event = match next {
                Some(Ok(event)) => event,
                Some(Err(e)) => {
                    tracing::warn!(target: "zenith.chat.engine", error = %e, "provider stream failed");
                    yield DataStreamPart::Error(e.to_string());
                    yield finish_message(FinishReason::Error, accumulator.usage().into());
                    return;
                }
                None => break,
            };

            match accumulator.process_event(event) {
                StreamEventResult::TextDelta(text) => {
                    yield DataStreamPart::Text(text);
                }
                StreamEventResult::ToolUseReady { id, name, input } => {
                    tracing::debug!(target: "zenith.chat.engine", tool = %name, "tool call requested");
                    yield DataStreamPart::ToolCall(ToolCallPart {
                        tool_call_id: id,
                        tool_name: name,
                        args: input,
                    });
                }
                StreamEventResult::Error { error_type, message } => {
                    tracing::warn!(target: "zenith.chat.engine", %error_type, %message, "provider reported an error");
                    yield DataStreamPart::Error(format!("{}: {}", error_type, message));
                    yield finish_message(FinishReason::Error, accumulator.usage().into());
                    return;
                }
                StreamEventResult::MessageStop => break,
                _ => {}
            }
        }

        let reason = if accumulator.tool_use_count() > 0 {
            FinishReason::ToolCalls
        } else if accumulator.stop_reason() == Some(StopReason::MaxTokens) {
            FinishReason::Length
        } else {
            FinishReason::Stop
        };
        let usage: TokenUsage = accumulator.usage().into();

        tracing::info!(
            target: "zenith.chat.engine",
            finish_reason = ?reason,
            tool_calls = accumulator.tool_use_count(),
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            "chat turn complete"
        );

        yield DataStreamPart::FinishStep(FinishStepPart {
            finish_reason: reason,
            usage,
            is_continued: false,
        });
        yield finish_message(reason, usage);
    })
}
