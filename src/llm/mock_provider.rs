// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Mock LLM provider for testing
//!
//! Provides a scripted implementation of the LlmProvider trait that can be
//! used in tests and offline runs without making real API calls.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::LlmSettings;
use crate::error::{ApiError, Result, ZenithError};
use crate::llm::factory::{ModelHandle, ProviderResolver};
use crate::llm::provider::{
    CompletionRequest, ContentBlockDelta, ContentBlockResponse, EventStream, LlmProvider,
    StopReason, StreamEvent, Usage,
};

/// A mock LLM provider for testing
#[derive(Clone)]
pub struct MockProvider {
    /// Provider name
    name: String,
    /// Scripted responses, one per call
    responses: Arc<Mutex<Vec<MockResponse>>>,
    /// Call counter
    call_count: Arc<AtomicUsize>,
    /// Recorded requests
    recorded_requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

/// A pre-configured response for the mock provider
#[derive(Clone, Debug)]
pub struct MockResponse {
    /// Text content to return
    pub text: String,
    /// Tool calls to return
    pub tool_calls: Vec<MockToolCall>,
    /// Stop reason
    pub stop_reason: StopReason,
    /// Token usage
    pub usage: Usage,
    /// Failure to inject instead of (or part way through) the response
    pub failure: Option<MockFailure>,
}

/// A mock tool call
#[derive(Clone, Debug)]
pub struct MockToolCall {
    /// Tool call ID
    pub id: String,
    /// Tool name
    pub name: String,
    /// Tool input (JSON)
    pub input: serde_json::Value,
}

/// Ways a scripted response can go wrong
#[derive(Clone, Debug)]
pub enum MockFailure {
    /// `complete_stream` itself fails
    Request(String),
    /// The stream yields an error after the text
    MidStream(String),
    /// The stream starts, then never produces another event
    Stall,
}

impl Default for MockResponse {
    fn default() -> Self {
        Self {
            text: "Mock response".to_string(),
            tool_calls: vec![],
            stop_reason: StopReason::EndTurn,
            usage: Usage {
                input_tokens: 10,
                output_tokens: 20,
            },
            failure: None,
        }
    }
}

impl MockResponse {
    /// Plain text answer
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// A single tool call with a generated id
    pub fn tool_call(name: impl Into<String>, input: serde_json::Value) -> Self {
        Self::tool_calls(vec![MockToolCall {
            id: format!("call_{}", uuid::Uuid::new_v4().simple()),
            name: name.into(),
            input,
        }])
    }

    /// Several tool calls in one step
    pub fn tool_calls(calls: Vec<MockToolCall>) -> Self {
        Self {
            text: String::new(),
            tool_calls: calls,
            stop_reason: StopReason::ToolUse,
            ..Default::default()
        }
    }

    /// Prepend text to a response
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Response whose stream starts and then hangs
    pub fn stalled() -> Self {
        Self {
            text: String::new(),
            failure: Some(MockFailure::Stall),
            ..Default::default()
        }
    }

    /// Response that fails before streaming
    pub fn request_error(message: impl Into<String>) -> Self {
        Self {
            failure: Some(MockFailure::Request(message.into())),
            ..Default::default()
        }
    }

    /// Response that streams `text` then errors
    pub fn stream_error(text: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            failure: Some(MockFailure::MidStream(message.into())),
            ..Default::default()
        }
    }
}

impl MockToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, input: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            input,
        }
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("Mock provider lock was poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

impl MockProvider {
    /// Create a new mock provider
    pub fn new() -> Self {
        Self {
            name: "mock".to_string(),
            responses: Arc::new(Mutex::new(vec![MockResponse::default()])),
            call_count: Arc::new(AtomicUsize::new(0)),
            recorded_requests: Arc::new(Mutex::new(vec![])),
        }
    }

    /// Create a mock provider with a custom name
    pub fn with_name(name: impl Into<String>) -> Self {
        let mut provider = Self::new();
        provider.name = name.into();
        provider
    }

    /// Set the text response
    pub fn with_response(self, text: impl Into<String>) -> Self {
        self.with_script(vec![MockResponse::text(text)])
    }

    /// Queue responses, returned in order. Once the script runs out the last
    /// response repeats.
    pub fn with_script(self, script: Vec<MockResponse>) -> Self {
        {
            let mut responses = lock(&self.responses);
            responses.clear();
            responses.extend(script);
        }
        self
    }

    /// Get the number of times complete_stream() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Get all recorded requests
    pub fn recorded_requests(&self) -> Vec<CompletionRequest> {
        lock(&self.recorded_requests).clone()
    }

    /// Get the last request made
    pub fn last_request(&self) -> Option<CompletionRequest> {
        lock(&self.recorded_requests).last().cloned()
    }

    /// Reset call count and recorded requests
    pub fn reset(&self) {
        self.call_count.store(0, Ordering::SeqCst);
        lock(&self.recorded_requests).clear();
    }

    /// Get the next response
    fn next_response(&self) -> MockResponse {
        let count = self.call_count.fetch_add(1, Ordering::SeqCst);
        let responses = lock(&self.responses);
        if responses.is_empty() {
            MockResponse::default()
        } else {
            responses[count.min(responses.len() - 1)].clone()
        }
    }

    fn events(model: &str, response: MockResponse) -> Vec<Result<StreamEvent>> {
        let mut events = vec![Ok(StreamEvent::MessageStart {
            id: format!("msg_{}", uuid::Uuid::new_v4().simple()),
            model: model.to_string(),
        })];

        if !response.text.is_empty() {
            events.push(Ok(StreamEvent::ContentBlockStart {
                index: 0,
                content_block: ContentBlockResponse::Text {
                    text: String::new(),
                },
            }));

            // Stream the text in chunks
            for chunk in response.text.chars().collect::<Vec<_>>().chunks(10) {
                let text: String = chunk.iter().collect();
                events.push(Ok(StreamEvent::ContentBlockDelta {
                    index: 0,
                    delta: ContentBlockDelta::TextDelta { text },
                }));
            }

            events.push(Ok(StreamEvent::ContentBlockStop { index: 0 }));
        }

        if let Some(MockFailure::MidStream(message)) = &response.failure {
            events.push(Err(ZenithError::Api(ApiError::StreamError(message.clone()))));
            return events;
        }

        for (i, tool_call) in response.tool_calls.into_iter().enumerate() {
            let index = i + 1;
            events.push(Ok(StreamEvent::ContentBlockStart {
                index,
                content_block: ContentBlockResponse::ToolUse {
                    id: tool_call.id,
                    name: tool_call.name,
                    input: serde_json::Value::Object(serde_json::Map::new()),
                },
            }));

            // Arguments arrive in fragments, like a real provider
            let json = tool_call.input.to_string();
            let chars: Vec<char> = json.chars().collect();
            for fragment in chars.chunks(16) {
                events.push(Ok(StreamEvent::ContentBlockDelta {
                    index,
                    delta: ContentBlockDelta::InputJsonDelta {
                        partial_json: fragment.iter().collect(),
                    },
                }));
            }
            events.push(Ok(StreamEvent::ContentBlockStop { index }));
        }

        events.push(Ok(StreamEvent::MessageDelta {
            stop_reason: Some(response.stop_reason),
            usage: Some(response.usage),
        }));
        events.push(Ok(StreamEvent::MessageStop));
        events
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete_stream(&self, request: CompletionRequest) -> Result<EventStream> {
        lock(&self.recorded_requests).push(request.clone());

        let response = self.next_response();
        match &response.failure {
            Some(MockFailure::Request(message)) => {
                return Err(ZenithError::Api(ApiError::ServerError {
                    status: 500,
                    message: message.clone(),
                }));
            }
            Some(MockFailure::Stall) => {
                let start = Self::events(&request.model, MockResponse::text(""))
                    .into_iter()
                    .take(1);
                return Ok(Box::pin(stream::iter(start).chain(stream::pending())));
            }
            _ => {}
        }

        Ok(Box::pin(stream::iter(Self::events(&request.model, response))))
    }
}

/// Resolves every request to this mock once the settings pass the usual
/// provider and credential checks.
impl ProviderResolver for MockProvider {
    fn resolve(&self, settings: &LlmSettings) -> Result<ModelHandle> {
        let (_, config) = settings.active()?;
        Ok(ModelHandle {
            provider: Arc::new(self.clone()),
            model: config.model.clone(),
        })
    }
}
