// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! OpenAI-compatible chat completions provider
//!
//! Serves both OpenAI and Groq, which speak the same `/chat/completions`
//! protocol and differ only in base URL and key.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{ApiError, ZenithError};
use crate::llm::message::{ContentBlock, Message, MessageContent, Role};
use crate::llm::provider::{
    CompletionRequest, ContentBlockDelta, ContentBlockResponse, EventStream, LlmProvider,
    StopReason, StreamEvent, ToolDefinition, Usage,
};
use crate::llm::providers::common::{error_from_response, sse_payloads};

/// Default OpenAI endpoint
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Groq's OpenAI-compatible endpoint
pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Block index used for streamed text; tool calls start at 1
const TEXT_BLOCK_INDEX: usize = 0;

/// Provider for any OpenAI-compatible chat completions API
pub struct OpenAiCompatProvider {
    client: Client,
    name: String,
    api_key: String,
    base_url: String,
}

impl OpenAiCompatProvider {
    /// Create a provider with an explicit name and base URL
    pub fn new(
        name: impl Into<String>,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            name: name.into(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// OpenAI at its public endpoint
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::new("openai", api_key, OPENAI_BASE_URL)
    }

    /// Groq at its public endpoint
    pub fn groq(api_key: impl Into<String>) -> Self {
        Self::new("groq", api_key, GROQ_BASE_URL)
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Convert internal messages to the OpenAI wire format
    fn convert_messages(&self, messages: &[Message], system: Option<&str>) -> Vec<OpenAiMessage> {
        let mut result = Vec::new();

        if let Some(sys) = system {
            result.push(OpenAiMessage::text("system", sys));
        }

        for m in messages {
            let role = match m.role {
                Role::User => "user",
                Role::Assistant => "assistant",
                Role::System => "system",
            };

            match &m.content {
                MessageContent::Text(text) => {
                    result.push(OpenAiMessage::text(role, text));
                }
                MessageContent::Blocks(blocks) => {
                    let mut text_parts = Vec::new();
                    let mut tool_calls = Vec::new();
                    let mut tool_results = Vec::new();

                    for block in blocks {
                        match block {
                            ContentBlock::Text { text } => text_parts.push(text.clone()),
                            ContentBlock::ToolUse { id, name, input } => {
                                tool_calls.push(OpenAiToolCall {
                                    id: id.clone(),
                                    r#type: "function".to_string(),
                                    function: OpenAiFunctionCall {
                                        name: name.clone(),
                                        arguments: input.to_string(),
                                    },
                                });
                            }
                            ContentBlock::ToolResult {
                                tool_use_id,
                                content,
                                ..
                            } => tool_results.push((tool_use_id.clone(), content.clone())),
                        }
                    }

                    if !tool_calls.is_empty() || !text_parts.is_empty() {
                        result.push(OpenAiMessage {
                            role: role.to_string(),
                            content: if text_parts.is_empty() {
                                None
                            } else {
                                Some(text_parts.join("\n"))
                            },
                            tool_calls: if tool_calls.is_empty() {
                                None
                            } else {
                                Some(tool_calls)
                            },
                            tool_call_id: None,
                        });
                    }

                    // Each result becomes its own `tool` message
                    for (tool_call_id, content) in tool_results {
                        result.push(OpenAiMessage {
                            role: "tool".to_string(),
                            content: Some(content),
                            tool_calls: None,
                            tool_call_id: Some(tool_call_id),
                        });
                    }
                }
            }
        }

        result
    }

    /// Convert tools to the OpenAI function format
    fn convert_tools(&self, tools: &[ToolDefinition]) -> Vec<OpenAiTool> {
        tools
            .iter()
            .map(|t| OpenAiTool {
                r#type: "function".to_string(),
                function: OpenAiFunction {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: serde_json::json!({
                        "type": t.input_schema.schema_type,
                        "properties": t.input_schema.properties,
                        "required": t.input_schema.required,
                    }),
                },
            })
            .collect()
    }

    /// Build the streaming request body
    fn build_request(&self, request: &CompletionRequest) -> OpenAiRequest {
        OpenAiRequest {
            model: request.model.clone(),
            messages: self.convert_messages(&request.messages, request.system.as_deref()),
            max_tokens: Some(request.max_tokens),
            temperature: Some(request.temperature),
            tools: if request.tools.is_empty() {
                None
            } else {
                Some(self.convert_tools(&request.tools))
            },
            stream: true,
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete_stream(&self, request: CompletionRequest) -> crate::error::Result<EventStream> {
        let body = self.build_request(&request);
        tracing::debug!(
            provider = %self.name,
            model = %request.model,
            messages = body.messages.len(),
            "sending chat completion request"
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let mut payloads = Box::pin(sse_payloads(response));
        let stream = async_stream::try_stream! {
            let mut translator = ChunkTranslator::default();

            while let Some(payload) = payloads.next().await {
                let payload = payload?;
                if payload.trim() == "[DONE]" {
                    break;
                }

                let chunk: OpenAiStreamChunk = serde_json::from_str(&payload).map_err(|e| {
                    ZenithError::Api(ApiError::InvalidResponse(format!(
                        "unparseable stream chunk: {}",
                        e
                    )))
                })?;

                for event in translator.translate(chunk) {
                    yield event;
                }
            }

            for event in translator.finish() {
                yield event;
            }
        };

        Ok(Box::pin(stream))
    }
}

/// Turns OpenAI streaming chunks into provider-neutral [`StreamEvent`]s.
///
/// Text is streamed into block 0. Tool call `n` is streamed into block `n + 1`.
#[derive(Debug, Default)]
struct ChunkTranslator {
    started: bool,
    text_open: bool,
    open_tools: BTreeSet<usize>,
    finished: bool,
}

impl ChunkTranslator {
    fn translate(&mut self, chunk: OpenAiStreamChunk) -> Vec<StreamEvent> {
        let mut events = Vec::new();

        if let Some(error) = chunk.error {
            events.push(StreamEvent::Error {
                error_type: error.code_str(),
                message: error.message,
            });
            return events;
        }

        if !self.started {
            self.started = true;
            events.push(StreamEvent::MessageStart {
                id: chunk.id.clone().unwrap_or_default(),
                model: chunk.model.clone().unwrap_or_default(),
            });
        }

        let usage = chunk.usage.map(|u| Usage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        });
        let mut usage_reported = false;

        if let Some(choice) = chunk.choices.into_iter().next() {
            if let Some(text) = choice.delta.content.filter(|t| !t.is_empty()) {
                if !self.text_open {
                    self.text_open = true;
                    events.push(StreamEvent::ContentBlockStart {
                        index: TEXT_BLOCK_INDEX,
                        content_block: ContentBlockResponse::Text {
                            text: String::new(),
                        },
                    });
                }
                events.push(StreamEvent::ContentBlockDelta {
                    index: TEXT_BLOCK_INDEX,
                    delta: ContentBlockDelta::TextDelta { text },
                });
            }

            for tc in choice.delta.tool_calls.unwrap_or_default() {
                let tc_index = tc.index.unwrap_or(0);
                let block_index = tc_index + 1;
                let function = tc.function.unwrap_or_default();

                if self.open_tools.insert(block_index) {
                    events.push(StreamEvent::ContentBlockStart {
                        index: block_index,
                        content_block: ContentBlockResponse::ToolUse {
                            id: tc.id.unwrap_or_else(|| format!("call_{}", tc_index)),
                            name: function.name.unwrap_or_default(),
                            input: serde_json::Value::Object(serde_json::Map::new()),
                        },
                    });
                }

                if let Some(args) = function.arguments.filter(|a| !a.is_empty()) {
                    events.push(StreamEvent::ContentBlockDelta {
                        index: block_index,
                        delta: ContentBlockDelta::InputJsonDelta { partial_json: args },
                    });
                }
            }

            if let Some(reason) = choice.finish_reason {
                self.close_blocks(&mut events);
                self.finished = true;
                usage_reported = usage.is_some();
                events.push(StreamEvent::MessageDelta {
                    stop_reason: Some(map_finish_reason(&reason)),
                    usage,
                });
            }
        }

        // Usage-only trailer chunk with no choices
        if !usage_reported && usage.is_some() && self.finished {
            events.push(StreamEvent::MessageDelta {
                stop_reason: None,
                usage,
            });
        }

        events
    }

    fn close_blocks(&mut self, events: &mut Vec<StreamEvent>) {
        if self.text_open {
            self.text_open = false;
            events.push(StreamEvent::ContentBlockStop {
                index: TEXT_BLOCK_INDEX,
            });
        }
        for index in std::mem::take(&mut self.open_tools) {
            events.push(StreamEvent::ContentBlockStop { index });
        }
    }

    /// Events for the end of the stream
    fn finish(&mut self) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        self.close_blocks(&mut events);
        events.push(StreamEvent::MessageStop);
        events
    }
}

fn map_finish_reason(reason: &str) -> StopReason {
    match reason {
        "length" => StopReason::MaxTokens,
        "tool_calls" | "function_call" => StopReason::ToolUse,
        _ => StopReason::EndTurn,
    }
}

// OpenAI API types

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAiTool>>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct OpenAiMessage {
    role: String,
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OpenAiToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl OpenAiMessage {
    fn text(role: &str, text: &str) -> Self {
        Self {
            role: role.to_string(),
            content: Some(text.to_string()),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct OpenAiToolCall {
    id: String,
    #[serde(rename = "type")]
    r#type: String,
    function: OpenAiFunctionCall,
}

#[derive(Debug, Serialize)]
struct OpenAiFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Serialize)]
struct OpenAiTool {
    #[serde(rename = "type")]
    r#type: String,
    function: OpenAiFunction,
}

#[derive(Debug, Serialize)]
struct OpenAiFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

// Streaming types

#[derive(Debug, Deserialize)]
struct OpenAiStreamChunk {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<OpenAiStreamChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
    #[serde(default)]
    error: Option<crate::llm::providers::common::ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct OpenAiStreamChoice {
    #[serde(default)]
    delta: OpenAiStreamDelta,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OpenAiStreamDelta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<OpenAiStreamToolCall>>,
}

#[derive(Debug, Deserialize)]
struct OpenAiStreamToolCall {
    #[serde(default)]
    index: Option<usize>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    function: Option<OpenAiStreamFunction>,
}

#[derive(Debug, Default, Deserialize)]
struct OpenAiStreamFunction {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}
