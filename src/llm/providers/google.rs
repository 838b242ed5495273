// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Google Gemini provider implementation
//!
//! Streams `models/{model}:streamGenerateContent?alt=sse`. Gemini delivers each
//! function call whole and without an id, so ids are minted here as
//! `call_<uuid>` and mapped back to function names when results are sent.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{ApiError, ZenithError};
use crate::llm::message::{ContentBlock, Message, MessageContent, Role};
use crate::llm::provider::{
    CompletionRequest, ContentBlockDelta, ContentBlockResponse, EventStream, LlmProvider,
    StopReason, StreamEvent, ToolDefinition, Usage,
};
use crate::llm::providers::common::{error_from_response, sse_payloads, ErrorDetail};

/// Default Generative Language API endpoint
pub const GOOGLE_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini provider
pub struct GoogleProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GoogleProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, GOOGLE_BASE_URL)
    }

    /// Create with a custom base URL
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, model: &str) -> String {
        let model = model.strip_prefix("models/").unwrap_or(model);
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.base_url, model
        )
    }

    /// Convert messages into Gemini `contents`, returning extra system text
    /// found in the conversation alongside.
    fn convert_messages(&self, messages: &[Message]) -> (Vec<GeminiContent>, Vec<String>) {
        // functionResponse is keyed by name, not id
        let names: HashMap<&str, &str> = messages
            .iter()
            .filter_map(|m| match &m.content {
                MessageContent::Blocks(blocks) => Some(blocks),
                MessageContent::Text(_) => None,
            })
            .flatten()
            .filter_map(|block| match block {
                ContentBlock::ToolUse { id, name, .. } => Some((id.as_str(), name.as_str())),
                _ => None,
            })
            .collect();

        let mut contents = Vec::new();
        let mut system = Vec::new();

        for m in messages {
            let role = match m.role {
                Role::User => "user",
                Role::Assistant => "model",
                Role::System => {
                    if let Some(text) = m.text() {
                        system.push(text.to_string());
                    }
                    continue;
                }
            };

            let parts: Vec<GeminiPart> = m
                .blocks()
                .into_iter()
                .filter_map(|block| match block {
                    ContentBlock::Text { text } if text.is_empty() => None,
                    ContentBlock::Text { text } => Some(GeminiPart::text(text)),
                    ContentBlock::ToolUse { name, input, .. } => Some(GeminiPart {
                        function_call: Some(GeminiFunctionCall { name, args: input }),
                        ..Default::default()
                    }),
                    ContentBlock::ToolResult {
                        tool_use_id,
                        content,
                        ..
                    } => {
                        let name = names
                            .get(tool_use_id.as_str())
                            .map(|n| n.to_string())
                            .unwrap_or_else(|| tool_use_id.clone());
                        Some(GeminiPart {
                            function_response: Some(GeminiFunctionResponse {
                                name,
                                response: response_object(&content),
                            }),
                            ..Default::default()
                        })
                    }
                })
                .collect();

            if !parts.is_empty() {
                contents.push(GeminiContent {
                    role: Some(role.to_string()),
                    parts,
                });
            }
        }

        (contents, system)
    }

    fn convert_tools(&self, tools: &[ToolDefinition]) -> Vec<GeminiTool> {
        if tools.is_empty() {
            return vec![];
        }
        let declarations = tools
            .iter()
            .map(|t| GeminiFunctionDeclaration {
                name: t.name.clone(),
                description: t.description.clone(),
                // Gemini rejects OBJECT schemas with no properties
                parameters: if t.input_schema.is_empty() {
                    None
                } else {
                    Some(serde_json::json!({
                        "type": t.input_schema.schema_type,
                        "properties": t.input_schema.properties,
                        "required": t.input_schema.required,
                    }))
                },
            })
            .collect();
        vec![GeminiTool {
            function_declarations: declarations,
        }]
    }

    fn build_request(&self, request: &CompletionRequest) -> GeminiRequest {
        let (contents, mut system) = self.convert_messages(&request.messages);
        if let Some(sys) = &request.system {
            system.insert(0, sys.clone());
        }

        GeminiRequest {
            contents,
            system_instruction: if system.is_empty() {
                None
            } else {
                Some(GeminiContent {
                    role: None,
                    parts: vec![GeminiPart::text(system.join("\n\n"))],
                })
            },
            tools: self.convert_tools(&request.tools),
            generation_config: GeminiGenerationConfig {
                max_output_tokens: request.max_tokens,
                temperature: request.temperature,
            },
        }
    }
}

/// functionResponse.response must be a JSON object
fn response_object(content: &str) -> serde_json::Value {
    match serde_json::from_str::<serde_json::Value>(content) {
        Ok(value @ serde_json::Value::Object(_)) => value,
        Ok(other) => serde_json::json!({ "output": other }),
        Err(_) => serde_json::json!({ "output": content }),
    }
}

#[async_trait]
impl LlmProvider for GoogleProvider {
    fn name(&self) -> &str {
        "google"
    }

    async fn complete_stream(&self, request: CompletionRequest) -> crate::error::Result<EventStream> {
        let body = self.build_request(&request);
        tracing::debug!(
            model = %request.model,
            contents = body.contents.len(),
            "sending gemini streamGenerateContent request"
        );

        let response = self
            .client
            .post(self.endpoint(&request.model))
            .header(API_KEY_HEADER, &self.api_key)
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
                let chunk: GeminiStreamChunk = serde_json::from_str(&payload).map_err(|e| {
                    ZenithError::Api(ApiError::InvalidResponse(format!(
                        "unparseable gemini chunk: {}",
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

/// Turns Gemini response chunks into [`StreamEvent`]s. Text goes to block 0,
/// each function call gets its own block starting at 1.
#[derive(Debug, Default)]
struct ChunkTranslator {
    started: bool,
    text_open: bool,
    next_tool_index: usize,
    saw_tool_call: bool,
    stopped: bool,
}

impl ChunkTranslator {
    fn translate(&mut self, chunk: GeminiStreamChunk) -> Vec<StreamEvent> {
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
            self.next_tool_index = 1;
            events.push(StreamEvent::MessageStart {
                id: chunk
                    .response_id
                    .clone()
                    .unwrap_or_else(|| format!("gemini-{}", uuid::Uuid::new_v4())),
                model: chunk.model_version.clone().unwrap_or_default(),
            });
        }

        let Some(candidate) = chunk.candidates.into_iter().next() else {
            return events;
        };

        for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
            if let Some(text) = part.text.filter(|t| !t.is_empty()) {
                if !self.text_open {
                    self.text_open = true;
                    events.push(StreamEvent::ContentBlockStart {
                        index: 0,
                        content_block: ContentBlockResponse::Text {
                            text: String::new(),
                        },
                    });
                }
                events.push(StreamEvent::ContentBlockDelta {
                    index: 0,
                    delta: ContentBlockDelta::TextDelta { text },
                });
            }

            if let Some(call) = part.function_call {
                let index = self.next_tool_index;
                self.next_tool_index += 1;
                self.saw_tool_call = true;

                events.push(StreamEvent::ContentBlockStart {
                    index,
                    content_block: ContentBlockResponse::ToolUse {
                        id: format!("call_{}", uuid::Uuid::new_v4().simple()),
                        name: call.name,
                        input: serde_json::Value::Object(serde_json::Map::new()),
                    },
                });
                events.push(StreamEvent::ContentBlockDelta {
                    index,
                    delta: ContentBlockDelta::InputJsonDelta {
                        partial_json: call.args.to_string(),
                    },
                });
                events.push(StreamEvent::ContentBlockStop { index });
            }
        }

        if let Some(reason) = candidate.finish_reason {
            if self.text_open {
                self.text_open = false;
                events.push(StreamEvent::ContentBlockStop { index: 0 });
            }
            self.stopped = true;

            let stop_reason = match reason.as_str() {
                "MAX_TOKENS" => StopReason::MaxTokens,
                _ if self.saw_tool_call => StopReason::ToolUse,
                _ => StopReason::EndTurn,
            };
            events.push(StreamEvent::MessageDelta {
                stop_reason: Some(stop_reason),
                usage: chunk.usage_metadata.map(|u| Usage {
                    input_tokens: u.prompt_token_count,
                    output_tokens: u.candidates_token_count,
                }),
            });
        }

        events
    }

    fn finish(&mut self) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        if self.text_open {
            self.text_open = false;
            events.push(StreamEvent::ContentBlockStop { index: 0 });
        }
        if !self.stopped && self.saw_tool_call {
            events.push(StreamEvent::MessageDelta {
                stop_reason: Some(StopReason::ToolUse),
                usage: None,
            });
        }
        events.push(StreamEvent::MessageStop);
        events
    }
}

// Gemini API types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<GeminiTool>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<GeminiFunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_response: Option<GeminiFunctionResponse>,
}

impl GeminiPart {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiFunctionCall {
    name: String,
    #[serde(default)]
    args: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiFunctionResponse {
    name: String,
    response: serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTool {
    function_declarations: Vec<GeminiFunctionDeclaration>,
}

#[derive(Debug, Serialize)]
struct GeminiFunctionDeclaration {
    name: String,
    description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiStreamChunk {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    usage_metadata: Option<GeminiUsage>,
    #[serde(default)]
    model_version: Option<String>,
    #[serde(default)]
    response_id: Option<String>,
    #[serde(default)]
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}
