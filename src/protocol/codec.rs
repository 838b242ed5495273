// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Data stream codec
//!
//! Each part travels as one line, `<code>:<json>\n`. The server writes parts as
//! the model produces them; the client decodes them with [`LineDecoder`] +
//! [`DataStreamPart::decode`].

use serde::{Deserialize, Serialize};

use crate::error::{ApiError, Result, ZenithError};
use crate::llm::provider::Usage;

/// Header advertising the data stream protocol version
pub const DATA_STREAM_HEADER: &str = "x-vercel-ai-data-stream";

/// Protocol version sent in [`DATA_STREAM_HEADER`]
pub const DATA_STREAM_VERSION: &str = "v1";

/// One part of a streamed chat response
#[derive(Debug, Clone, PartialEq)]
pub enum DataStreamPart {
    /// Text delta from the model (`0`)
    Text(String),
    /// Complete tool call request (`9`)
    ToolCall(ToolCallPart),
    /// Error that ended the response (`3`)
    Error(String),
    /// Start of a generation step (`f`)
    StartStep { message_id: String },
    /// End of a generation step (`e`)
    FinishStep(FinishStepPart),
    /// End of the response (`d`)
    FinishMessage(FinishMessagePart),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallPart {
    pub tool_call_id: String,
    pub tool_name: String,
    #[serde(default)]
    pub args: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishStepPart {
    pub finish_reason: FinishReason,
    #[serde(default)]
    pub usage: TokenUsage,
    #[serde(default)]
    pub is_continued: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishMessagePart {
    pub finish_reason: FinishReason,
    #[serde(default)]
    pub usage: TokenUsage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    Error,
    Timeout,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl From<Usage> for TokenUsage {
    fn from(usage: Usage) -> Self {
        Self {
            prompt_tokens: usage.input_tokens,
            completion_tokens: usage.output_tokens,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartStepPayload {
    message_id: String,
}

impl DataStreamPart {
    /// Wire code for this part
    pub fn code(&self) -> char {
        match self {
            DataStreamPart::Text(_) => '0',
            DataStreamPart::ToolCall(_) => '9',
            DataStreamPart::Error(_) => '3',
            DataStreamPart::StartStep { .. } => 'f',
            DataStreamPart::FinishStep(_) => 'e',
            DataStreamPart::FinishMessage(_) => 'd',
        }
    }

    /// Encode as a single newline-terminated line
    pub fn encode(&self) -> Result<String> {
        let payload = match self {
            DataStreamPart::Text(text) | DataStreamPart::Error(text) => {
                serde_json::to_string(text)?
            }
            DataStreamPart::ToolCall(call) => serde_json::to_string(call)?,
            DataStreamPart::StartStep { message_id } => serde_json::to_string(&StartStepPayload {
                message_id: message_id.clone(),
            })?,
            DataStreamPart::FinishStep(finish) => serde_json::to_string(finish)?,
            DataStreamPart::FinishMessage(finish) => serde_json::to_string(finish)?,
        };
        Ok(format!("{}:{}\n", self.code(), payload))
    }

    /// Decode one line. Unknown codes are skipped and yield `None`.
    pub fn decode(line: &str) -> Result<Option<Self>> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            return Ok(None);
        }

        let (code, payload) = line.split_once(':').ok_or_else(|| {
            ZenithError::Api(ApiError::InvalidResponse(format!(
                "malformed stream line: {}",
                line
            )))
        })?;

        let invalid = |e: serde_json::Error| {
            ZenithError::Api(ApiError::InvalidResponse(format!(
                "invalid payload for part '{}': {}",
                code, e
            )))
        };

        let part = match code {
            "0" => DataStreamPart::Text(serde_json::from_str(payload).map_err(invalid)?),
            "9" => DataStreamPart::ToolCall(serde_json::from_str(payload).map_err(invalid)?),
            "3" => DataStreamPart::Error(serde_json::from_str(payload).map_err(invalid)?),
            "f" => {
                let start: StartStepPayload = serde_json::from_str(payload).map_err(invalid)?;
                DataStreamPart::StartStep {
                    message_id: start.message_id,
                }
            }
            "e" => DataStreamPart::FinishStep(serde_json::from_str(payload).map_err(invalid)?),
            "d" => DataStreamPart::FinishMessage(serde_json::from_str(payload).map_err(invalid)?),
            other => {
                tracing::debug!(code = other, "skipping unknown data stream part");
                return Ok(None);
            }
        };
        Ok(Some(part))
    }
}

/// Splits a byte stream into lines.
///
/// Bytes are buffered until a newline arrives so multi-byte characters split
/// across network chunks decode intact.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return every complete line it finished
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let rest = self.buffer.split_off(pos + 1);
            let mut line = std::mem::replace(&mut self.buffer, rest);
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        lines
    }

    /// Flush a trailing line that was not newline-terminated
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.buffer);
        Some(String::from_utf8_lossy(&line).into_owned())
    }
}
