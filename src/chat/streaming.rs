// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Streaming response handling
//!
//! This module provides testable logic for processing streaming LLM responses.
//! It separates the stream processing logic from the actual I/O operations.

use std::collections::BTreeMap;

use crate::llm::provider::{ContentBlockDelta, ContentBlockResponse, StopReason, StreamEvent, Usage};

/// A content block while it is still streaming
#[derive(Debug)]
enum OpenBlock {
    Text(String),
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
        partial_json: String,
    },
}

/// Accumulator for streaming response content
///
/// Blocks are keyed by their stream index so interleaved deltas from
/// different blocks land in the right place.
#[derive(Debug, Default)]
pub struct StreamAccumulator {
    /// Blocks that have started but not stopped
    open: BTreeMap<usize, OpenBlock>,
    /// Finished content blocks, in completion order
    content_blocks: Vec<ContentBlockResponse>,
    /// Stop reason from the stream
    stop_reason: Option<StopReason>,
    /// Latest usage report
    usage: Usage,
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the completed content blocks
    pub fn content_blocks(&self) -> &[ContentBlockResponse] {
        &self.content_blocks
    }

    /// Get the stop reason
    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    pub fn usage(&self) -> Usage {
        self.usage
    }

    /// Number of completed tool-use blocks
    pub fn tool_use_count(&self) -> usize {
        self.content_blocks
            .iter()
            .filter(|b| matches!(b, ContentBlockResponse::ToolUse { .. }))
            .count()
    }

    /// Process a stream event and report what it means for the output
    pub fn process_event(&mut self, event: StreamEvent) -> StreamEventResult {
        match event {
            StreamEvent::MessageStart { .. } => StreamEventResult::MessageStart,
            StreamEvent::ContentBlockStart {
                index,
                content_block,
            } => {
                let block = match content_block {
                    ContentBlockResponse::Text { text } => OpenBlock::Text(text),
                    ContentBlockResponse::ToolUse { id, name, input } => OpenBlock::ToolUse {
                        id,
                        name,
                        input,
                        partial_json: String::new(),
                    },
                };
                self.open.insert(index, block);
                StreamEventResult::BlockStarted
            }
            StreamEvent::ContentBlockDelta { index, delta } => match delta {
                ContentBlockDelta::TextDelta { text } => {
                    match self.open.get_mut(&index) {
                        Some(OpenBlock::Text(block_text)) => block_text.push_str(&text),
                        _ => {
                            // Delta without a start: open the block implicitly
                            self.open.insert(index, OpenBlock::Text(text.clone()));
                        }
                    }
                    StreamEventResult::TextDelta(text)
                }
                ContentBlockDelta::InputJsonDelta { partial_json } => {
                    if let Some(OpenBlock::ToolUse {
                        partial_json: buffer,
                        ..
                    }) = self.open.get_mut(&index)
                    {
                        buffer.push_str(&partial_json);
                    }
                    StreamEventResult::ToolInputDelta
                }
            },
            StreamEvent::ContentBlockStop { index } => match self.open.remove(&index) {
                Some(OpenBlock::Text(text)) => {
                    self.content_blocks.push(ContentBlockResponse::Text { text });
                    StreamEventResult::BlockStopped
                }
                Some(OpenBlock::ToolUse {
                    id,
                    name,
                    input,
                    partial_json,
                }) => {
                    let input = parse_tool_input(input, &partial_json);
                    self.content_blocks.push(ContentBlockResponse::ToolUse {
                        id: id.clone(),
                        name: name.clone(),
                        input: input.clone(),
                    });
                    StreamEventResult::ToolUseReady { id, name, input }
                }
                None => StreamEventResult::BlockStopped,
            },
            StreamEvent::MessageDelta { stop_reason, usage } => {
                if stop_reason.is_some() {
                    self.stop_reason = stop_reason;
                }
                if let Some(usage) = usage {
                    self.usage = usage;
                }
                StreamEventResult::MessageDelta(stop_reason)
            }
            StreamEvent::MessageStop => StreamEventResult::MessageStop,
            StreamEvent::Error {
                error_type,
                message,
            } => StreamEventResult::Error {
                error_type,
                message,
            },
        }
    }
}

/// Tool arguments: accumulated JSON when it parses to an object, otherwise the
/// input sent with the block start, otherwise `{}`.
fn parse_tool_input(start_input: serde_json::Value, partial_json: &str) -> serde_json::Value {
    let empty = || serde_json::Value::Object(serde_json::Map::new());

    if !partial_json.trim().is_empty() {
        return match serde_json::from_str::<serde_json::Value>(partial_json) {
            Ok(value @ serde_json::Value::Object(_)) => value,
            Ok(_) | Err(_) => {
                tracing::warn!(json = %partial_json, "tool arguments are not a JSON object, using {{}}");
                empty()
            }
        };
    }

    match start_input {
        value @ serde_json::Value::Object(_) => value,
        _ => empty(),
    }
}

/// Result of processing a stream event
#[derive(Debug, Clone)]
pub enum StreamEventResult {
    /// Message started
    MessageStart,
    /// A new content block started
    BlockStarted,
    /// Text delta received (contains the text to display)
    TextDelta(String),
    /// Tool input JSON delta received
    ToolInputDelta,
    /// A tool-use block completed with parsed arguments
    ToolUseReady {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    /// A non-tool content block stopped
    BlockStopped,
    /// Message delta with optional stop reason
    MessageDelta(Option<StopReason>),
    /// Message stopped
    MessageStop,
    /// Error occurred
    Error { error_type: String, message: String },
}

impl StreamEventResult {
    /// Check if this result contains displayable text
    pub fn text(&self) -> Option<&str> {
        match self {
            StreamEventResult::TextDelta(text) => Some(text),
            _ => None,
        }
    }

    /// Check if this is an error
    pub fn is_error(&self) -> bool {
        matches!(self, StreamEventResult::Error { .. })
    }
}

/// Builder for simulating stream events in tests
#[cfg(test)]
pub struct StreamEventBuilder;

#[cfg(test)]
impl StreamEventBuilder {
    /// Create a text block start event
    pub fn text_block_start(index: usize) -> StreamEvent {
        StreamEvent::ContentBlockStart {
            index,
            content_block: ContentBlockResponse::Text {
                text: String::new(),
            },
        }
    }

    /// Create a tool use block start event
    pub fn tool_use_start(index: usize, id: &str, name: &str) -> StreamEvent {
        StreamEvent::ContentBlockStart {
            index,
            content_block: ContentBlockResponse::ToolUse {
                id: id.to_string(),
                name: name.to_string(),
                input: serde_json::json!({}),
            },
        }
    }

    /// Create a text delta event
    pub fn text_delta(index: usize, text: &str) -> StreamEvent {
        StreamEvent::ContentBlockDelta {
            index,
            delta: ContentBlockDelta::TextDelta {
                text: text.to_string(),
            },
        }
    }

    /// Create a tool input delta event
    pub fn input_delta(index: usize, json: &str) -> StreamEvent {
        StreamEvent::ContentBlockDelta {
            index,
            delta: ContentBlockDelta::InputJsonDelta {
                partial_json: json.to_string(),
            },
        }
    }

    /// Create a block stop event
    pub fn block_stop(index: usize) -> StreamEvent {
        StreamEvent::ContentBlockStop { index }
    }

    /// Create a message delta event with stop reason
    pub fn message_delta(stop_reason: Option<StopReason>) -> StreamEvent {
        StreamEvent::MessageDelta {
            stop_reason,
            usage: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_accumulator_new() {
        let acc = StreamAccumulator::new();
        assert!(acc.content_blocks().is_empty());
        assert!(acc.stop_reason().is_none());
    }

    #[test]
    fn test_stream_accumulator_text_block() {
        let mut acc = StreamAccumulator::new();

        let result = acc.process_event(StreamEventBuilder::text_block_start(0));
        assert!(matches!(result, StreamEventResult::BlockStarted));

        let result = acc.process_event(StreamEventBuilder::text_delta(0, "Hello "));
        assert_eq!(result.text(), Some("Hello "));
        acc.process_event(StreamEventBuilder::text_delta(0, "World"));

        let result = acc.process_event(StreamEventBuilder::block_stop(0));
        assert!(matches!(result, StreamEventResult::BlockStopped));

        assert_eq!(
            acc.content_blocks(),
            &[ContentBlockResponse::Text {
                text: "Hello World".to_string()
            }]
        );
    }

    #[test]
    fn test_tool_use_ready_with_fragmented_json() {
        let mut acc = StreamAccumulator::new();
        acc.process_event(StreamEventBuilder::tool_use_start(1, "call_1", "patch_file"));
        acc.process_event(StreamEventBuilder::input_delta(1, "{\"target\":"));
        acc.process_event(StreamEventBuilder::input_delta(1, "\"css\"}"));

        match acc.process_event(StreamEventBuilder::block_stop(1)) {
            StreamEventResult::ToolUseReady { id, name, input } => {
                assert_eq!(id, "call_1");
                assert_eq!(name, "patch_file");
                assert_eq!(input, serde_json::json!({"target": "css"}));
            }
            other => panic!("Expected ToolUseReady, got {:?}", other),
        }
        assert_eq!(acc.tool_use_count(), 1);
    }

    #[test]
    fn test_interleaved_blocks_stay_separate() {
        let mut acc = StreamAccumulator::new();
        acc.process_event(StreamEventBuilder::text_block_start(0));
        acc.process_event(StreamEventBuilder::tool_use_start(1, "a", "read_files"));
        acc.process_event(StreamEventBuilder::tool_use_start(2, "b", "read_console_logs"));
        acc.process_event(StreamEventBuilder::input_delta(2, "{}"));
        acc.process_event(StreamEventBuilder::text_delta(0, "Checking"));
        acc.process_event(StreamEventBuilder::input_delta(1, "{}"));

        let first = acc.process_event(StreamEventBuilder::block_stop(2));
        assert!(matches!(first, StreamEventResult::ToolUseReady { ref id, .. } if id == "b"));
        let second = acc.process_event(StreamEventBuilder::block_stop(1));
        assert!(matches!(second, StreamEventResult::ToolUseReady { ref id, .. } if id == "a"));
        acc.process_event(StreamEventBuilder::block_stop(0));

        assert_eq!(acc.content_blocks().len(), 3);
    }

    #[test]
    fn test_invalid_or_empty_tool_json_becomes_empty_object() {
        assert_eq!(
            parse_tool_input(serde_json::json!({}), "{not json"),
            serde_json::json!({})
        );
        assert_eq!(parse_tool_input(serde_json::json!({}), ""), serde_json::json!({}));
        assert_eq!(parse_tool_input(serde_json::json!({}), "[1]"), serde_json::json!({}));
        assert_eq!(
            parse_tool_input(serde_json::json!({"target": "html"}), ""),
            serde_json::json!({"target": "html"})
        );
    }

    #[test]
    fn test_stop_reason_not_cleared_by_usage_trailer() {
        let mut acc = StreamAccumulator::new();
        acc.process_event(StreamEventBuilder::message_delta(Some(StopReason::ToolUse)));
        acc.process_event(StreamEvent::MessageDelta {
            stop_reason: None,
            usage: Some(Usage {
                input_tokens: 7,
                output_tokens: 3,
            }),
        });

        assert_eq!(acc.stop_reason(), Some(StopReason::ToolUse));
        assert_eq!(acc.usage().input_tokens, 7);
    }

    #[test]
    fn test_error_event() {
        let mut acc = StreamAccumulator::new();
        let result = acc.process_event(StreamEvent::Error {
            error_type: "overloaded".to_string(),
            message: "try later".to_string(),
        });
        assert!(result.is_error());
    }
}
