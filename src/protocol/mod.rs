// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Client/server chat protocol
//!
//! Request bodies and the line-oriented data stream used for responses.

pub mod codec;
pub mod ui;

pub use codec::{
    DataStreamPart, FinishMessagePart, FinishReason, FinishStepPart, LineDecoder, TokenUsage,
    ToolCallPart, DATA_STREAM_HEADER, DATA_STREAM_VERSION,
};
pub use ui::{ChatRequest, InvocationState, ModelsRequest, ToolInvocation, UiMessage, UiRole};
