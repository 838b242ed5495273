// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Server-side chat handling
//!
//! This module turns a client's conversation into a provider request and the
//! provider's streamed answer into data stream parts.

pub mod convert;
pub mod engine;
pub mod prompt;
pub mod streaming;

pub use convert::{convert_history, tool_rounds_since_last_user, ConvertedHistory};
pub use engine::{ChatEngine, PartStream, TIMEOUT_MESSAGE};
pub use prompt::{build_system_prompt, SYSTEM_PROMPT};
pub use streaming::{StreamAccumulator, StreamEventResult};
