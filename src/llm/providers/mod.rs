// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! LLM provider implementations

pub(crate) mod common;
pub mod google;
pub mod openai;

pub use google::GoogleProvider;
pub use openai::OpenAiCompatProvider;
