// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Zenith - coding agent for three-file web projects.
//!
//! This crate exposes both halves of the agent:
//! - the chat server (`zenith serve`), which turns a conversation into one
//!   streamed model response with tool calls
//! - the client (`zenith chat`), which runs the requested tools against the
//!   project and drives the multi-step turn
//!
//! Architecture highlights:
//! - `llm`: provider abstraction, Gemini and OpenAI-compatible adapters, model catalog
//! - `chat`: server-side step engine, system prompt, history conversion
//! - `protocol`: request bodies and the line-oriented data stream
//! - `server`: axum routes
//! - `project`, `tools`: project buffers, console log, tool dispatch
//! - `agent`: transports and the client turn driver

pub mod agent;
pub mod chat;
pub mod cli;
pub mod config;
pub mod error;
pub mod llm;
pub mod project;
pub mod protocol;
pub mod server;
pub mod tools;

pub use error::{ApiError, Result, ZenithError};
