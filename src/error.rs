// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Error types for Zenith
//!
//! This module defines all error types used throughout the application.

use thiserror::Error;

/// Main error type for Zenith operations
#[derive(Error, Debug)]
pub enum ZenithError {
    /// Upstream provider errors (LLM or catalog API)
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// The selected provider has no API key configured
    #[error("API key missing for provider '{0}'")]
    MissingCredential(String),

    /// The selected provider is not one of the recognized backends
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// Tool handler failure
    #[error("Tool execution failed: {0}")]
    ToolExecution(String),

    /// Patch search string was not found in the target buffer
    #[error("Search string not found in {target}")]
    PatchNotFound { target: String },

    /// Patch search string matched more than once
    #[error("Search string is ambiguous in {target}: found {occurrences} occurrences")]
    PatchAmbiguous { target: String, occurrences: usize },

    /// The turn ran past its wall-clock budget
    #[error("Turn exceeded its time limit")]
    TurnTimeout,

    /// The conversation already used every allowed tool round trip
    #[error("Step limit of {0} tool round trips exceeded")]
    StepLimitExceeded(usize),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// API-specific error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Authentication failed (invalid API key)
    #[error("Authentication failed: invalid API key")]
    AuthenticationFailed,

    /// Rate limited by the API
    #[error("Rate limited: retry after {0} seconds")]
    RateLimited(u32),

    /// Requested model not found
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// Invalid response from API
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// API returned an error
    #[error("API error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Streaming error
    #[error("Streaming error: {0}")]
    StreamError(String),
}

impl ZenithError {
    /// HTTP status used when this error ends a chat request
    pub fn status_code(&self) -> u16 {
        match self {
            ZenithError::MissingCredential(_) => 401,
            _ => 500,
        }
    }
}

/// Result type alias for Zenith operations
pub type Result<T> = std::result::Result<T, ZenithError>;
