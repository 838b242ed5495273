// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use futures::{Stream, StreamExt};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde::Deserialize;

use crate::error::{ApiError, ZenithError};
use crate::protocol::LineDecoder;

/// Default wait reported when a 429 carries no usable Retry-After header
const DEFAULT_RETRY_AFTER_SECS: u32 = 60;

/// Parse numeric Retry-After header (seconds).
pub(crate) fn parse_retry_after_seconds(headers: &HeaderMap) -> Option<u32> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u32>().ok())
}

/// Construct a standardized server error.
pub(crate) fn server_error(status: u16, message: impl Into<String>) -> ZenithError {
    ZenithError::Api(ApiError::ServerError {
        status,
        message: message.into(),
    })
}

/// `{"error": {"message": ..., "code": ...}}`, shared by OpenAI, Groq and Gemini.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorDetail {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub code: Option<serde_json::Value>,
    #[serde(default)]
    pub status: Option<String>,
}

impl ErrorDetail {
    /// Machine-readable error code, whichever field the vendor used
    pub fn code_str(&self) -> String {
        match &self.code {
            Some(serde_json::Value::String(code)) => code.clone(),
            _ => self.status.clone().unwrap_or_default(),
        }
    }
}

/// Map a non-2xx response body onto the error taxonomy.
pub(crate) fn parse_error_body(status: u16, retry_after: Option<u32>, body: &str) -> ZenithError {
    let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) else {
        return match status {
            401 | 403 => ZenithError::Api(ApiError::AuthenticationFailed),
            429 => ZenithError::Api(ApiError::RateLimited(
                retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS),
            )),
            _ => server_error(status, body),
        };
    };

    let detail = envelope.error;
    let code = detail.code_str();
    match code.as_str() {
        "invalid_api_key" | "authentication_error" | "UNAUTHENTICATED" | "PERMISSION_DENIED" => {
            ZenithError::Api(ApiError::AuthenticationFailed)
        }
        "rate_limit_exceeded" | "RESOURCE_EXHAUSTED" => ZenithError::Api(ApiError::RateLimited(
            retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS),
        )),
        "model_not_found" | "NOT_FOUND" => ZenithError::Api(ApiError::ModelNotFound(detail.message)),
        _ => match status {
            401 | 403 => ZenithError::Api(ApiError::AuthenticationFailed),
            429 => ZenithError::Api(ApiError::RateLimited(
                retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS),
            )),
            _ => server_error(status, detail.message),
        },
    }
}

/// Consume a failed response and turn it into an error.
pub(crate) async fn error_from_response(response: reqwest::Response) -> ZenithError {
    let status = response.status().as_u16();
    let retry_after = parse_retry_after_seconds(response.headers());
    let body = response.text().await.unwrap_or_default();
    tracing::debug!(status, body = %body, "provider returned an error response");
    parse_error_body(status, retry_after, &body)
}

/// Extract the payload of an SSE `data:` line. Comments, blank lines and other
/// fields yield `None`.
pub(crate) fn sse_data(line: &str) -> Option<&str> {
    let line = line.trim_end();
    let data = line.strip_prefix("data:")?;
    Some(data.strip_prefix(' ').unwrap_or(data))
}

/// Stream the `data:` payloads of a server-sent-events response.
pub(crate) fn sse_payloads(
    response: reqwest::Response,
) -> impl Stream<Item = Result<String, ZenithError>> + Send {
    async_stream::try_stream! {
        let mut bytes = response.bytes_stream();
        let mut lines = LineDecoder::new();

        while let Some(chunk) = bytes.next().await {
            let chunk = chunk
                .map_err(|e| ZenithError::Api(ApiError::StreamError(e.to_string())))?;
            for line in lines.push(&chunk) {
                if let Some(data) = sse_data(&line) {
                    yield data.to_string();
                }
            }
        }

        if let Some(line) = lines.finish() {
            if let Some(data) = sse_data(&line) {
                yield data.to_string();
            }
        }
    }
}
