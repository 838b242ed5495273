// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Ways for a client session to reach a chat engine

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::Client;
use std::pin::Pin;

use crate::chat::ChatEngine;
use crate::error::{ApiError, Result, ZenithError};
use crate::protocol::{ChatRequest, DataStreamPart, LineDecoder};

/// Decoded parts of one response
pub type TransportStream = Pin<Box<dyn Stream<Item = Result<DataStreamPart>> + Send>>;

#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send one request and stream back the response parts
    async fn send(&self, request: &ChatRequest) -> Result<TransportStream>;
}

/// Talks to a chat server over HTTP
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn send(&self, request: &ChatRequest) -> Result<TransportStream> {
        tracing::debug!(url = %self.endpoint(), messages = request.messages.len(), "posting chat request");

        let response = self.client.post(self.endpoint()).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ZenithError::Api(ApiError::ServerError {
                status: status.as_u16(),
                message,
            }));
        }

        Ok(Box::pin(decode_parts(response)))
    }
}

fn decode_parts(response: reqwest::Response) -> impl Stream<Item = Result<DataStreamPart>> + Send {
    async_stream::try_stream! {
        let mut bytes = response.bytes_stream();
        let mut lines = LineDecoder::new();

        while let Some(chunk) = bytes.next().await {
            let chunk = chunk
                .map_err(|e| ZenithError::Api(ApiError::StreamError(e.to_string())))?;
            for line in lines.push(&chunk) {
                if let Some(part) = DataStreamPart::decode(&line)? {
                    yield part;
                }
            }
        }

        if let Some(line) = lines.finish() {
            if let Some(part) = DataStreamPart::decode(&line)? {
                yield part;
            }
        }
    }
}

/// Drives a [`ChatEngine`] in the same process
#[derive(Debug, Clone)]
pub struct InProcessTransport {
    engine: ChatEngine,
}

impl InProcessTransport {
    pub fn new(engine: ChatEngine) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl ChatTransport for InProcessTransport {
    async fn send(&self, request: &ChatRequest) -> Result<TransportStream> {
        let parts = self.engine.start_turn(request.clone()).await?;
        Ok(Box::pin(parts.map(Ok)))
    }
}
