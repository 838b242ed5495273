// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::StreamExt;
use std::sync::Arc;

use crate::error::ZenithError;
use crate::protocol::{ChatRequest, ModelsRequest, DATA_STREAM_HEADER, DATA_STREAM_VERSION};

use super::ServerState;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Plain-text error body with the status the error maps to
fn error_response(error: &ZenithError) -> Response {
    let status =
        StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        [(header::CONTENT_TYPE, TEXT_PLAIN)],
        error.to_string(),
    )
        .into_response()
}

/// POST /api/chat
pub(super) async fn chat(State(state): State<Arc<ServerState>>, body: Bytes) -> Response {
    let request: ChatRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(error = %e, "rejecting malformed chat request");
            return error_response(&ZenithError::Json(e));
        }
    };

    let parts = match state.engine.start_turn(request).await {
        Ok(parts) => parts,
        Err(e) => {
            tracing::warn!(error = %e, status = e.status_code(), "chat request failed");
            return error_response(&e);
        }
    };

    let body = Body::from_stream(parts.map(|part| part.encode().map(Bytes::from)));

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, TEXT_PLAIN),
            (header::CACHE_CONTROL, "no-cache"),
            (
                header::HeaderName::from_static(DATA_STREAM_HEADER),
                DATA_STREAM_VERSION,
            ),
        ],
        body,
    )
        .into_response()
}

/// POST /api/models
pub(super) async fn models(State(state): State<Arc<ServerState>>, body: Bytes) -> Response {
    let request: ModelsRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => return error_response(&ZenithError::Json(e)),
    };

    let models = state.catalog.list(&request.settings).await;
    tracing::debug!(
        provider = %request.settings.selected_provider,
        count = models.len(),
        "listed models"
    );
    Json(models).into_response()
}

/// GET /health
pub(super) async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok", "service": "zenith" }))
}
