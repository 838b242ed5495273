// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! HTTP surface of the chat server
//!
//! - `POST /api/chat`: one generation step, streamed as data stream parts
//! - `POST /api/models`: model catalog for the posted settings
//! - `GET /health`: liveness probe

mod routes;

use axum::routing::{get, post};
use axum::Router;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::chat::ChatEngine;
use crate::error::Result;
use crate::llm::ModelCatalog;

/// Shared state handed to every handler
#[derive(Debug, Clone)]
pub struct ServerState {
    pub engine: ChatEngine,
    pub catalog: ModelCatalog,
}

impl ServerState {
    pub fn new(engine: ChatEngine, catalog: ModelCatalog) -> Self {
        Self { engine, catalog }
    }
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/api/chat", post(routes::chat))
        .route("/api/models", post(routes::models))
        .route("/health", get(routes::health))
        .with_state(Arc::new(state))
}

/// Serve until `shutdown` resolves, letting in-flight responses finish
pub async fn serve(
    listener: TcpListener,
    state: ServerState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!("Chat server listening on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            shutdown.await;
            tracing::info!("Chat server shutting down");
        })
        .await?;

    Ok(())
}
