// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Zenith - coding agent for small web projects
//!
//! Entry point for the Zenith CLI application.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use zenith::chat::ChatEngine;
use zenith::cli::{Cli, Commands, ModelsArgs, ServeArgs};
use zenith::config::{ProviderKind, Settings};
use zenith::llm::{ModelCatalog, ProviderFactory};
use zenith::server::{self, ServerState};

#[path = "main/repl.rs"]
mod repl;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize tracing
    let mut env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::WARN.into());

    // `-v` turns on Zenith diagnostics without knowing target names; `RUST_LOG` still applies.
    if cli.verbose > 0 {
        if let Ok(parsed) = "zenith=debug".parse() {
            env_filter = env_filter.add_directive(parsed);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    // Load settings
    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => Settings::load().with_context(|| {
            format!(
                "failed to load settings from {}",
                Settings::default_path().display()
            )
        })?,
    };
    settings.apply_env();

    match cli.command {
        Commands::Serve(args) => run_serve(args, settings).await,
        Commands::Models(args) => run_models(args, settings).await,
        Commands::Chat(args) => repl::run_chat(args, settings).await,
    }
}

/// Run the HTTP server until Ctrl-C
async fn run_serve(args: ServeArgs, settings: Settings) -> anyhow::Result<()> {
    let bind = args.bind.unwrap_or_else(|| settings.server.bind.clone());
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {}", bind))?;

    let engine = ChatEngine::new(Arc::new(ProviderFactory), settings.server.clone());
    let state = ServerState::new(engine, ModelCatalog::new());

    println!("Zenith server listening on http://{}", listener.local_addr()?);
    server::serve(listener, state, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await?;
    Ok(())
}

/// Print the catalog for the selected provider
async fn run_models(args: ModelsArgs, settings: Settings) -> anyhow::Result<()> {
    let mut llm = settings.client.llm;
    if let Some(provider) = args.provider {
        let kind: ProviderKind = provider.parse().with_context(|| {
            format!(
                "expected one of: {}",
                ProviderFactory::supported_providers().join(", ")
            )
        })?;
        llm.select(kind);
    }

    let models = ModelCatalog::new().list(&llm).await;
    if models.is_empty() {
        println!(
            "No models available for '{}'. Is an API key configured?",
            llm.selected_provider
        );
        return Ok(());
    }

    let width = models.iter().map(|m| m.id.len()).max().unwrap_or(0);
    for model in models {
        println!("{:<width$}  {}", model.id, model.name, width = width);
    }
    Ok(())
}
