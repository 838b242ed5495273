// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Interactive chat loop for the `chat` subcommand

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use crossterm::{
    style::{Color, ResetColor, SetForegroundColor},
    ExecutableCommand,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use zenith::agent::{
    AgentSession, ChatTransport, HttpTransport, InProcessTransport, TurnObserver, TurnStop,
};
use zenith::chat::ChatEngine;
use zenith::cli::ChatArgs;
use zenith::config::{ProviderKind, Settings};
use zenith::llm::ProviderFactory;
use zenith::project::{FileTarget, ProjectStore};
use zenith::protocol::ToolInvocation;
use zenith::tools::{notification_channel, NotificationLevel, ToolExecutor};

/// Prints streamed text and tool activity to the terminal
struct TerminalObserver;

impl TerminalObserver {
    fn color(color: Color) {
        let _ = io::stdout().execute(SetForegroundColor(color));
    }

    fn reset() {
        let _ = io::stdout().execute(ResetColor);
    }
}

impl TurnObserver for TerminalObserver {
    fn on_text(&mut self, text: &str) {
        print!("{}", text);
        let _ = io::stdout().flush();
    }

    fn on_tool_call(&mut self, invocation: &ToolInvocation) {
        println!();
        Self::color(Color::DarkGrey);
        print!("  ╭─ ");
        Self::color(Color::Magenta);
        print!("{}", invocation.tool_name);
        if let Some(target) = invocation.args.get("target").and_then(|t| t.as_str()) {
            Self::color(Color::DarkGrey);
            print!(" → ");
            Self::color(Color::Blue);
            print!("{}", target);
        }
        Self::reset();
        println!();
    }

    fn on_tool_result(&mut self, invocation: &ToolInvocation) {
        Self::color(Color::DarkGrey);
        print!("  ╰─ ");
        let message = invocation
            .result
            .as_ref()
            .and_then(|r| r.get("message"))
            .and_then(|m| m.as_str())
            .unwrap_or_default();
        if invocation.is_error() {
            Self::color(Color::Red);
            println!("✗ {}", message);
        } else {
            Self::color(Color::Green);
            println!("✓ {}", if message.is_empty() { "Success" } else { message });
        }
        Self::reset();
    }
}

fn print_help() {
    println!("Type a request and press Enter. Ctrl-C cancels a running turn.");
    println!("  /files   show the project files");
    println!("  /clear   forget the conversation");
    println!("  /exit    quit");
}

pub(crate) async fn run_chat(args: ChatArgs, settings: Settings) -> anyhow::Result<()> {
    let mut llm = settings.client.llm.clone();
    if let Some(provider) = &args.provider {
        let kind: ProviderKind = provider.parse()?;
        llm.select(kind);
    }
    if let Some(model) = &args.model {
        let kind: ProviderKind = llm.selected_provider.parse()?;
        llm.config_mut(kind).model = model.clone();
    }

    let transport: Arc<dyn ChatTransport> = if args.local {
        let engine = ChatEngine::new(Arc::new(ProviderFactory), settings.server.clone());
        Arc::new(InProcessTransport::new(engine))
    } else {
        let url = args
            .server
            .clone()
            .unwrap_or_else(|| settings.client.server_url.clone());
        Arc::new(HttpTransport::new(url))
    };

    let project_dir: Option<PathBuf> = args.project_dir.clone();
    let store = match &project_dir {
        Some(dir) => ProjectStore::load_dir(dir)
            .with_context(|| format!("failed to load project from {}", dir.display()))?,
        None => ProjectStore::default(),
    };

    let (notifier, mut notifications) = notification_channel();
    tokio::spawn(async move {
        while let Some(notification) = notifications.recv().await {
            let color = match notification.level {
                NotificationLevel::Success => Color::Green,
                NotificationLevel::Error => Color::Red,
                NotificationLevel::Info => Color::Cyan,
            };
            let mut stderr = io::stderr();
            let _ = stderr.execute(SetForegroundColor(color));
            eprint!("{}", notification);
            let _ = stderr.execute(ResetColor);
            eprintln!();
        }
    });

    let executor = ToolExecutor::new(store).with_notifier(notifier);
    let mut session = AgentSession::new(transport, executor, llm)
        .with_max_steps(settings.server.max_steps)
        .with_turn_timeout(settings.client.turn_timeout());

    println!(
        "Zenith chat ({} · {})",
        session.settings().selected_provider,
        if args.local { "local" } else { "server" }
    );
    print_help();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("\n> ");
        io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        match input {
            "" => continue,
            "/exit" | "/quit" => break,
            "/help" => {
                print_help();
                continue;
            }
            "/clear" => {
                session.clear();
                println!("Conversation cleared.");
                continue;
            }
            "/files" => {
                for target in FileTarget::ALL {
                    println!("── {} ──", target.file_name());
                    println!("{}", session.executor().store().read(target));
                }
                continue;
            }
            _ => {}
        }

        let cancel = CancellationToken::new();
        let watcher = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            }
        });

        let result = session.send(input, &cancel, &mut TerminalObserver).await;
        watcher.abort();
        println!();

        match result {
            Ok(outcome) => match outcome.stop {
                TurnStop::Completed => {}
                TurnStop::StepLimit => {
                    println!("(stopped after {} steps)", outcome.steps)
                }
                TurnStop::Cancelled => println!("(cancelled)"),
            },
            Err(e) => {
                let _ = io::stdout().execute(SetForegroundColor(Color::Red));
                println!("Error: {}", e);
                let _ = io::stdout().execute(ResetColor);
            }
        }

        if let Some(dir) = &project_dir {
            session
                .executor()
                .store()
                .save_dir(dir)
                .with_context(|| format!("failed to save project to {}", dir.display()))?;
        }
    }

    Ok(())
}
