// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! CLI argument definitions using Clap
//!
//! Defines all command-line arguments and subcommands for Zenith.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Zenith - coding agent for small web projects
#[derive(Parser, Debug)]
#[command(name = "zenith")]
#[command(version, about = "Coding agent for small web projects")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the chat server
    Serve(ServeArgs),

    /// List the models offered by a provider
    Models(ModelsArgs),

    /// Start an interactive chat session against a server or in-process
    Chat(ChatArgs),
}

/// Arguments for the serve subcommand
#[derive(clap::Args, Debug, Default)]
pub struct ServeArgs {
    /// Address to bind (overrides settings)
    #[arg(long)]
    pub bind: Option<String>,
}

/// Arguments for the models subcommand
#[derive(clap::Args, Debug, Default)]
pub struct ModelsArgs {
    /// Provider to query (google, groq, openai)
    #[arg(short, long)]
    pub provider: Option<String>,
}

/// Arguments for the chat subcommand
#[derive(clap::Args, Debug, Default)]
pub struct ChatArgs {
    /// Chat server URL (overrides settings)
    #[arg(long, conflicts_with = "local")]
    pub server: Option<String>,

    /// Run the chat engine in this process instead of calling a server
    #[arg(long)]
    pub local: bool,

    /// LLM provider to use (google, groq, openai)
    #[arg(short, long)]
    pub provider: Option<String>,

    /// Model to use
    #[arg(short, long)]
    pub model: Option<String>,

    /// Directory holding index.html, style.css and script.js
    #[arg(long, value_name = "DIR")]
    pub project_dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_serve() {
        let cli = Cli::parse_from(["zenith", "-v", "serve", "--bind", "0.0.0.0:8080"]);
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Serve(args) => assert_eq!(args.bind.as_deref(), Some("0.0.0.0:8080")),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_chat_local() {
        let cli = Cli::parse_from([
            "zenith",
            "chat",
            "--local",
            "--provider",
            "groq",
            "--project-dir",
            "site",
        ]);
        match cli.command {
            Commands::Chat(args) => {
                assert!(args.local);
                assert_eq!(args.provider.as_deref(), Some("groq"));
                assert_eq!(args.project_dir, Some(PathBuf::from("site")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_server_conflicts_with_local() {
        assert!(Cli::try_parse_from(["zenith", "chat", "--local", "--server", "http://x"]).is_err());
    }
}
