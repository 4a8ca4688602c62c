//! CLI module for Banter
//!
//! Provides the operator commands:
//! - `chat`: interactive conversation under a session identifier
//! - `sessions`: list, inspect and delete stored sessions
//! - `config`: print the resolved configuration

use clap::{Parser, Subcommand};

pub mod chat;
pub mod config;
pub mod sessions;

/// Banter conversational assistant CLI
#[derive(Parser, Debug)]
#[command(name = "banter")]
#[command(about = "Conversational assistant over an OpenAI-compatible endpoint")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Chat interactively
    Chat(chat::ChatArgs),
    /// Inspect or remove stored sessions
    Sessions {
        #[command(subcommand)]
        command: sessions::SessionsCommand,
    },
    /// Print the resolved configuration
    Config,
}

/// Run the CLI command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Chat(args)) => chat::run(args).await,
        Some(Commands::Sessions { command }) => sessions::run(command).await,
        Some(Commands::Config) => config::run(),
        None => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            cmd.print_help()?;
            println!();
            Ok(())
        }
    }
}
