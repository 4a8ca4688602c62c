//! Session inspection commands

use crate::settings;
use anyhow::{bail, Context, Result};
use banter_core::{SessionStore, StoreBackend};
use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum SessionsCommand {
    /// List stored session identifiers, most recently active first
    List,
    /// Show one session's history and summary
    Show {
        /// Session identifier
        name: String,
    },
    /// Delete a session
    Delete {
        /// Session identifier
        name: String,
    },
}

pub async fn run(command: SessionsCommand) -> Result<()> {
    let config = settings::load_config()?;
    let store = StoreBackend::from_config(&config.store)
        .await
        .context("Failed to open session store")?;

    match command {
        SessionsCommand::List => {
            let names = store.list().await?;
            if names.is_empty() {
                println!("no sessions stored");
            }
            for name in names {
                match store.get(&name).await? {
                    Some(record) => println!("{name}  ({} turns)", record.turn_count()),
                    None => println!("{name}"),
                }
            }
        }
        SessionsCommand::Show { name } => {
            let Some(record) = store.get(&name).await? else {
                bail!("no session named '{name}'");
            };
            println!("session: {}", record.name);
            println!("turns: {}", record.turn_count());
            println!("summary: {}", record.ltm);
            for message in &record.messages {
                println!("  {}: {}", message.role.as_str(), message.content);
            }
        }
        SessionsCommand::Delete { name } => {
            if store.delete(&name).await? {
                println!("deleted '{name}'");
            } else {
                println!("no session named '{name}'");
            }
        }
    }

    Ok(())
}
