//! Interactive chat command

use crate::settings;
use anyhow::{Context, Result};
use banter_core::{
    ExchangeGate, GateDecision, Orchestrator, SessionStore, StoreBackend,
};
use banter_knowledge::{HttpPassageIndex, Retriever};
use banter_llm::{CompletionProvider, HttpCompletionClient};
use clap::Args;
use futures::StreamExt;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Session identifier to converse under
    #[arg(long, default_value = "cli")]
    pub session: String,

    /// Wait for whole replies instead of streaming fragments
    #[arg(long)]
    pub no_stream: bool,

    /// Meter this conversation through the paywall gate
    #[arg(long)]
    pub gated: bool,
}

pub async fn run(args: ChatArgs) -> Result<()> {
    let config = settings::load_config()?;

    let provider: Arc<dyn CompletionProvider> =
        Arc::new(HttpCompletionClient::new(config.client_config()));
    let retriever = Retriever::new(Arc::new(HttpPassageIndex::new(config.index_config())));
    let store: Arc<dyn SessionStore> = Arc::new(
        StoreBackend::from_config(&config.store)
            .await
            .context("Failed to open session store")?,
    );

    let orchestrator = Orchestrator::new(
        provider.clone(),
        retriever,
        store.clone(),
        config.orchestrator_config(),
    );
    let gate = args
        .gated
        .then(|| ExchangeGate::new(config.gate.clone(), provider.clone(), config.llm.model.clone()));

    println!("Chatting as '{}'. Ctrl-D or /quit to exit.", args.session);

    let stdin = io::stdin();
    loop {
        print!("you> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            println!();
            break;
        }
        let text = line.trim_end_matches(['\n', '\r']);
        if text == "/quit" {
            break;
        }

        if let Some(gate) = &gate {
            let record = store.get_or_create(&args.session).await?;
            if gate.assess(&record) == GateDecision::Deflect {
                if args.no_stream {
                    let reply = gate.deflect(text).await?;
                    println!("bot> {reply}");
                } else {
                    print!("bot> ");
                    io::stdout().flush()?;
                    render_stream(gate.deflect_streaming(text)).await?;
                }
                continue;
            }
        }

        if args.no_stream {
            match orchestrator.exchange(&args.session, text).await {
                Ok(reply) => println!("bot> {reply}"),
                Err(e) => eprintln!("error: {e}"),
            }
        } else {
            print!("bot> ");
            io::stdout().flush()?;
            render_stream(orchestrator.exchange_streaming(&args.session, text)).await?;
        }
    }

    Ok(())
}

/// Print fragments as they arrive; a faulted stream ends the reply early
async fn render_stream(mut stream: banter_core::ExchangeStream) -> Result<()> {
    while let Some(item) = stream.next().await {
        match item {
            Ok(fragment) => {
                print!("{fragment}");
                io::stdout().flush()?;
            }
            Err(e) => {
                println!();
                eprintln!("error: {e}");
                return Ok(());
            }
        }
    }
    println!();
    Ok(())
}
