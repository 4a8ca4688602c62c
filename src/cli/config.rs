//! Configuration display command

use crate::settings;
use anyhow::Result;
use banter_llm::mask_api_key;

pub fn run() -> Result<()> {
    let config = settings::load_config()?;

    println!("llm:");
    println!("  base_url: {}", config.llm.base_url);
    println!("  api_key: {}", mask_api_key(&config.llm.api_key));
    println!("  model: {}", config.llm.model);
    println!("  timeout_secs: {}", config.llm.timeout_secs);
    println!("knowledge:");
    println!("  query_url: {}", config.knowledge.query_url);
    println!("  timeout_secs: {}", config.knowledge.timeout_secs);
    println!("chat:");
    println!("  limit: {}", config.chat.limit);
    println!("  system_message: {}", config.chat.system_message);
    println!("  summary_instruction: {}", config.chat.summary_instruction);
    println!("  knowledge_results: {}", config.chat.knowledge_results);
    println!("store:");
    println!("  backend: {}", config.store.backend);
    println!("  data_dir: {}", config.store.data_dir);
    println!("gate:");
    println!("  threshold: {}", config.gate.threshold);
    println!("  persona: {}", config.gate.persona);

    Ok(())
}
