//! Application configuration
//!
//! Settings are layered: embedded defaults, then optional `config/*`
//! files, then `BANTER_`-prefixed environment variables. The bare
//! variable names of the original deployment (`LLM_URL`, `LLM_TOKEN`,
//! `CHAT_LIMIT`, ...) are honored last so existing `.env` files keep
//! working unchanged.

use anyhow::{Context, Result};
use banter_core::{GateConfig, OrchestratorConfig, StoreConfig};
use banter_knowledge::IndexConfig;
use banter_llm::ClientConfig;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Embedded default configuration (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Completion endpoint settings
    #[serde(default)]
    pub llm: LlmConfig,
    /// Knowledge index settings
    #[serde(default)]
    pub knowledge: KnowledgeConfig,
    /// Exchange settings
    #[serde(default)]
    pub chat: ChatConfig,
    /// Session store settings
    #[serde(default)]
    pub store: StoreConfig,
    /// Paywall gate settings
    #[serde(default)]
    pub gate: GateConfig,
}

/// Completion endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// OpenAI-compatible base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Bearer token; never printed unmasked
    #[serde(default = "default_api_key")]
    pub api_key: String,
    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,
    /// Blocking request timeout in seconds
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    banter_llm::DEFAULT_BASE_URL.to_string()
}

fn default_api_key() -> String {
    banter_llm::DEFAULT_API_KEY.to_string()
}

fn default_model() -> String {
    banter_llm::DEFAULT_MODEL.to_string()
}

fn default_llm_timeout_secs() -> u64 {
    120
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: default_api_key(),
            model: default_model(),
            timeout_secs: default_llm_timeout_secs(),
        }
    }
}

/// Knowledge index settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Query endpoint URL
    #[serde(default = "default_query_url")]
    pub query_url: String,
    /// Query timeout in seconds
    #[serde(default = "default_knowledge_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_query_url() -> String {
    banter_knowledge::DEFAULT_QUERY_URL.to_string()
}

fn default_knowledge_timeout_secs() -> u64 {
    30
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            query_url: default_query_url(),
            timeout_secs: default_knowledge_timeout_secs(),
        }
    }
}

/// Exchange settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Retained turns per session
    #[serde(default = "default_chat_limit")]
    pub limit: usize,
    /// Persona instructions
    #[serde(default = "default_system_message")]
    pub system_message: String,
    /// Summary refresh instruction
    #[serde(default = "default_summary_instruction")]
    pub summary_instruction: String,
    /// Passages retrieved per exchange
    #[serde(default = "default_knowledge_results")]
    pub knowledge_results: usize,
}

fn default_chat_limit() -> usize {
    banter_core::DEFAULT_CHAT_LIMIT
}

fn default_system_message() -> String {
    banter_core::DEFAULT_SYSTEM_MESSAGE.to_string()
}

fn default_summary_instruction() -> String {
    banter_core::DEFAULT_SUMMARY_INSTRUCTION.to_string()
}

fn default_knowledge_results() -> usize {
    banter_core::DEFAULT_KNOWLEDGE_RESULTS
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            limit: default_chat_limit(),
            system_message: default_system_message(),
            summary_instruction: default_summary_instruction(),
            knowledge_results: default_knowledge_results(),
        }
    }
}

impl AppConfig {
    /// Completion client settings for the configured endpoint
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(&self.llm.api_key)
            .with_base_url(&self.llm.base_url)
            .with_model(&self.llm.model)
            .with_timeout(Duration::from_secs(self.llm.timeout_secs))
    }

    /// Index client settings for the configured knowledge endpoint
    pub fn index_config(&self) -> IndexConfig {
        IndexConfig::new()
            .with_query_url(&self.knowledge.query_url)
            .with_timeout(Duration::from_secs(self.knowledge.timeout_secs))
    }

    /// Orchestrator settings derived from the chat section
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig::default()
            .with_model(&self.llm.model)
            .with_chat_limit(self.chat.limit)
            .with_system_message(&self.chat.system_message)
            .with_summary_instruction(&self.chat.summary_instruction)
            .with_knowledge_results(self.chat.knowledge_results)
    }
}

/// Load configuration from files and environment
pub fn load_config() -> Result<AppConfig> {
    let config = Config::builder()
        // 1. Embedded defaults (always available)
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
        // 2. External overrides (optional)
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name("config/local").required(false))
        // 3. Environment variables (highest priority)
        // config-rs 0.14 reuses separator() after the prefix unless told
        // otherwise; the explicit "_" keeps the BANTER_LLM__X spelling.
        .add_source(
            Environment::with_prefix("BANTER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    let mut config: AppConfig = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    apply_legacy_env(&mut config)?;
    Ok(config)
}

/// Overlay the unprefixed variable names of the original deployment
fn apply_legacy_env(config: &mut AppConfig) -> Result<()> {
    if let Ok(url) = std::env::var("LLM_URL") {
        config.llm.base_url = url;
    }
    if let Ok(token) = std::env::var("LLM_TOKEN") {
        config.llm.api_key = token;
    }
    if let Ok(model) = std::env::var("LLM_MODEL") {
        config.llm.model = model;
    }
    if let Ok(url) = std::env::var("KNOWLEDGE_URL") {
        config.knowledge.query_url = url;
    }
    if let Ok(dir) = std::env::var("DATA_FOLDER") {
        config.store.data_dir = dir;
    }
    if let Ok(limit) = std::env::var("CHAT_LIMIT") {
        config.chat.limit = limit
            .parse()
            .with_context(|| format!("CHAT_LIMIT must be an integer, got '{limit}'"))?;
    }
    if let Ok(message) = std::env::var("SYSTEM_MESSAGE") {
        config.chat.system_message = message;
    }
    if let Ok(instruction) = std::env::var("LTM_SYSTEM_MESSAGE") {
        config.chat.summary_instruction = instruction;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_defaults_parse() {
        let config: AppConfig = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.llm.base_url, "http://localhost:8080/v1");
        assert_eq!(config.llm.model, "TheBloke/stablelm-zephyr-3b-GGUF");
        assert_eq!(config.chat.limit, 20);
        assert_eq!(config.chat.knowledge_results, 5);
        assert_eq!(config.store.backend, "sqlite");
        assert_eq!(config.store.data_dir, "_data");
        assert_eq!(config.gate.threshold, 5);
    }

    #[test]
    fn test_component_config_conversions() {
        let app = AppConfig {
            llm: LlmConfig {
                base_url: "http://llm:9000/v1".to_string(),
                api_key: "secret".to_string(),
                model: "m1".to_string(),
                timeout_secs: 5,
            },
            ..serde_json::from_str("{}").unwrap()
        };

        let client = app.client_config();
        assert_eq!(client.base_url, "http://llm:9000/v1");
        assert_eq!(client.model, "m1");

        let orchestrator = app.orchestrator_config();
        assert_eq!(orchestrator.model, "m1");
        assert_eq!(orchestrator.chat_limit, 20);
    }
}
