//! Orchestrator configuration

use serde::{Deserialize, Serialize};

/// Default number of retained turns per session
pub const DEFAULT_CHAT_LIMIT: usize = 20;

/// Default persona instructions
pub const DEFAULT_SYSTEM_MESSAGE: &str = "You are a helpful assistant.";

/// Default summarization instruction
pub const DEFAULT_SUMMARY_INSTRUCTION: &str = "Summarize the conversation.";

/// Default number of knowledge passages retrieved per exchange
pub const DEFAULT_KNOWLEDGE_RESULTS: usize = 5;

fn default_chat_limit() -> usize {
    DEFAULT_CHAT_LIMIT
}

fn default_system_message() -> String {
    DEFAULT_SYSTEM_MESSAGE.to_string()
}

fn default_summary_instruction() -> String {
    DEFAULT_SUMMARY_INSTRUCTION.to_string()
}

fn default_knowledge_results() -> usize {
    DEFAULT_KNOWLEDGE_RESULTS
}

/// Settings that shape every exchange
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Model identifier sent with completions; empty means the
    /// provider's configured default
    #[serde(default)]
    pub model: String,

    /// Maximum retained turns per session (chat limit N)
    #[serde(default = "default_chat_limit")]
    pub chat_limit: usize,

    /// Persona instructions the system message starts with
    #[serde(default = "default_system_message")]
    pub system_message: String,

    /// Instruction driving the long-term summary refresh
    #[serde(default = "default_summary_instruction")]
    pub summary_instruction: String,

    /// Passages requested from the knowledge index per exchange
    #[serde(default = "default_knowledge_results")]
    pub knowledge_results: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            model: String::new(),
            chat_limit: default_chat_limit(),
            system_message: default_system_message(),
            summary_instruction: default_summary_instruction(),
            knowledge_results: default_knowledge_results(),
        }
    }
}

impl OrchestratorConfig {
    /// Load settings from the `CHAT_LIMIT`, `SYSTEM_MESSAGE` and
    /// `LTM_SYSTEM_MESSAGE` environment variables, with defaults for
    /// anything unset
    pub fn from_env() -> crate::error::Result<Self> {
        let mut config = Self::default();

        if let Ok(limit) = std::env::var("CHAT_LIMIT") {
            config.chat_limit = limit.parse().map_err(|_| crate::error::Error::InvalidConfig {
                field: "CHAT_LIMIT".to_string(),
                message: format!("expected an integer, got '{limit}'"),
            })?;
        }
        if let Ok(system_message) = std::env::var("SYSTEM_MESSAGE") {
            config.system_message = system_message;
        }
        if let Ok(summary_instruction) = std::env::var("LTM_SYSTEM_MESSAGE") {
            config.summary_instruction = summary_instruction;
        }

        Ok(config)
    }

    /// Set the model identifier
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the chat limit
    #[must_use]
    pub fn with_chat_limit(mut self, chat_limit: usize) -> Self {
        self.chat_limit = chat_limit;
        self
    }

    /// Set the persona instructions
    #[must_use]
    pub fn with_system_message(mut self, system_message: impl Into<String>) -> Self {
        self.system_message = system_message.into();
        self
    }

    /// Set the summary refresh instruction
    #[must_use]
    pub fn with_summary_instruction(mut self, summary_instruction: impl Into<String>) -> Self {
        self.summary_instruction = summary_instruction.into();
        self
    }

    /// Set the number of passages retrieved per exchange
    #[must_use]
    pub fn with_knowledge_results(mut self, knowledge_results: usize) -> Self {
        self.knowledge_results = knowledge_results;
        self
    }
}
