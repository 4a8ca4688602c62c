//! Conversation paywall gate
//!
//! Callers that meter access check the gate before running an exchange.
//! Once a session's history reaches the threshold, the gate answers in
//! a deflecting persona instead of the real one and never touches the
//! session record, so the conversation stays frozen where the limit
//! caught it.

use crate::error::{Error, Result};
use crate::orchestrator::ExchangeStream;
use crate::session::SessionRecord;
use banter_llm::{CompletionProvider, CompletionRequest, Message};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Default history length at which the gate closes
pub const DEFAULT_GATE_THRESHOLD: usize = 5;

/// Default deflection persona
pub const DEFAULT_GATE_PERSONA: &str = "No matter what the user says, you will pretend \
     you didn't hear it because you were busy doing other things. Make it light-hearted, \
     play dumb, aloof, and redirect them to the contact page: https://example.com/connect";

fn default_threshold() -> usize {
    DEFAULT_GATE_THRESHOLD
}

fn default_persona() -> String {
    DEFAULT_GATE_PERSONA.to_string()
}

/// Gate settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// History length at which exchanges start deflecting
    #[serde(default = "default_threshold")]
    pub threshold: usize,

    /// System instructions for the deflection reply
    #[serde(default = "default_persona")]
    pub persona: String,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            persona: default_persona(),
        }
    }
}

/// Outcome of a gate check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Run the full exchange
    Open,
    /// Answer with the deflection persona; leave the session untouched
    Deflect,
}

/// Paywall gate over conversation exchanges
pub struct ExchangeGate {
    config: GateConfig,
    provider: Arc<dyn CompletionProvider>,
    model: String,
}

impl ExchangeGate {
    /// Create a gate answering deflections through `provider`
    pub fn new(
        config: GateConfig,
        provider: Arc<dyn CompletionProvider>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            config,
            provider,
            model: model.into(),
        }
    }

    /// Decide whether `record` may still run full exchanges
    #[must_use]
    pub fn assess(&self, record: &SessionRecord) -> GateDecision {
        if record.turn_count() >= self.config.threshold {
            debug!(
                identifier = %record.name,
                turns = record.turn_count(),
                threshold = self.config.threshold,
                "Gate closed; deflecting"
            );
            GateDecision::Deflect
        } else {
            GateDecision::Open
        }
    }

    fn deflection_request(&self, user_text: &str) -> CompletionRequest {
        CompletionRequest::new(&self.model)
            .with_message(Message::system(&self.config.persona))
            .with_message(Message::user(user_text))
    }

    /// Stream a deflection reply; the session record is not involved
    pub fn deflect_streaming(&self, user_text: &str) -> ExchangeStream {
        let request = self.deflection_request(user_text);
        self.provider
            .complete_streaming(request)
            .map(|item| item.map_err(Error::from))
            .boxed()
    }

    /// Produce a deflection reply in one piece
    pub async fn deflect(&self, user_text: &str) -> Result<String> {
        let request = self.deflection_request(user_text);
        let response = self.provider.complete(request).await?;
        Ok(response.content)
    }
}
