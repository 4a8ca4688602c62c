//! HTTP client for an OpenAI-compatible completion endpoint
//!
//! Speaks the raw wire contract: POST `{base_url}/chat/completions` with a
//! bearer token and a `{model, messages[, stream]}` body. Blocking calls
//! return the first choice's message content; streaming calls decode the
//! framed chunk sequence into a lazy fragment stream. No retries — a failed
//! call fails the exchange that issued it.

use crate::completion::{CompletionRequest, CompletionResponse};
use crate::error::{Error, Result};
use crate::message::Message;
use crate::provider::{CompletionProvider, FragmentStream};
use crate::sse::{decode_frame, FrameOutcome, LineBuffer, SkipReason};
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Default endpoint base URL (local inference server)
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/v1";

/// Default model identifier
pub const DEFAULT_MODEL: &str = "TheBloke/stablelm-zephyr-3b-GGUF";

/// Placeholder token accepted by unauthenticated local endpoints
pub const DEFAULT_API_KEY: &str = "token";

/// Completion client configuration
#[derive(Clone)]
pub struct ClientConfig {
    /// Endpoint base URL, without the `/chat/completions` suffix
    pub base_url: String,
    /// Bearer token
    pub api_key: String,
    /// Model sent when a request does not name one
    pub model: String,
    /// Request timeout (blocking calls only; streams run until the
    /// terminator or a transport fault)
    pub timeout: Duration,
}

// SECURITY: Custom Debug implementation to mask the bearer token
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &mask_api_key(&self.api_key))
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Mask a bearer token for safe display
pub fn mask_api_key(key: &str) -> String {
    if key.len() <= 8 {
        return "****".to_string();
    }
    format!("{}...{}", &key[..4], &key[key.len() - 4..])
}

/// Sanitize endpoint error messages before they reach logs or users
fn sanitize_api_error(error: &str) -> String {
    let lower = error.to_lowercase();

    if lower.contains("api key")
        || lower.contains("invalid key")
        || lower.contains("unauthorized")
        || lower.contains("authentication")
    {
        return "Endpoint authentication error. Please check your LLM_TOKEN.".to_string();
    }

    if lower.contains("rate limit") || lower.contains("quota") {
        return "Completion endpoint rate limit exceeded. Please wait.".to_string();
    }

    if lower.contains("internal") || lower.contains("server error") {
        return "Completion endpoint server error. Please try again later.".to_string();
    }

    if error.len() < 200 && !lower.contains("bearer") && !lower.contains("token") {
        return error.to_string();
    }

    "An endpoint error occurred. Please try again.".to_string()
}

impl ClientConfig {
    /// Create a new configuration with defaults for everything but the token
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(120),
        }
    }

    /// Create configuration from `LLM_URL`, `LLM_TOKEN` and `LLM_MODEL`.
    ///
    /// Every variable has a default, so this never fails; a missing token
    /// falls back to the local-endpoint placeholder.
    #[must_use]
    pub fn from_env() -> Self {
        let base_url = std::env::var("LLM_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let api_key = std::env::var("LLM_TOKEN").unwrap_or_else(|_| DEFAULT_API_KEY.to_string());
        let model = std::env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        Self {
            base_url,
            api_key,
            model,
            timeout: Duration::from_secs(120),
        }
    }

    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the default model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Completion client over an OpenAI-compatible endpoint
pub struct HttpCompletionClient {
    client: Client,
    config: ClientConfig,
}

// Wire types for the completion endpoint
#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    model: Option<String>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

impl HttpCompletionClient {
    /// Create a new client.
    ///
    /// The timeout is applied per blocking request rather than client-wide;
    /// a stream stays open for as long as the endpoint keeps producing.
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    /// Client over the environment-derived configuration
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(ClientConfig::from_env())
    }

    fn convert_message(msg: &Message) -> ChatMessage {
        ChatMessage {
            role: msg.role.as_str().to_string(),
            content: msg.content.clone(),
        }
    }

    fn resolve_model<'a>(&'a self, request: &'a CompletionRequest) -> &'a str {
        if request.model.is_empty() {
            &self.config.model
        } else {
            &request.model
        }
    }
}

#[async_trait::async_trait]
impl CompletionProvider for HttpCompletionClient {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let chat_request = ChatRequest {
            model: self.resolve_model(&request).to_string(),
            messages: request.messages.iter().map(Self::convert_message).collect(),
            stream: None,
        };

        debug!("Sending completion request");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&chat_request)
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout(self.config.timeout.as_millis() as u64)
                } else {
                    Error::Network(sanitize_api_error(&e.to_string()))
                }
            })?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::Api(sanitize_api_error(&error_text)));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::InvalidResponse(e.to_string()))?;

        let choice = chat_response
            .choices
            .first()
            .ok_or_else(|| Error::InvalidResponse("no choices in response".to_string()))?;

        let content = choice
            .message
            .content
            .clone()
            .ok_or_else(|| Error::InvalidResponse("choice has no message content".to_string()))?;

        Ok(CompletionResponse {
            content,
            finish_reason: choice.finish_reason.clone(),
            model: chat_response.model,
        })
    }

    fn complete_streaming(&self, request: CompletionRequest) -> FragmentStream {
        let client = self.client.clone();
        let config = self.config.clone();
        let model = self.resolve_model(&request).to_string();

        Box::pin(async_stream::stream! {
            let chat_request = ChatRequest {
                model,
                messages: request.messages.iter().map(Self::convert_message).collect(),
                stream: Some(true),
            };

            debug!("Opening completion stream");

            let response = match client
                .post(format!("{}/chat/completions", config.base_url))
                .header("Authorization", format!("Bearer {}", config.api_key))
                .header("Content-Type", "application/json")
                .json(&chat_request)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) => {
                    yield Err(Error::Network(sanitize_api_error(&e.to_string())));
                    return;
                }
            };

            if !response.status().is_success() {
                let error_text = response.text().await.unwrap_or_default();
                yield Err(Error::Api(sanitize_api_error(&error_text)));
                return;
            }

            let mut bytes = response.bytes_stream();
            let mut lines = LineBuffer::new();
            let mut skipped = 0usize;

            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        warn!(error = %e, "transport failed mid-stream");
                        yield Err(Error::Network(sanitize_api_error(&e.to_string())));
                        return;
                    }
                };

                lines.push(&chunk);
                while let Some(line) = lines.next_line() {
                    match decode_frame(&line) {
                        FrameOutcome::Fragment(text) => yield Ok(text),
                        FrameOutcome::Done => {
                            debug!(skipped, "Stream terminator received");
                            return;
                        }
                        FrameOutcome::Skip(SkipReason::Empty) => {}
                        FrameOutcome::Skip(reason) => {
                            debug!(reason = reason.as_str(), "Skipping stream frame");
                            skipped += 1;
                        }
                    }
                }
            }

            // Endpoint closed without a terminator; decode any buffered tail
            if let Some(line) = lines.take_remainder() {
                if let FrameOutcome::Fragment(text) = decode_frame(&line) {
                    yield Ok(text);
                }
            }
            debug!(skipped, "Stream ended without terminator");
        })
    }
}
