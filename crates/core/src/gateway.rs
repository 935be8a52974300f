//! Generative Model Gateway
//!
//! This module defines the single capability the engine needs from a language
//! model, `generate(system instruction, turns, output cap) -> text`, and an
//! implementation backed by the Gemini `generateContent` REST endpoint.
//!
//! The gateway never retries. Failures are classified so that callers can tell
//! transient unavailability apart from hard errors.

use crate::session::{Role, Turn};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::{fmt, time::Duration};
use tracing::{debug, warn};

/// Output cap applied to conversational replies.
pub const CHAT_MAX_OUTPUT_TOKENS: u32 = 100;

/// A single call to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    pub system_instruction: Option<String>,
    /// Conversation sent as context, oldest first.
    pub turns: Vec<Turn>,
    /// `None` leaves the output length to the model's own default.
    pub max_output_tokens: Option<u32>,
}

/// Errors raised by an upstream model call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpstreamError {
    #[error("upstream rate limit exceeded")]
    RateLimited,
    #[error("upstream unavailable (status {status})")]
    Unavailable { status: u16 },
    #[error("upstream request timed out")]
    Timeout,
    #[error("upstream transport error: {0}")]
    Transport(String),
    #[error("upstream rejected the request (status {status}): {message}")]
    Api { status: u16, message: String },
    #[error("upstream returned no text")]
    EmptyResponse,
    #[error("failed to decode upstream response: {0}")]
    Decode(String),
}

impl UpstreamError {
    /// True when the failure is transient and the same request may succeed later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            UpstreamError::RateLimited | UpstreamError::Unavailable { .. } | UpstreamError::Timeout
        )
    }
}

/// The generative-text capability used by the orchestrator and the analysis generator.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Generates a reply for `request`. The returned text is passed through unmodified.
    async fn generate(&self, request: GenerateRequest) -> Result<String, UpstreamError>;
}

// --- Gemini ---

/// Connection settings for [`GeminiGateway`].
#[derive(Clone)]
pub struct GeminiConfig {
    api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: "gemini-1.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"[redacted]")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// A [`ModelGateway`] that calls Gemini's `models/{model}:generateContent`.
pub struct GeminiGateway {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiGateway {
    pub fn new(config: GeminiConfig) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[async_trait]
impl ModelGateway for GeminiGateway {
    async fn generate(&self, request: GenerateRequest) -> Result<String, UpstreamError> {
        let body = wire::GenerateContentRequest::from(&request);
        debug!(
            model = %self.config.model,
            turns = request.turns.len(),
            max_output_tokens = ?request.max_output_tokens,
            "Calling generateContent"
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    UpstreamError::Timeout
                } else {
                    UpstreamError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "generateContent returned an error status");
            return Err(classify_status(status, &text));
        }

        let payload: wire::GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| UpstreamError::Decode(e.to_string()))?;
        payload.text().ok_or(UpstreamError::EmptyResponse)
    }
}

fn classify_status(status: StatusCode, body: &str) -> UpstreamError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => UpstreamError::RateLimited,
        StatusCode::INTERNAL_SERVER_ERROR
        | StatusCode::BAD_GATEWAY
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::GATEWAY_TIMEOUT => UpstreamError::Unavailable {
            status: status.as_u16(),
        },
        _ => {
            let message = serde_json::from_str::<wire::ErrorEnvelope>(body)
                .map(|envelope| envelope.error.message)
                .unwrap_or_else(|_| body.trim().to_string());
            UpstreamError::Api {
                status: status.as_u16(),
                message,
            }
        }
    }
}

/// Gemini REST payloads.
mod wire {
    use super::*;

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    pub(super) struct GenerateContentRequest {
        pub contents: Vec<Content>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub system_instruction: Option<Content>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub generation_config: Option<GenerationConfig>,
    }

    #[derive(Serialize, Deserialize)]
    pub(super) struct Content {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub role: Option<String>,
        #[serde(default)]
        pub parts: Vec<Part>,
    }

    #[derive(Serialize, Deserialize)]
    pub(super) struct Part {
        #[serde(default)]
        pub text: String,
    }

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    pub(super) struct GenerationConfig {
        pub max_output_tokens: u32,
    }

    #[derive(Deserialize)]
    pub(super) struct GenerateContentResponse {
        #[serde(default)]
        pub candidates: Vec<Candidate>,
    }

    #[derive(Deserialize)]
    pub(super) struct Candidate {
        pub content: Option<Content>,
    }

    #[derive(Deserialize)]
    pub(super) struct ErrorEnvelope {
        pub error: ErrorBody,
    }

    #[derive(Deserialize)]
    pub(super) struct ErrorBody {
        pub message: String,
    }

    impl From<&GenerateRequest> for GenerateContentRequest {
        fn from(request: &GenerateRequest) -> Self {
            let contents = request
                .turns
                .iter()
                .map(|turn| Content {
                    role: Some(
                        match turn.role {
                            Role::User => "user",
                            Role::Model => "model",
                        }
                        .to_string(),
                    ),
                    parts: vec![Part {
                        text: turn.text.clone(),
                    }],
                })
                .collect();
            Self {
                contents,
                system_instruction: request.system_instruction.as_ref().map(|text| Content {
                    role: None,
                    parts: vec![Part { text: text.clone() }],
                }),
                generation_config: request
                    .max_output_tokens
                    .map(|max_output_tokens| GenerationConfig { max_output_tokens }),
            }
        }
    }

    impl GenerateContentResponse {
        /// Text of the first candidate, or `None` if it has none.
        pub fn text(self) -> Option<String> {
            let content = self.candidates.into_iter().next()?.content?;
            let text: String = content.parts.into_iter().map(|p| p.text).collect();
            if text.is_empty() { None } else { Some(text) }
        }
    }
}

#[cfg(any(test, feature = "test-util"))]
mod scripted;
#[cfg(any(test, feature = "test-util"))]
pub use scripted::ScriptedGateway;
