//! Chat Client
//!
//! The caller side of the `/chat` protocol: it keeps the visible transcript,
//! wraps user input the way the interview UI does, and retries the round-trip
//! according to a [`RetryPolicy`]. Failures surface as a single fallback line
//! in the transcript, never as two fallback lines in a row.

pub mod retry;

use crate::{
    language::{localize_profession, random_assistant_name},
    prompt::{continuation_message, greeting_message},
    session::InterviewerType,
};
use async_trait::async_trait;
use reqwest::StatusCode;
use retry::{RetryOutcome, RetryPolicy, Retryable};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// Shown when the server cannot be reached or answers with an error.
pub const CONNECTION_FALLBACK: &str = "Sorry, I can't connect to the server.";
/// Shown when every retry attempt found the service unavailable.
pub const UNAVAILABLE_FALLBACK: &str =
    "Sorry, the service is currently unavailable. Please try again later.";

/// Header carrying the session identifier.
pub const SESSION_ID_HEADER: &str = "x-session-id";

/// JSON body of a `/chat` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequestBody {
    pub message: String,
    pub language: String,
    pub profession: String,
    pub interviewer_type: InterviewerType,
    pub bot_name: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponseBody {
    reply: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The server answered 503; the request may succeed later.
    #[error("service unavailable")]
    Unavailable,
    #[error("server responded with status {0}")]
    Status(u16),
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl Retryable for TransportError {
    fn is_retryable(&self) -> bool {
        matches!(self, TransportError::Unavailable)
    }
}

/// One `/chat` round-trip.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, session_id: &str, body: &ChatRequestBody)
    -> Result<String, TransportError>;
}

/// [`ChatTransport`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpChatTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpChatTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ChatTransport for HttpChatTransport {
    async fn send(
        &self,
        session_id: &str,
        body: &ChatRequestBody,
    ) -> Result<String, TransportError> {
        let response = self
            .client
            .post(format!("{}/chat", self.base_url.trim_end_matches('/')))
            .header(SESSION_ID_HEADER, session_id)
            .json(body)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        match response.status() {
            StatusCode::SERVICE_UNAVAILABLE => Err(TransportError::Unavailable),
            status if !status.is_success() => Err(TransportError::Status(status.as_u16())),
            _ => response
                .json::<ChatResponseBody>()
                .await
                .map(|body| body.reply)
                .map_err(|e| TransportError::Decode(e.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub speaker: Speaker,
    pub text: String,
}

impl TranscriptEntry {
    pub fn is_fallback(&self) -> bool {
        self.speaker == Speaker::Bot
            && (self.text == CONNECTION_FALLBACK || self.text == UNAVAILABLE_FALLBACK)
    }
}

/// What the user sees.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn push(&mut self, speaker: Speaker, text: impl Into<String>) {
        self.entries.push(TranscriptEntry {
            speaker,
            text: text.into(),
        });
    }

    /// Appends a fallback line unless the last entry already is one.
    /// Returns whether it was appended.
    pub fn push_fallback(&mut self, text: &str) -> bool {
        if self.entries.last().is_some_and(TranscriptEntry::is_fallback) {
            return false;
        }
        self.push(Speaker::Bot, text);
        true
    }

    pub fn fallback_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_fallback()).count()
    }
}

/// Result of [`InterviewClient::send`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Replied(String),
    /// The send failed; `appended` tells whether a fallback line was added.
    Fallback { appended: bool },
    /// Blank input; nothing was sent.
    Ignored,
}

/// The interview choices made before the conversation starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterviewSettings {
    pub language: String,
    pub profession: String,
    pub interviewer_type: InterviewerType,
}

/// Drives one interview session from the caller's side.
pub struct InterviewClient<T> {
    transport: T,
    policy: RetryPolicy,
    session_id: String,
    assistant_name: String,
    settings: InterviewSettings,
    transcript: Transcript,
}

impl<T: ChatTransport> InterviewClient<T> {
    /// Creates a client with a fresh session id and a random assistant name.
    pub fn new(transport: T, settings: InterviewSettings) -> Self {
        Self {
            transport,
            policy: RetryPolicy::default(),
            session_id: uuid::Uuid::new_v4().to_string(),
            assistant_name: random_assistant_name(&settings.language).to_string(),
            settings,
            transcript: Transcript::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_assistant_name(mut self, name: impl Into<String>) -> Self {
        self.assistant_name = name.into();
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn assistant_name(&self) -> &str {
        &self.assistant_name
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    fn body(&self, message: String) -> ChatRequestBody {
        ChatRequestBody {
            message,
            language: self.settings.language.clone(),
            profession: self.settings.profession.clone(),
            interviewer_type: self.settings.interviewer_type,
            bot_name: self.assistant_name.clone(),
        }
    }

    /// Requests the opening line. Single attempt; on failure the transcript
    /// shows the connection fallback. Returns whether a greeting arrived.
    pub async fn start(&mut self) -> bool {
        let profession =
            localize_profession(&self.settings.language, &self.settings.profession).as_str();
        let message = greeting_message(&self.settings.language, &self.assistant_name, profession);
        let body = self.body(message);

        match self.transport.send(&self.session_id, &body).await {
            Ok(reply) => {
                self.transcript.push(Speaker::Bot, reply);
                true
            }
            Err(e) => {
                error!(session_id = %self.session_id, error = %e, "Failed to fetch greeting");
                self.transcript.push_fallback(CONNECTION_FALLBACK);
                false
            }
        }
    }

    /// Sends the user's text, retrying while the service reports itself unavailable.
    pub async fn send(&mut self, text: &str) -> SendOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SendOutcome::Ignored;
        }
        self.transcript.push(Speaker::User, text);

        let profession =
            localize_profession(&self.settings.language, &self.settings.profession).as_str();
        let body = self.body(continuation_message(&self.settings.language, profession, text));

        let transport = &self.transport;
        let session_id = self.session_id.as_str();
        let body = &body;
        let outcome = self
            .policy
            .run(move |_| transport.send(session_id, body))
            .await;

        match outcome {
            RetryOutcome::Succeeded { value, attempts } => {
                info!(session_id, attempts, "Reply received");
                self.transcript.push(Speaker::Bot, value.as_str());
                SendOutcome::Replied(value)
            }
            RetryOutcome::Exhausted { attempts, .. } => {
                error!(session_id, attempts, "Service unavailable after all attempts");
                let appended = self.transcript.push_fallback(UNAVAILABLE_FALLBACK);
                SendOutcome::Fallback { appended }
            }
            RetryOutcome::Failed { error, attempts } => {
                error!(session_id, attempts, %error, "Chat request failed");
                let appended = self.transcript.push_fallback(CONNECTION_FALLBACK);
                SendOutcome::Fallback { appended }
            }
        }
    }
}
