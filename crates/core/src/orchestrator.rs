//! Chat Turn Orchestration
//!
//! The per-request entry point for a conversation turn. The orchestrator holds
//! no state of its own between calls; everything lives in the [`SessionStore`].
//! A turn holds its session's lock from the first append until the reply is
//! recorded, so requests for one session are applied strictly one after
//! another.

use crate::{
    gateway::{ModelGateway, UpstreamError},
    language::{localize_profession, random_assistant_name},
    progression::{ProgressionPolicy, PromptContext},
    prompt::{PromptBuilder, is_greeting_trigger},
    session::{InterviewerType, NewSession, SessionStore, Turn},
};
use std::sync::Arc;
use tracing::{error, info, instrument};

/// One inbound chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub session_id: String,
    pub message: String,
    /// Used only when this turn creates the session.
    pub language: String,
    /// Used only when this turn creates the session.
    pub profession: String,
    /// Used only when this turn creates the session.
    pub interviewer_type: InterviewerType,
    /// A random name for the session language is picked when absent.
    pub assistant_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    #[error("invalid chat request: {0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

pub struct ChatOrchestrator {
    store: Arc<SessionStore>,
    gateway: Arc<dyn ModelGateway>,
    prompts: PromptBuilder,
}

impl ChatOrchestrator {
    pub fn new(
        store: Arc<SessionStore>,
        gateway: Arc<dyn ModelGateway>,
        prompts: PromptBuilder,
    ) -> Self {
        Self {
            store,
            gateway,
            prompts,
        }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Processes one chat message and returns the model's reply.
    ///
    /// On success an ordinary message adds its user turn and the model turn
    /// together. A greeting trigger adds nothing. On upstream failure history
    /// is left as it was, so a resent message is recorded once.
    #[instrument(skip_all, fields(session_id = %turn.session_id))]
    pub async fn handle_turn(&self, turn: ChatTurn) -> Result<String, ChatError> {
        if turn.message.trim().is_empty() {
            return Err(ChatError::InvalidRequest("message must not be empty".to_string()));
        }
        if !self.store.contains(&turn.session_id).await {
            if turn.language.trim().is_empty() {
                return Err(ChatError::InvalidRequest(
                    "language is required to start a session".to_string(),
                ));
            }
            if turn.profession.trim().is_empty() {
                return Err(ChatError::InvalidRequest(
                    "profession is required to start a session".to_string(),
                ));
            }
        }

        let (handle, _) = self
            .store
            .get_or_create(
                &turn.session_id,
                NewSession {
                    language: turn.language,
                    profession: turn.profession,
                    interviewer_type: turn.interviewer_type,
                },
            )
            .await;
        let mut session = handle.lock().await;

        let greeting = is_greeting_trigger(&turn.message);
        let pending = (!greeting).then(|| Turn::user(turn.message.as_str()));
        let mut conversation = session.history().to_vec();
        conversation.extend(pending.clone());

        let assistant_name = turn
            .assistant_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| random_assistant_name(session.language()));
        let profession = localize_profession(session.language(), session.profession());
        let ctx = PromptContext {
            language: session.language(),
            profession: profession.as_str(),
            assistant_name,
        };
        let progression =
            ProgressionPolicy::from(session.interviewer_type()).evaluate(&ctx, &conversation);
        info!(
            greeting,
            stage = ?progression.stage,
            concluded = progression.concluded,
            history_len = session.history().len(),
            "Processing chat turn"
        );

        let request = self
            .prompts
            .build_turn(&conversation, &turn.message, progression.instruction);
        let reply = self.gateway.generate(request).await.map_err(|e| {
            error!(error = %e, retryable = e.is_retryable(), "Model call failed");
            e
        })?;

        if let Some(user_turn) = pending {
            session.append(user_turn);
            session.append(Turn::model(reply.as_str()));
        }
        Ok(reply)
    }
}
