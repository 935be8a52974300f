//! In-memory session state.
//!
//! A session is created lazily by the first chat request that carries an
//! unseen identifier and lives for as long as the process does. Every session
//! sits behind its own async mutex so that two requests for the same id are
//! serialized for the whole turn, while requests for different ids never wait
//! on each other beyond the brief map lookup.

use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt, sync::Arc};
use tokio::sync::{Mutex, RwLock};
use tracing::info;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Model,
}

impl Role {
    /// Speaker label used when a transcript is rendered as plain text.
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Model => "Bot",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

/// The kind of interviewer the user picked. Selects the progression policy
/// and the analysis template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InterviewerType {
    #[default]
    #[serde(alias = "smalltalk", alias = "small_talk", alias = "smallTalk")]
    SmallTalk,
    #[serde(alias = "recruiter")]
    Recruiter,
    #[serde(rename = "CEFR", alias = "cefr", alias = "Cefr")]
    Cefr,
}

/// Conversation state for one session id.
///
/// `language`, `profession` and `interviewer_type` are fixed at creation.
/// `history` is append-only.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    id: String,
    language: String,
    profession: String,
    interviewer_type: InterviewerType,
    history: Vec<Turn>,
}

impl Session {
    pub fn new(id: impl Into<String>, init: NewSession) -> Self {
        Self {
            id: id.into(),
            language: init.language,
            profession: init.profession,
            interviewer_type: init.interviewer_type,
            history: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn profession(&self) -> &str {
        &self.profession
    }

    pub fn interviewer_type(&self) -> InterviewerType {
        self.interviewer_type
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    /// Number of user turns recorded so far.
    pub fn user_turn_count(&self) -> usize {
        self.history
            .iter()
            .filter(|turn| turn.role == Role::User)
            .count()
    }

    pub fn append(&mut self, turn: Turn) {
        self.history.push(turn);
    }
}

/// The creation-time attributes of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSession {
    pub language: String,
    pub profession: String,
    pub interviewer_type: InterviewerType,
}

/// Shared, exclusively-lockable handle to one session.
pub type SessionHandle = Arc<Mutex<Session>>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("session '{0}' not found")]
pub struct SessionNotFound(pub String);

/// Concurrency-safe map from session id to session state.
///
/// Sessions are never evicted; memory grows with the number of distinct ids
/// and with each session's history for the lifetime of the process.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the session for `id`, creating it from `init` if the id is new.
    ///
    /// When the session already exists `init` is ignored; the values stored
    /// on creation keep governing the session. The boolean is `true` when
    /// this call created the session.
    pub async fn get_or_create(&self, id: &str, init: NewSession) -> (SessionHandle, bool) {
        if let Some(handle) = self.sessions.read().await.get(id) {
            return (handle.clone(), false);
        }

        let mut sessions = self.sessions.write().await;
        // Another request may have created it between the two locks.
        if let Some(handle) = sessions.get(id) {
            return (handle.clone(), false);
        }

        info!(
            session_id = %id,
            language = %init.language,
            profession = %init.profession,
            interviewer_type = ?init.interviewer_type,
            "Creating new session"
        );
        let handle = Arc::new(Mutex::new(Session::new(id, init)));
        sessions.insert(id.to_string(), handle.clone());
        (handle, true)
    }

    pub async fn get(&self, id: &str) -> Result<SessionHandle, SessionNotFound> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| SessionNotFound(id.to_string()))
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.sessions.read().await.contains_key(id)
    }

    /// Appends a turn to an existing session under that session's lock.
    pub async fn append_turn(&self, id: &str, turn: Turn) -> Result<(), SessionNotFound> {
        let handle = self.get(id).await?;
        handle.lock().await.append(turn);
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
