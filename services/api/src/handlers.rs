//! Axum Handlers for the REST API
//!
//! `/chat` runs one conversation turn and `/analyze` produces a proficiency
//! report for an existing session. Both use `utoipa` doc comments for the
//! OpenAPI document. Internal error detail is logged here and never returned.

use axum::{
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use interview_core::{
    AnalysisError, ChatError, ChatTurn,
    client::SESSION_ID_HEADER,
};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    config::SessionIdFallback,
    models::{AnalyzePayload, AnalyzeResponse, ChatPayload, ChatResponse, ErrorResponse},
    state::AppState,
};

/// Session used for `/chat` requests without an id in shared mode.
pub const DEFAULT_SESSION_ID: &str = "default";

pub const CHAT_FALLBACK_REPLY: &str =
    "Sorry, I'm having trouble connecting to the AI model. Please try again.";
pub const ANALYSIS_FALLBACK: &str =
    "Sorry, I'm unable to generate the analysis report at this time.";
pub const SESSION_NOT_FOUND: &str = "Session not found.";

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    /// Chat upstream failed in a way a retry may fix.
    ChatUnavailable,
    ChatFailed,
    SessionNotFound,
    AnalysisFailed,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(error) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response()
            }
            ApiError::ChatUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ChatResponse {
                    reply: CHAT_FALLBACK_REPLY.to_string(),
                }),
            )
                .into_response(),
            ApiError::ChatFailed => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ChatResponse {
                    reply: CHAT_FALLBACK_REPLY.to_string(),
                }),
            )
                .into_response(),
            ApiError::SessionNotFound => (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: SESSION_NOT_FOUND.to_string(),
                }),
            )
                .into_response(),
            ApiError::AnalysisFailed => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: ANALYSIS_FALLBACK.to_string(),
                }),
            )
                .into_response(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!(error = %rejection.body_text(), "Rejected request body");
        Self::BadRequest(rejection.body_text())
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::InvalidRequest(reason) => Self::BadRequest(reason),
            ChatError::Upstream(upstream) => {
                error!(error = %upstream, "Chat turn failed upstream");
                if upstream.is_retryable() {
                    Self::ChatUnavailable
                } else {
                    Self::ChatFailed
                }
            }
        }
    }
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::NotFound(_) => Self::SessionNotFound,
            AnalysisError::Upstream(upstream) => {
                error!(error = %upstream, "Analysis failed upstream");
                Self::AnalysisFailed
            }
        }
    }
}

/// Resolves the session id of a `/chat` request. The second value is `true`
/// when the id was minted here and must be echoed to the caller.
fn resolve_session_id(headers: &HeaderMap, fallback: SessionIdFallback) -> (String, bool) {
    let provided = headers
        .get(SESSION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty());

    match (provided, fallback) {
        (Some(id), _) => (id.to_string(), false),
        (None, SessionIdFallback::Shared) => (DEFAULT_SESSION_ID.to_string(), false),
        (None, SessionIdFallback::Generate) => (Uuid::new_v4().to_string(), true),
    }
}

/// Send one message in an interview session.
#[utoipa::path(
    post,
    path = "/chat",
    request_body = ChatPayload,
    responses(
        (status = 200, description = "Model reply", body = ChatResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Model call failed; reply holds a fallback text", body = ChatResponse),
        (status = 503, description = "Model temporarily unavailable; reply holds a fallback text", body = ChatResponse)
    ),
    params(
        ("x-session-id" = Option<String>, Header, description = "Conversation identifier chosen by the client")
    )
)]
#[instrument(skip_all)]
pub async fn chat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<ChatPayload>, JsonRejection>,
) -> Response {
    let (session_id, generated) =
        resolve_session_id(&headers, state.config.session_id_fallback);

    let result = async {
        let Json(payload) = payload?;
        info!(session_id = %session_id, generated, "Chat request received");
        let reply = state
            .orchestrator
            .handle_turn(ChatTurn {
                session_id: session_id.clone(),
                message: payload.message,
                language: payload.language.unwrap_or_default(),
                profession: payload.profession.unwrap_or_default(),
                interviewer_type: payload.interviewer_type.unwrap_or_default(),
                assistant_name: payload.bot_name,
            })
            .await?;
        Ok::<_, ApiError>(Json(ChatResponse { reply }))
    }
    .await;

    let mut response = result.into_response();
    if generated {
        if let Ok(value) = HeaderValue::from_str(&session_id) {
            response.headers_mut().insert(SESSION_ID_HEADER, value);
        }
    }
    response
}

/// Generate a proficiency report for an existing session.
#[utoipa::path(
    post,
    path = "/analyze",
    request_body = AnalyzePayload,
    responses(
        (status = 200, description = "Analysis report", body = AnalyzeResponse),
        (status = 400, description = "Missing session id", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 500, description = "Model call failed", body = ErrorResponse)
    )
)]
#[instrument(skip_all)]
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AnalyzePayload>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let Json(payload) = payload?;
    let session_id = payload
        .session_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("sessionId is required".to_string()))?;

    info!(session_id, "Analysis requested");
    let report = state.analysis.analyze(session_id).await?;
    Ok(Json(AnalyzeResponse {
        analysis: report.text,
    }))
}
