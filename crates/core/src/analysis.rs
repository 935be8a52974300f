//! On-demand proficiency reports.

use crate::{
    gateway::{ModelGateway, UpstreamError},
    prompt::PromptBuilder,
    session::SessionStore,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// A generated report. Never stored on the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisReport {
    pub session_id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    #[error("session '{0}' not found")]
    NotFound(String),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

pub struct AnalysisGenerator {
    store: Arc<SessionStore>,
    gateway: Arc<dyn ModelGateway>,
    prompts: PromptBuilder,
}

impl AnalysisGenerator {
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

    /// Builds a report from the session's current history.
    ///
    /// An unknown id is reported as [`AnalysisError::NotFound`]; no session is
    /// created. The session lock is released before the model is called.
    #[instrument(skip(self))]
    pub async fn analyze(&self, session_id: &str) -> Result<AnalysisReport, AnalysisError> {
        let handle = self.store.get(session_id).await.map_err(|_| {
            warn!("Analysis requested for unknown session");
            AnalysisError::NotFound(session_id.to_string())
        })?;

        let request = {
            let session = handle.lock().await;
            info!(
                interviewer_type = ?session.interviewer_type(),
                history_len = session.history().len(),
                "Generating analysis report"
            );
            self.prompts.build_analysis(&session)
        };

        let text = self.gateway.generate(request).await.map_err(|e| {
            error!(error = %e, "Analysis model call failed");
            e
        })?;
        Ok(AnalysisReport {
            session_id: session_id.to_string(),
            text,
        })
    }
}
