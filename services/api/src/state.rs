//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds the services every
//! handler needs: the chat orchestrator and the analysis generator, both backed
//! by the same session store.

use crate::config::Config;
use interview_core::{
    AnalysisGenerator, ChatOrchestrator, ModelGateway, PromptBuilder, SessionStore,
    gateway::CHAT_MAX_OUTPUT_TOKENS, prompt::HistoryWindow,
};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<ChatOrchestrator>,
    pub analysis: Arc<AnalysisGenerator>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires both services to one session store and one model gateway.
    pub fn new(config: Config, gateway: Arc<dyn ModelGateway>) -> Self {
        let store = Arc::new(SessionStore::new());
        let prompts = PromptBuilder::new(
            HistoryWindow::from_limit(config.history_window),
            Some(CHAT_MAX_OUTPUT_TOKENS),
        );
        Self {
            orchestrator: Arc::new(ChatOrchestrator::new(
                store.clone(),
                gateway.clone(),
                prompts,
            )),
            analysis: Arc::new(AnalysisGenerator::new(store, gateway, prompts)),
            config: Arc::new(config),
        }
    }
}
