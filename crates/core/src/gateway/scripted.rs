use super::{GenerateRequest, ModelGateway, UpstreamError};
use async_trait::async_trait;
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

/// A [`ModelGateway`] that replays queued outcomes.
///
/// Each call pops the next queued outcome; once the queue is empty it answers
/// `"reply {n}"` where `n` counts calls from 1. Every request is recorded.
#[derive(Debug, Clone, Default)]
pub struct ScriptedGateway {
    outcomes: Arc<Mutex<VecDeque<Result<String, UpstreamError>>>>,
    requests: Arc<Mutex<Vec<GenerateRequest>>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(self, reply: impl Into<String>) -> Self {
        self.push(Ok(reply.into()));
        self
    }

    pub fn with_error(self, error: UpstreamError) -> Self {
        self.push(Err(error));
        self
    }

    fn push(&self, outcome: Result<String, UpstreamError>) {
        self.outcomes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push_back(outcome);
    }

    /// All requests received so far, in call order.
    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl ModelGateway for ScriptedGateway {
    async fn generate(&self, request: GenerateRequest) -> Result<String, UpstreamError> {
        let call_number = {
            let mut requests = self
                .requests
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            requests.push(request);
            requests.len()
        };
        self.outcomes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front()
            .unwrap_or_else(|| Ok(format!("reply {call_number}")))
    }
}
