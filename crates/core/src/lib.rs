pub mod analysis;
pub mod client;
pub mod gateway;
pub mod language;
pub mod orchestrator;
pub mod progression;
pub mod prompt;
pub mod session;

pub use analysis::{AnalysisError, AnalysisGenerator, AnalysisReport};
pub use gateway::{GeminiConfig, GeminiGateway, ModelGateway, UpstreamError};
pub use orchestrator::{ChatError, ChatOrchestrator, ChatTurn};
pub use prompt::{HistoryWindow, PromptBuilder};
pub use session::{InterviewerType, SessionStore};
