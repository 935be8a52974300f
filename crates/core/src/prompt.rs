//! Prompt construction.
//!
//! Builds the model input for a chat turn and the single-prompt input used for
//! analysis reports.

use crate::{
    gateway::GenerateRequest,
    session::{InterviewerType, Role, Session, Turn},
};
use std::num::NonZeroUsize;

/// Messages starting with this text ask the model for an opening line and are
/// never recorded in the session history.
pub const GREETING_TRIGGER_PREFIX: &str = "Generate a casual greeting";

pub fn is_greeting_trigger(message: &str) -> bool {
    message.trim_start().starts_with(GREETING_TRIGGER_PREFIX)
}

/// The synthetic first message that asks the model to introduce itself.
pub fn greeting_message(language: &str, assistant_name: &str, profession: &str) -> String {
    format!(
        "{GREETING_TRIGGER_PREFIX} in {language}. Introduce yourself as {assistant_name} and mention \
         that we will be having a small talk about {profession}."
    )
}

/// Wraps the user's text the way the chat client sends it.
pub fn continuation_message(language: &str, profession: &str, user_text: &str) -> String {
    format!(
        "Continue the casual small talk in {language} about {profession}. The user's last message is: \
         \"{user_text}\""
    )
}

/// How much of the stored history is replayed to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryWindow {
    /// The whole transcript, every turn.
    #[default]
    Full,
    /// Only the most recent turns.
    LastTurns(NonZeroUsize),
}

impl HistoryWindow {
    /// `0` selects the full history.
    pub fn from_limit(limit: usize) -> Self {
        NonZeroUsize::new(limit).map_or(HistoryWindow::Full, HistoryWindow::LastTurns)
    }

    /// Returns the slice of `history` sent to the model. A window never starts
    /// on a model turn.
    pub fn apply<'a>(&self, history: &'a [Turn]) -> &'a [Turn] {
        match self {
            HistoryWindow::Full => history,
            HistoryWindow::LastTurns(n) => {
                let mut start = history.len().saturating_sub(n.get());
                while start < history.len() && start > 0 && history[start].role == Role::Model {
                    start += 1;
                }
                &history[start..]
            }
        }
    }
}

/// Composes model requests from session state.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptBuilder {
    window: HistoryWindow,
    max_output_tokens: Option<u32>,
}

impl PromptBuilder {
    pub fn new(window: HistoryWindow, max_output_tokens: Option<u32>) -> Self {
        Self {
            window,
            max_output_tokens,
        }
    }

    /// Builds the request for a chat turn.
    ///
    /// A greeting trigger is sent alone, bypassing the history. For any other
    /// message `conversation` is the stored history followed by the pending
    /// user turn.
    pub fn build_turn(
        &self,
        conversation: &[Turn],
        message: &str,
        system_instruction: String,
    ) -> GenerateRequest {
        let turns = if is_greeting_trigger(message) {
            vec![Turn::user(message)]
        } else {
            self.window.apply(conversation).to_vec()
        };
        GenerateRequest {
            system_instruction: Some(system_instruction),
            turns,
            max_output_tokens: self.max_output_tokens,
        }
    }

    /// Builds the single-prompt request for a proficiency report.
    pub fn build_analysis(&self, session: &Session) -> GenerateRequest {
        GenerateRequest {
            system_instruction: None,
            turns: vec![Turn::user(analysis_prompt(session))],
            max_output_tokens: None,
        }
    }
}

/// Renders history as `"<Role>: <text>"` lines.
pub fn transcript(history: &[Turn]) -> String {
    history
        .iter()
        .map(|turn| format!("{}: {}", turn.role, turn.text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The analysis prompt for `session`, chosen by its interviewer type.
pub fn analysis_prompt(session: &Session) -> String {
    let language = session.language();
    let profession = session.profession();
    let conversation = transcript(session.history());

    match session.interviewer_type() {
        InterviewerType::Cefr => format!(
            "You are a language assessment expert using the Common European Framework of Reference \
             (CEFR). Your task is to analyze a conversation in {language} about the profession of \
             {profession} and determine the user's proficiency level.\n\n\
             Provide a report that:\n\
             1.  States the highest CEFR level (A1, A2, B1, B2, C1 or C2) the user consistently \
             demonstrated.\n\
             2.  Justifies the level with concrete examples from the user's messages, covering grammar, \
             vocabulary and fluency.\n\
             3.  Notes any questions the user could not answer appropriately, even after rephrasing.\n\
             4.  Recommends what to practice to reach the next level.\n\n\
             The report should be easy to read and formatted clearly.\n\n\
             Here is the conversation to analyze:\n{conversation}\n"
        ),
        InterviewerType::SmallTalk | InterviewerType::Recruiter => format!(
            "You are a language proficiency expert. Your task is to analyze a conversation in \
             {language} about the profession of {profession} to assess the user's language skills.\n\n\
             Provide a detailed report that evaluates the user's performance in the following areas:\n\
             1.  **Grammar and Syntax:** Comment on the accuracy of sentence structure and verb tense.\n\
             2.  **Vocabulary:** Assess the range and appropriateness of the vocabulary used.\n\
             3.  **Fluency and Cohesion:** Evaluate the flow of the conversation and how well the user \
             connected their ideas.\n\
             4.  **Relevance to Topic:** Judge how well the user's responses stayed on topic with the \
             profession of {profession}.\n\n\
             Please provide a summary and a final recommendation for areas of improvement. The report \
             should be easy to read and formatted clearly.\n\n\
             Here is the conversation to analyze:\n{conversation}\n"
        ),
    }
}
