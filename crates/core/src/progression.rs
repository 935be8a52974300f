//! Difficulty and assessment progression.
//!
//! Each interviewer type maps the accumulated conversation length to an
//! instruction for the model. The mapping is pure: the same counters always
//! produce the same instruction.

use crate::session::{InterviewerType, Role, Turn};
use std::fmt;

/// How many times the CEFR examiner rephrases a question the user did not
/// answer appropriately before deciding the level was not reached.
pub const CEFR_REPHRASE_ATTEMPTS: u32 = 3;

/// Phase of a recruiter interview, by number of user answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecruiterPhase {
    WarmUp,
    Core,
    Closing,
    Concluded,
}

impl RecruiterPhase {
    /// `n` is the 1-indexed count of user turns, including the one being
    /// answered now.
    pub fn for_question_count(n: usize) -> Self {
        match n {
            0..=5 => RecruiterPhase::WarmUp,
            6..=15 => RecruiterPhase::Core,
            16..=19 => RecruiterPhase::Closing,
            _ => RecruiterPhase::Concluded,
        }
    }
}

/// Estimated CEFR level, from A1 (lowest) to C2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CefrLevel {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl CefrLevel {
    /// `h` is the number of turns in the history, both roles.
    pub fn for_history_len(h: usize) -> Self {
        match h {
            0..=8 => CefrLevel::A1,
            9..=15 => CefrLevel::A2,
            16..=25 => CefrLevel::B1,
            26..=35 => CefrLevel::B2,
            36..=45 => CefrLevel::C1,
            _ => CefrLevel::C2,
        }
    }
}

impl fmt::Display for CefrLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CefrLevel::A1 => "A1",
            CefrLevel::A2 => "A2",
            CefrLevel::B1 => "B1",
            CefrLevel::B2 => "B2",
            CefrLevel::C1 => "C1",
            CefrLevel::C2 => "C2",
        };
        f.write_str(label)
    }
}

/// The stage a conversation is in, derived from its history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Casual,
    Recruiter(RecruiterPhase),
    Cefr(CefrLevel),
}

/// Values interpolated into every instruction.
#[derive(Debug, Clone, Copy)]
pub struct PromptContext<'a> {
    pub language: &'a str,
    /// Profession already localized for `language`.
    pub profession: &'a str,
    pub assistant_name: &'a str,
}

/// Output of a policy evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progression {
    pub stage: Stage,
    pub instruction: String,
    /// No further questions should be asked.
    pub concluded: bool,
}

/// One policy per interviewer type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressionPolicy {
    SmallTalk,
    Recruiter,
    Cefr,
}

impl From<InterviewerType> for ProgressionPolicy {
    fn from(interviewer_type: InterviewerType) -> Self {
        match interviewer_type {
            InterviewerType::SmallTalk => ProgressionPolicy::SmallTalk,
            InterviewerType::Recruiter => ProgressionPolicy::Recruiter,
            InterviewerType::Cefr => ProgressionPolicy::Cefr,
        }
    }
}

impl ProgressionPolicy {
    /// Derives the current stage from `history` and renders its instruction.
    pub fn evaluate(&self, ctx: &PromptContext<'_>, history: &[Turn]) -> Progression {
        let stage = match self {
            ProgressionPolicy::SmallTalk => Stage::Casual,
            ProgressionPolicy::Recruiter => {
                let answers = history.iter().filter(|t| t.role == Role::User).count();
                Stage::Recruiter(RecruiterPhase::for_question_count(answers))
            }
            ProgressionPolicy::Cefr => Stage::Cefr(CefrLevel::for_history_len(history.len())),
        };
        render(stage, ctx)
    }
}

/// Renders the instruction for a stage.
pub fn render(stage: Stage, ctx: &PromptContext<'_>) -> Progression {
    let PromptContext {
        language,
        profession,
        assistant_name,
    } = *ctx;

    let instruction = match stage {
        Stage::Casual => format!(
            "You are an AI assistant named {assistant_name}. Your purpose is to have a casual small talk \
             conversation in {language} about the field of {profession}. The user is practicing their \
             language skills, so respond in a friendly and conversational manner. Keep your responses \
             concise and focused on the topic. Do not ask for their name again if you already have it."
        ),
        Stage::Recruiter(phase) => {
            let phase_rules = match phase {
                RecruiterPhase::WarmUp => "You are in the warm-up phase of the interview. Keep the \
                     tone casual and friendly, get to know the candidate and ask one question at a time."
                    .to_string(),
                RecruiterPhase::Core => format!(
                    "You are in the core phase of the interview. Ask technical and challenging questions \
                     about {profession}, one question at a time."
                ),
                RecruiterPhase::Closing => format!(
                    "You are in the closing phase of the interview. Ask your hardest questions about \
                     {profession}, one question at a time."
                ),
                RecruiterPhase::Concluded => "The interview has concluded. Do not ask any further \
                     questions. Thank the candidate and tell them to end the session now."
                    .to_string(),
            };
            format!(
                "You are {assistant_name}, a recruiter interviewing a candidate in {language} for a \
                 position in {profession}. {phase_rules} Respond only in {language} and keep your \
                 responses concise."
            )
        }
        Stage::Cefr(level) => format!(
            "You are {assistant_name}, a language examiner assessing the user's {language} on the CEFR \
             scale through a conversation about {profession}. The user's current estimated level is \
             {level}. Ask one question at a time suited to level {level}. If the user fails to answer \
             appropriately, rephrase the question and try again, up to {CEFR_REPHRASE_ATTEMPTS} times, \
             before concluding that level {level} has not been reached. Respond only in {language} and \
             keep your responses concise."
        ),
    };

    Progression {
        stage,
        instruction,
        concluded: stage == Stage::Recruiter(RecruiterPhase::Concluded),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CTX: PromptContext<'static> = PromptContext {
        language: "English",
        profession: "computing",
        assistant_name: "Alex",
    };

    /// A history with `n` user turns, each followed by a model reply except the last.
    fn history_with_user_turns(n: usize) -> Vec<Turn> {
        let mut history = Vec::new();
        for i in 0..n {
            history.push(Turn::user(format!("answer {i}")));
            if i + 1 < n {
                history.push(Turn::model(format!("question {i}")));
            }
        }
        history
    }

    fn history_of_len(h: usize) -> Vec<Turn> {
        (0..h)
            .map(|i| {
                if i % 2 == 0 {
                    Turn::user("u")
                } else {
                    Turn::model("m")
                }
            })
            .collect()
    }

    #[test]
    fn test_recruiter_phase_thresholds() {
        assert_eq!(RecruiterPhase::for_question_count(1), RecruiterPhase::WarmUp);
        assert_eq!(RecruiterPhase::for_question_count(5), RecruiterPhase::WarmUp);
        assert_eq!(RecruiterPhase::for_question_count(6), RecruiterPhase::Core);
        assert_eq!(RecruiterPhase::for_question_count(15), RecruiterPhase::Core);
        assert_eq!(RecruiterPhase::for_question_count(16), RecruiterPhase::Closing);
        assert_eq!(RecruiterPhase::for_question_count(19), RecruiterPhase::Closing);
        assert_eq!(RecruiterPhase::for_question_count(20), RecruiterPhase::Concluded);
        assert_eq!(RecruiterPhase::for_question_count(57), RecruiterPhase::Concluded);
    }

    #[test]
    fn test_cefr_level_thresholds() {
        let cases = [
            (0, CefrLevel::A1),
            (8, CefrLevel::A1),
            (9, CefrLevel::A2),
            (15, CefrLevel::A2),
            (16, CefrLevel::B1),
            (25, CefrLevel::B1),
            (26, CefrLevel::B2),
            (35, CefrLevel::B2),
            (36, CefrLevel::C1),
            (45, CefrLevel::C1),
            (46, CefrLevel::C2),
            (200, CefrLevel::C2),
        ];
        for (h, expected) in cases {
            assert_eq!(CefrLevel::for_history_len(h), expected, "h = {h}");
        }
    }

    #[test]
    fn test_recruiter_wording_follows_user_turn_count() {
        let policy = ProgressionPolicy::Recruiter;

        let warm_up = policy.evaluate(&CTX, &history_with_user_turns(5));
        assert_eq!(warm_up.stage, Stage::Recruiter(RecruiterPhase::WarmUp));
        assert!(warm_up.instruction.contains("warm-up phase"));
        assert!(warm_up.instruction.contains("one question at a time"));
        assert!(!warm_up.concluded);

        let core = policy.evaluate(&CTX, &history_with_user_turns(6));
        assert!(core.instruction.contains("core phase"));
        assert!(core.instruction.contains("technical and challenging"));

        let closing = policy.evaluate(&CTX, &history_with_user_turns(16));
        assert!(closing.instruction.contains("closing phase"));
        assert!(closing.instruction.contains("hardest questions"));

        let concluded = policy.evaluate(&CTX, &history_with_user_turns(20));
        assert!(concluded.concluded);
        assert!(concluded.instruction.contains("Do not ask any further questions"));
        assert!(!concluded.instruction.contains("one question at a time"));
    }

    #[test]
    fn test_recruiter_counts_only_user_turns() {
        // Five user turns padded with extra model turns still count as five.
        let mut history = history_with_user_turns(5);
        history.push(Turn::model("extra"));
        history.push(Turn::model("extra"));
        let progression = ProgressionPolicy::Recruiter.evaluate(&CTX, &history);
        assert_eq!(progression.stage, Stage::Recruiter(RecruiterPhase::WarmUp));
    }

    #[test]
    fn test_cefr_wording_follows_history_length() {
        let policy = ProgressionPolicy::Cefr;

        let a1 = policy.evaluate(&CTX, &history_of_len(8));
        assert_eq!(a1.stage, Stage::Cefr(CefrLevel::A1));
        assert!(a1.instruction.contains("current estimated level is A1"));

        let a2 = policy.evaluate(&CTX, &history_of_len(9));
        assert!(a2.instruction.contains("current estimated level is A2"));

        let b1 = policy.evaluate(&CTX, &history_of_len(25));
        assert!(b1.instruction.contains("current estimated level is B1"));

        let b2 = policy.evaluate(&CTX, &history_of_len(26));
        assert!(b2.instruction.contains("current estimated level is B2"));
        assert!(!b2.concluded);
    }

    #[test]
    fn test_cefr_instruction_carries_rephrase_tolerance() {
        let progression = ProgressionPolicy::Cefr.evaluate(&CTX, &[]);
        assert!(progression.instruction.contains("up to 3 times"));
        assert!(progression.instruction.contains("level A1 has not been reached"));
    }

    #[test]
    fn test_small_talk_is_casual_regardless_of_length() {
        let short = ProgressionPolicy::SmallTalk.evaluate(&CTX, &[]);
        let long = ProgressionPolicy::SmallTalk.evaluate(&CTX, &history_of_len(100));
        assert_eq!(short, long);
        assert_eq!(short.stage, Stage::Casual);
        assert!(short.instruction.contains("casual small talk conversation in English"));
        assert!(short.instruction.contains("named Alex"));
        assert!(short.instruction.contains("field of computing"));
        assert!(!short.concluded);
    }

    #[test]
    fn test_policy_from_interviewer_type() {
        assert_eq!(
            ProgressionPolicy::from(InterviewerType::Cefr),
            ProgressionPolicy::Cefr
        );
        assert_eq!(
            ProgressionPolicy::from(InterviewerType::Recruiter),
            ProgressionPolicy::Recruiter
        );
        assert_eq!(
            ProgressionPolicy::from(InterviewerType::SmallTalk),
            ProgressionPolicy::SmallTalk
        );
    }
}
