//! API Models
//!
//! Request and response bodies for the HTTP surface, annotated with `utoipa`
//! for the generated OpenAPI document.

use interview_core::InterviewerType;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of `POST /chat`.
///
/// `language` and `profession` are only read when the request creates the
/// session; later requests may omit them.
#[derive(Deserialize, ToSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ChatPayload {
    #[schema(example = "I have worked as a nurse for five years.")]
    pub message: String,
    #[schema(example = "English")]
    pub language: Option<String>,
    #[schema(example = "healthcare")]
    pub profession: Option<String>,
    #[schema(value_type = Option<String>, example = "Recruiter")]
    pub interviewer_type: Option<InterviewerType>,
    #[schema(example = "Alex")]
    pub bot_name: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct ChatResponse {
    pub reply: String,
}

/// Body of `POST /analyze`.
#[derive(Deserialize, ToSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzePayload {
    #[schema(example = "3f2b8c1e-5d4a-4c7b-9a0e-1f2d3c4b5a69")]
    pub session_id: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct AnalyzeResponse {
    pub analysis: String,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_payload_camel_case_fields() {
        let json = r#"{
            "message": "Hello",
            "language": "Finnish",
            "profession": "construction",
            "interviewerType": "Recruiter",
            "botName": "Aino"
        }"#;
        let payload: ChatPayload = serde_json::from_str(json).unwrap();

        assert_eq!(payload.message, "Hello");
        assert_eq!(payload.language.as_deref(), Some("Finnish"));
        assert_eq!(payload.profession.as_deref(), Some("construction"));
        assert_eq!(payload.interviewer_type, Some(InterviewerType::Recruiter));
        assert_eq!(payload.bot_name.as_deref(), Some("Aino"));
    }

    #[test]
    fn test_chat_payload_optional_fields() {
        let payload: ChatPayload = serde_json::from_str(r#"{"message": "Hi"}"#).unwrap();
        assert!(payload.language.is_none());
        assert!(payload.profession.is_none());
        assert!(payload.interviewer_type.is_none());
        assert!(payload.bot_name.is_none());

        let payload: ChatPayload =
            serde_json::from_str(r#"{"message": "Hi", "interviewerType": null}"#).unwrap();
        assert!(payload.interviewer_type.is_none());
    }

    #[test]
    fn test_chat_payload_interviewer_type_aliases() {
        for (raw, expected) in [
            ("SmallTalk", InterviewerType::SmallTalk),
            ("small_talk", InterviewerType::SmallTalk),
            ("recruiter", InterviewerType::Recruiter),
            ("CEFR", InterviewerType::Cefr),
            ("cefr", InterviewerType::Cefr),
        ] {
            let json = format!(r#"{{"message": "Hi", "interviewerType": "{raw}"}}"#);
            let payload: ChatPayload = serde_json::from_str(&json).unwrap();
            assert_eq!(payload.interviewer_type, Some(expected), "alias {raw}");
        }
    }

    #[test]
    fn test_chat_payload_rejects_unknown_interviewer_type() {
        let result: Result<ChatPayload, _> =
            serde_json::from_str(r#"{"message": "Hi", "interviewerType": "Therapist"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_chat_payload_missing_message() {
        let result: Result<ChatPayload, _> = serde_json::from_str(r#"{"language": "English"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_analyze_payload_session_id() {
        let payload: AnalyzePayload = serde_json::from_str(r#"{"sessionId": "abc"}"#).unwrap();
        assert_eq!(payload.session_id.as_deref(), Some("abc"));

        let payload: AnalyzePayload = serde_json::from_str("{}").unwrap();
        assert!(payload.session_id.is_none());
    }

    #[test]
    fn test_response_serialization() {
        assert_eq!(
            serde_json::to_string(&ChatResponse {
                reply: "Hi!".to_string()
            })
            .unwrap(),
            r#"{"reply":"Hi!"}"#
        );
        assert_eq!(
            serde_json::to_string(&AnalyzeResponse {
                analysis: "B2".to_string()
            })
            .unwrap(),
            r#"{"analysis":"B2"}"#
        );
        assert_eq!(
            serde_json::to_string(&ErrorResponse {
                error: "Session not found.".to_string()
            })
            .unwrap(),
            r#"{"error":"Session not found."}"#
        );
    }
}
