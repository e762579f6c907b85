//! Request context sent with every chat turn.

use serde::{Deserialize, Serialize};

/// Candidate details. Only the name is used for prompting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// One question/answer pair of the interview so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterviewTurn {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterviewSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interviewer_gender: Option<String>,
}

impl InterviewSettings {
    /// Name the interviewer introduces itself with.
    pub fn interviewer_name(&self) -> &'static str {
        match self.interviewer_gender.as_deref() {
            Some("female") => "Alexandra",
            Some("male") => "Alexander",
            _ => "Alex",
        }
    }
}

/// Interview template chosen by the candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterviewTemplate {
    pub name: Option<String>,
    pub company: Option<String>,
    pub role: Option<String>,
    pub level: Option<String>,
    pub topic: Option<String>,
    pub difficulty: Option<String>,
    pub description: Option<String>,
    pub number_of_questions: Option<u32>,
    pub duration_minutes: Option<u32>,
}

/// Everything the chat endpoint needs to produce the next interviewer turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatContext {
    #[serde(default)]
    pub user_details: CandidateDetails,
    #[serde(default)]
    pub interview_history: Vec<InterviewTurn>,
    #[serde(default)]
    pub settings: InterviewSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<InterviewTemplate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_message: Option<String>,
}

impl ChatContext {
    /// Same context with `user_message` replaced.
    pub fn with_user_message(&self, user_message: Option<String>) -> Self {
        Self {
            user_message,
            ..self.clone()
        }
    }
}
