//! Interview conversation model shared by the chat client and the chat endpoint.

pub mod context;
pub mod prompt;

pub use context::{
    CandidateDetails, ChatContext, InterviewSettings, InterviewTemplate, InterviewTurn,
};
pub use prompt::{ChatMessage, ChatRole, MAX_QUESTION_WORDS, build_chat_messages};
