//! Host-facing handle to a running avatar session.
//!
//! The interview flow talks to the avatar through this handle instead of
//! holding the session itself. The handle keeps the current interview
//! context so callers only supply the candidate's latest message.

use std::sync::Arc;

use parking_lot::RwLock;

use super::errors::AvatarResult;
use super::session::AvatarSession;
use super::state::SessionStatus;
use crate::core::interview::{ChatContext, InterviewTurn};

#[derive(Clone)]
pub struct AvatarHandle {
    session: AvatarSession,
    context: Arc<RwLock<ChatContext>>,
}

impl AvatarHandle {
    pub fn new(session: AvatarSession, context: ChatContext) -> Self {
        Self {
            session,
            context: Arc::new(RwLock::new(context)),
        }
    }

    pub fn session(&self) -> &AvatarSession {
        &self.session
    }

    /// Send the next chat turn. `None` asks the interviewer to open or
    /// continue the interview.
    pub async fn send_message(&self, user_message: Option<String>) -> AvatarResult<String> {
        let context = self.context.read().with_user_message(user_message);
        self.session.send_chat_message(&context).await
    }

    pub async fn speak_completion(&self, message: &str) -> AvatarResult<()> {
        self.session.speak_completion_message(message).await
    }

    pub async fn stop_speaking(&self) -> AvatarResult<()> {
        self.session.stop_speaking().await
    }

    /// Session status. A session that failed and is continuing in text-only
    /// mode reports ready.
    pub fn status(&self) -> SessionStatus {
        self.session.status()
    }

    /// Append a question/answer pair to the interview history.
    pub fn record_turn(&self, question: Option<String>, answer: Option<String>) {
        self.context
            .write()
            .interview_history
            .push(InterviewTurn { question, answer });
    }

    /// Mutate the interview context in place.
    pub fn update_context(&self, f: impl FnOnce(&mut ChatContext)) {
        f(&mut self.context.write());
    }

    pub fn context(&self) -> ChatContext {
        self.context.read().clone()
    }
}
