//! Session state tracked by the avatar session controller

use serde::Serialize;

/// Lifecycle phase derived from the session flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Uninitialized,
    Initialized,
    Starting,
    Active,
    /// The chat continues without the avatar.
    TextOnly,
}

/// Mutable session flags. Owned by the session controller; other components
/// only see [`SessionStatus`] snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub initialized: bool,
    pub starting: bool,
    pub active: bool,
    pub connected: bool,
    pub last_error: Option<String>,
}

impl SessionState {
    pub fn phase(&self, text_only: bool) -> SessionPhase {
        if text_only {
            SessionPhase::TextOnly
        } else if self.active {
            SessionPhase::Active
        } else if self.starting {
            SessionPhase::Starting
        } else if self.initialized {
            SessionPhase::Initialized
        } else {
            SessionPhase::Uninitialized
        }
    }

    /// Reset everything that belongs to a running session.
    pub fn end_session(&mut self) {
        self.starting = false;
        self.active = false;
        self.connected = false;
    }
}

/// Read-only snapshot exposed to host applications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub phase: SessionPhase,
    pub is_initialized: bool,
    pub is_ready: bool,
    pub is_active: bool,
    pub is_connected: bool,
    pub is_speaking: bool,
    pub text_only: bool,
    pub error: Option<String>,
}
