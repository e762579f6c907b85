//! Callback types for avatar sessions

use std::sync::{Arc, Weak};

use super::transport::MediaElement;

/// Callback without payload (speaking start/end, session start/end).
pub type NotifyCallback = Arc<dyn Fn() + Send + Sync>;

/// Callback receiving a text payload (errors, streamed message text).
pub type TextCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Callback receiving a weak reference to a rendered media element.
///
/// The negotiator keeps the only strong reference; UI layers must not extend
/// the element's lifetime past a transport teardown.
pub type ElementCallback = Arc<dyn Fn(Weak<MediaElement>) + Send + Sync>;

/// Event callbacks registered by the host application.
///
/// Every field is optional; unset callbacks are skipped.
#[derive(Clone, Default)]
pub struct AvatarCallbacks {
    pub on_video_ready: Option<ElementCallback>,
    pub on_audio_ready: Option<ElementCallback>,
    pub on_speaking_start: Option<NotifyCallback>,
    pub on_speaking_end: Option<NotifyCallback>,
    pub on_error: Option<TextCallback>,
    pub on_session_start: Option<NotifyCallback>,
    pub on_session_end: Option<NotifyCallback>,
    /// Receives the full accumulated text after every streamed delta.
    pub on_message_update: Option<TextCallback>,
    /// Receives the final text once the chat stream has ended.
    pub on_message_complete: Option<TextCallback>,
}

impl AvatarCallbacks {
    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(f));
        self
    }

    pub fn on_speaking_start<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_speaking_start = Some(Arc::new(f));
        self
    }

    pub fn on_speaking_end<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_speaking_end = Some(Arc::new(f));
        self
    }

    pub fn on_session_start<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_session_start = Some(Arc::new(f));
        self
    }

    pub fn on_session_end<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_session_end = Some(Arc::new(f));
        self
    }

    pub fn on_video_ready<F>(mut self, f: F) -> Self
    where
        F: Fn(Weak<MediaElement>) + Send + Sync + 'static,
    {
        self.on_video_ready = Some(Arc::new(f));
        self
    }

    pub fn on_audio_ready<F>(mut self, f: F) -> Self
    where
        F: Fn(Weak<MediaElement>) + Send + Sync + 'static,
    {
        self.on_audio_ready = Some(Arc::new(f));
        self
    }

    pub fn on_message_update<F>(mut self, f: F) -> Self
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        self.on_message_update = Some(Arc::new(f));
        self
    }

    pub fn on_message_complete<F>(mut self, f: F) -> Self
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        self.on_message_complete = Some(Arc::new(f));
        self
    }

    pub(crate) fn error(&self, message: impl Into<String>) {
        if let Some(cb) = &self.on_error {
            cb(message.into());
        }
    }

    pub(crate) fn speaking_start(&self) {
        if let Some(cb) = &self.on_speaking_start {
            cb();
        }
    }

    pub(crate) fn speaking_end(&self) {
        if let Some(cb) = &self.on_speaking_end {
            cb();
        }
    }

    pub(crate) fn session_start(&self) {
        if let Some(cb) = &self.on_session_start {
            cb();
        }
    }

    pub(crate) fn session_end(&self) {
        if let Some(cb) = &self.on_session_end {
            cb();
        }
    }

    pub(crate) fn video_ready(&self, element: Weak<MediaElement>) {
        if let Some(cb) = &self.on_video_ready {
            cb(element);
        }
    }

    pub(crate) fn audio_ready(&self, element: Weak<MediaElement>) {
        if let Some(cb) = &self.on_audio_ready {
            cb(element);
        }
    }

    pub(crate) fn message_update(&self, text: &str) {
        if let Some(cb) = &self.on_message_update {
            cb(text.to_string());
        }
    }

    pub(crate) fn message_complete(&self, text: &str) {
        if let Some(cb) = &self.on_message_complete {
            cb(text.to_string());
        }
    }
}

impl std::fmt::Debug for AvatarCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AvatarCallbacks")
            .field("on_video_ready", &self.on_video_ready.is_some())
            .field("on_audio_ready", &self.on_audio_ready.is_some())
            .field("on_speaking_start", &self.on_speaking_start.is_some())
            .field("on_speaking_end", &self.on_speaking_end.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_session_start", &self.on_session_start.is_some())
            .field("on_session_end", &self.on_session_end.is_some())
            .field("on_message_update", &self.on_message_update.is_some())
            .field("on_message_complete", &self.on_message_complete.is_some())
            .finish()
    }
}
