//! Degradation when the avatar is unavailable.
//!
//! Two fallbacks exist. Text-only mode keeps the chat running without any
//! avatar speech. Local narration speaks through a [`LocalSpeech`]
//! implementation instead of the avatar. Independently, a pre-session error
//! can be cleared after a delay so the host may try to start again.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::config::DegradationPolicy;
use super::dispatcher::SpeechDispatcher;
use super::errors::{AvatarError, AvatarResult};

/// Shared text-only flag. Once enabled it stays enabled for the session.
#[derive(Debug, Clone, Default)]
pub struct TextOnlyMode(Arc<AtomicBool>);

impl TextOnlyMode {
    pub fn is_enabled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn enable(&self) -> bool {
        !self.0.swap(true, Ordering::SeqCst)
    }
}

/// Speech output used when the avatar cannot speak.
#[async_trait]
pub trait LocalSpeech: Send + Sync {
    async fn speak(&self, text: &str) -> AvatarResult<()>;

    /// Cancel anything currently being narrated.
    fn cancel(&self);
}

/// [`LocalSpeech`] that narrates into the log. Used when no local voice is
/// available, e.g. on a headless host.
#[derive(Debug, Default)]
pub struct TracingNarrator;

#[async_trait]
impl LocalSpeech for TracingNarrator {
    async fn speak(&self, text: &str) -> AvatarResult<()> {
        info!(target: "intervue::narrator", "{text}");
        Ok(())
    }

    fn cancel(&self) {}
}

/// Tracks text-only mode, local narration and the error auto-reset timer.
pub struct DegradationController {
    policy: DegradationPolicy,
    auto_retry_delay: Duration,
    text_only: TextOnlyMode,
    local: Arc<dyn LocalSpeech>,
    error_reset: Mutex<Option<CancellationToken>>,
}

impl DegradationController {
    pub fn new(
        policy: DegradationPolicy,
        auto_retry_delay: Duration,
        local: Arc<dyn LocalSpeech>,
    ) -> Self {
        Self {
            policy,
            auto_retry_delay,
            text_only: TextOnlyMode::default(),
            local,
            error_reset: Mutex::new(None),
        }
    }

    /// Handle to the text-only flag for components that only read it.
    pub fn text_only_mode(&self) -> TextOnlyMode {
        self.text_only.clone()
    }

    pub fn is_text_only(&self) -> bool {
        self.text_only.is_enabled()
    }

    /// Switch to text-only mode. Fails when the policy forbids it.
    pub fn enable_text_only(&self) -> AvatarResult<()> {
        if !self.policy.allow_text_only {
            return Err(AvatarError::InvalidInput(
                "Text-only mode is disabled".to_string(),
            ));
        }
        if self.text_only.enable() {
            info!("Text-only mode enabled, avatar speech disabled");
        }
        Ok(())
    }

    /// Schedule `reset` to run after the auto-retry delay. Replaces any
    /// pending reset. Returns false when the policy disables auto-retry.
    ///
    /// The reset only clears error state; it never starts a session itself.
    pub fn schedule_error_reset<F>(&self, reset: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        if !self.policy.auto_retry {
            return false;
        }

        let token = CancellationToken::new();
        if let Some(previous) = self.error_reset.lock().replace(token.clone()) {
            previous.cancel();
        }

        let delay = self.auto_retry_delay;
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!("Error reset cancelled");
                }
                _ = tokio::time::sleep(delay) => {
                    info!(delay_ms = delay.as_millis() as u64, "Clearing avatar error for retry");
                    reset();
                }
            }
        });
        true
    }

    pub fn cancel_error_reset(&self) {
        if let Some(token) = self.error_reset.lock().take() {
            token.cancel();
        }
    }

    /// Cancel local narration before the avatar speaks.
    pub fn silence_local(&self) {
        self.local.cancel();
    }

    /// Narrate `text` locally, cancelling avatar speech first so the two
    /// never overlap.
    pub async fn narrate_locally(
        &self,
        dispatcher: &SpeechDispatcher,
        text: &str,
    ) -> AvatarResult<()> {
        if dispatcher.is_busy()
            && let Err(e) = dispatcher.stop_speaking().await
        {
            debug!(error = %e, "Failed to stop avatar before local narration");
        }
        self.local.cancel();
        self.local.speak(text).await
    }
}

impl Drop for DegradationController {
    fn drop(&mut self) {
        self.cancel_error_reset();
    }
}
