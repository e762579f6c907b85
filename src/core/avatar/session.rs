//! Avatar session controller.
//!
//! [`AvatarSession`] owns the session lifecycle:
//!
//! ```text
//! Uninitialized --initialize--> Initialized --start_session--> Starting --> Active
//!                                    ^                            |           |
//!                                    |      (all attempts fail)   |           |
//!                                    +----------------------------+           |
//!                                    +-------------- stop_session ------------+
//! ```
//!
//! Text-only mode can be entered from any state and makes the session count
//! as ready without an avatar.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use super::callbacks::AvatarCallbacks;
use super::chat::{ChatCompletionSource, HttpChatSource, ResponseStreamer};
use super::config::AvatarSessionConfig;
use super::credentials::{CredentialSource, HttpCredentialSource};
use super::degradation::{DegradationController, LocalSpeech, TracingNarrator};
use super::dispatcher::{SpeechDispatcher, validate_text};
use super::engine::{AvatarEngine, AvatarEvent, AvatarEventSink, EngineProvider, EngineSetup};
use super::errors::{AvatarError, AvatarResult};
use super::state::{SessionState, SessionStatus};
use super::transport::{LinkLostCallback, MediaContainer, MediaNegotiator, TransportFactory};
use crate::core::interview::ChatContext;

/// External collaborators of a session.
#[derive(Clone)]
pub struct SessionDependencies {
    pub credentials: Arc<dyn CredentialSource>,
    pub engines: Arc<dyn EngineProvider>,
    pub transports: Arc<dyn TransportFactory>,
    pub chat: Arc<dyn ChatCompletionSource>,
    pub local_speech: Arc<dyn LocalSpeech>,
}

impl SessionDependencies {
    /// Dependencies that talk to the credential and chat endpoints of the
    /// server at `base_url` and narrate locally into the log.
    pub fn http(
        base_url: &str,
        timeout: Duration,
        engines: Arc<dyn EngineProvider>,
        transports: Arc<dyn TransportFactory>,
    ) -> AvatarResult<Self> {
        let credentials = HttpCredentialSource::new(base_url, timeout)
            .map_err(|e| AvatarError::Initialization(e.to_string()))?;
        let chat = HttpChatSource::new(base_url, timeout)?;

        Ok(Self {
            credentials: Arc::new(credentials),
            engines,
            transports,
            chat: Arc::new(chat),
            local_speech: Arc::new(TracingNarrator),
        })
    }
}

struct SessionInner {
    config: AvatarSessionConfig,
    deps: SessionDependencies,
    callbacks: Arc<AvatarCallbacks>,
    state: Arc<Mutex<SessionState>>,
    engine: Mutex<Option<Arc<dyn AvatarEngine>>>,
    negotiator: Arc<MediaNegotiator>,
    dispatcher: SpeechDispatcher,
    streamer: ResponseStreamer,
    degradation: DegradationController,
    /// Serializes initialize, start and stop.
    lifecycle: tokio::sync::Mutex<()>,
}

impl Drop for SessionInner {
    fn drop(&mut self) {
        self.dispatcher.shutdown();
    }
}

/// A chat-driven avatar session. Cheap to clone; clones share the session.
#[derive(Clone)]
pub struct AvatarSession {
    inner: Arc<SessionInner>,
}

impl AvatarSession {
    /// Create a session. Nothing is fetched or connected until
    /// [`initialize`](Self::initialize) and [`start_session`](Self::start_session).
    pub fn new(
        config: AvatarSessionConfig,
        deps: SessionDependencies,
        callbacks: AvatarCallbacks,
    ) -> Self {
        let callbacks = Arc::new(callbacks);
        let state = Arc::new(Mutex::new(SessionState::default()));

        let link_lost: LinkLostCallback = {
            let state = state.clone();
            let callbacks = callbacks.clone();
            Arc::new(move |ice_state| {
                let message = format!("WebRTC connection lost: {ice_state}");
                {
                    let mut state = state.lock();
                    state.connected = false;
                    state.last_error = Some(message.clone());
                }
                callbacks.error(message);
            })
        };

        let negotiator = Arc::new(
            MediaNegotiator::new(
                deps.transports.clone(),
                callbacks.clone(),
                config.background_image.clone(),
            )
            .with_link_lost(link_lost),
        );
        let degradation = DegradationController::new(
            config.degradation,
            config.timings.auto_retry_delay,
            deps.local_speech.clone(),
        );
        let dispatcher = SpeechDispatcher::new(
            config.voice.clone(),
            config.language.clone(),
            callbacks.clone(),
            negotiator.clone(),
            degradation.text_only_mode(),
        );
        let streamer =
            ResponseStreamer::new(deps.chat.clone(), dispatcher.clone(), callbacks.clone());

        Self {
            inner: Arc::new(SessionInner {
                config,
                deps,
                callbacks,
                state,
                engine: Mutex::new(None),
                negotiator,
                dispatcher,
                streamer,
                degradation,
                lifecycle: tokio::sync::Mutex::new(()),
            }),
        }
    }

    pub fn config(&self) -> &AvatarSessionConfig {
        &self.inner.config
    }

    /// Fetch credentials and construct the avatar engine.
    ///
    /// Idempotent: once initialized, further calls return immediately without
    /// any network traffic.
    ///
    /// # Errors
    /// * `Initialization` - invalid config, engine not loadable, or a
    ///   credential fetch failed
    pub async fn initialize(&self) -> AvatarResult<()> {
        let _guard = self.inner.lifecycle.lock().await;

        if self.inner.state.lock().initialized {
            debug!("Avatar session already initialized");
            return Ok(());
        }

        info!(
            character = %self.inner.config.character,
            style = %self.inner.config.style,
            "Initializing avatar session"
        );

        match self.build_engine().await {
            Ok(engine) => {
                self.attach_engine(engine);
                let mut state = self.inner.state.lock();
                state.initialized = true;
                state.last_error = None;
                info!("Avatar session initialized");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Avatar session initialization failed");
                self.record_pre_session_error(e.to_string());
                Err(e)
            }
        }
    }

    async fn build_engine(&self) -> AvatarResult<Arc<dyn AvatarEngine>> {
        let inner = &self.inner;
        let private_endpoint = inner.config.private_endpoint.as_deref();

        inner
            .config
            .validate()
            .map_err(AvatarError::Initialization)?;

        inner
            .deps
            .engines
            .ready()
            .await
            .map_err(|e| {
                AvatarError::Initialization(format!("Avatar engine failed to load: {e}"))
            })?;

        let auth = inner.deps.credentials.auth_token().await.map_err(|e| {
            AvatarError::Initialization(format!("Failed to get authentication token: {e}"))
        })?;
        let relay = inner
            .deps
            .credentials
            .relay_token(private_endpoint)
            .await
            .map_err(|e| {
                AvatarError::Initialization(format!("Failed to get ICE server token: {e}"))
            })?;

        let setup = EngineSetup::new(&inner.config, &auth, &relay)?;
        let events: AvatarEventSink = Arc::new(|event: AvatarEvent| {
            debug!(
                description = %event.description,
                offset_ticks = event.offset_ticks,
                "Avatar event"
            );
        });

        inner.deps.engines.create_engine(setup, events).await
    }

    fn attach_engine(&self, engine: Arc<dyn AvatarEngine>) {
        *self.inner.engine.lock() = Some(engine.clone());
        self.inner.dispatcher.attach_engine(engine);
    }

    fn engine(&self) -> Option<Arc<dyn AvatarEngine>> {
        self.inner.engine.lock().clone()
    }

    /// Record an error that happened before a session became active and
    /// schedule it to be cleared so the host may try again.
    fn record_pre_session_error(&self, message: String) {
        self.inner.state.lock().last_error = Some(message);

        let state = self.inner.state.clone();
        self.inner.degradation.schedule_error_reset(move || {
            let mut state = state.lock();
            if !state.active {
                state.last_error = None;
            }
        });
    }

    /// Negotiate the media transport and start the avatar.
    ///
    /// No-op when a session is already active. Each attempt fetches fresh
    /// relay credentials; failed attempts are retried after the configured
    /// delay up to the configured number of attempts.
    ///
    /// # Arguments
    /// * `container` - Where the avatar's video and audio elements are attached
    ///
    /// # Errors
    /// * `NotReady` - [`initialize`](Self::initialize) has not succeeded
    /// * `SessionStart` - every attempt failed; the error callback fires too
    pub async fn start_session(&self, container: Arc<dyn MediaContainer>) -> AvatarResult<()> {
        let _guard = self.inner.lifecycle.lock().await;

        {
            let state = self.inner.state.lock();
            if state.active {
                info!("Avatar session already active");
                return Ok(());
            }
            if !state.initialized {
                return Err(AvatarError::NotReady(
                    "Avatar session not initialized".to_string(),
                ));
            }
        }

        // A previous stop_session released the engine.
        let engine = match self.engine() {
            Some(engine) => engine,
            None => {
                let engine = self.build_engine().await?;
                self.attach_engine(engine.clone());
                engine
            }
        };

        {
            let mut state = self.inner.state.lock();
            state.starting = true;
            state.last_error = None;
        }
        self.inner.degradation.cancel_error_reset();

        let timings = self.inner.config.timings;
        let max_attempts = timings.max_start_attempts;
        let mut last_failure = None;

        for attempt in 1..=max_attempts {
            info!(attempt, max_attempts, "Starting avatar session");

            match self.attempt_start(&engine, container.clone()).await {
                Ok(()) => {
                    {
                        let mut state = self.inner.state.lock();
                        state.starting = false;
                        state.active = true;
                        state.connected = true;
                        state.last_error = None;
                    }
                    info!(attempt, "Avatar session started");
                    self.inner.callbacks.session_start();
                    return Ok(());
                }
                Err(e) => {
                    warn!(attempt, max_attempts, error = %e, "Avatar session start attempt failed");
                    last_failure = Some(e);
                    if attempt < max_attempts {
                        tokio::time::sleep(timings.retry_delay).await;
                    }
                }
            }
        }

        let message = format!(
            "Failed to start session after {max_attempts} attempts: {}",
            last_failure
                .map(|e| match e {
                    AvatarError::Transport(reason) => reason.to_string(),
                    other => other.to_string(),
                })
                .unwrap_or_default()
        );
        error!("{message}");

        self.inner.state.lock().starting = false;
        self.record_pre_session_error(message.clone());
        self.inner.callbacks.error(message.clone());

        Err(AvatarError::SessionStart(message))
    }

    async fn attempt_start(
        &self,
        engine: &Arc<dyn AvatarEngine>,
        container: Arc<dyn MediaContainer>,
    ) -> AvatarResult<()> {
        let relay = self
            .inner
            .deps
            .credentials
            .relay_token(self.inner.config.private_endpoint.as_deref())
            .await
            .map_err(|e| {
                AvatarError::SessionStart(format!("Failed to get ICE server token: {e}"))
            })?;

        self.inner
            .negotiator
            .negotiate(
                &relay,
                engine,
                container,
                self.inner.config.timings.connection_timeout,
            )
            .await?;
        Ok(())
    }

    /// Stop the active session.
    ///
    /// Cancels speech, closes the engine and transport, clears the media
    /// container and fires the session-end callback. Failures while tearing
    /// down are reported through the error callback; the session still ends.
    pub async fn stop_session(&self) -> AvatarResult<()> {
        let _guard = self.inner.lifecycle.lock().await;

        if !self.inner.state.lock().active {
            debug!("No active avatar session to stop");
            return Ok(());
        }

        info!("Stopping avatar session");
        let mut failure = None;

        if let Err(e) = self.inner.dispatcher.stop_speaking().await {
            failure = Some(e);
        }
        self.inner.dispatcher.shutdown();

        let engine = self.inner.engine.lock().take();
        if let Some(engine) = engine
            && let Err(e) = engine.close().await
        {
            failure.get_or_insert(e);
        }

        self.inner.negotiator.teardown().await;
        self.inner.state.lock().end_session();
        self.inner.callbacks.session_end();

        if let Some(e) = failure {
            let message = format!("Failed to stop session: {e}");
            warn!("{message}");
            self.inner.callbacks.error(message);
        }

        info!("Avatar session stopped");
        Ok(())
    }

    /// Speak `text` on the avatar. In text-only mode this is a no-op.
    ///
    /// # Errors
    /// * `InvalidInput` - `text` is empty or whitespace
    /// * `NotReady` - no active session and not in text-only mode
    pub async fn speak(&self, text: &str) -> AvatarResult<()> {
        validate_text(text)?;
        self.ensure_chat_ready()?;
        self.inner.degradation.silence_local();
        self.inner.dispatcher.speak(text).await
    }

    /// Cancel the current utterance and drop queued speech.
    pub async fn stop_speaking(&self) -> AvatarResult<()> {
        if let Err(e) = self.inner.dispatcher.stop_speaking().await {
            let message = format!("Failed to stop speaking: {e}");
            warn!("{message}");
            self.inner.callbacks.error(message);
            return Err(e);
        }
        Ok(())
    }

    /// Send a chat turn, stream the reply and speak it sentence by sentence.
    ///
    /// Returns the full reply text. Failures also fire the error callback
    /// with a `Chat failed:` message.
    pub async fn send_chat_message(&self, context: &ChatContext) -> AvatarResult<String> {
        self.ensure_chat_ready()?;
        self.inner.degradation.silence_local();

        match self.inner.streamer.send_chat_message(context).await {
            Ok(text) => Ok(text),
            Err(e) => {
                error!(error = %e, "Chat turn failed");
                self.inner.callbacks.error(format!("Chat failed: {e}"));
                Err(e)
            }
        }
    }

    /// Speak a closing message with the same semantics as [`speak`](Self::speak).
    pub async fn speak_completion_message(&self, text: &str) -> AvatarResult<()> {
        validate_text(text)?;
        self.ensure_chat_ready()?;
        self.inner.degradation.silence_local();
        self.inner.streamer.speak_completion_message(text).await
    }

    /// Speak on the avatar when possible, otherwise narrate locally.
    ///
    /// Avatar and local speech never overlap: local narration is silenced
    /// before the avatar speaks, and the avatar is stopped before local
    /// narration starts.
    pub async fn speak_with_fallback(&self, text: &str) -> AvatarResult<()> {
        validate_text(text)?;

        if !self.is_text_only() && self.is_active() {
            match self.speak(text).await {
                Ok(()) => return Ok(()),
                Err(e) => warn!(error = %e, "Avatar speech failed, narrating locally"),
            }
        }

        self.inner
            .degradation
            .narrate_locally(&self.inner.dispatcher, text)
            .await
    }

    /// Continue without the avatar. Sticky for the lifetime of the session.
    pub fn enable_text_only_mode(&self) -> AvatarResult<()> {
        self.inner.degradation.enable_text_only()
    }

    fn ensure_chat_ready(&self) -> AvatarResult<()> {
        if self.is_text_only() || self.is_active() {
            Ok(())
        } else {
            Err(AvatarError::NotReady(
                "Avatar session is not active".to_string(),
            ))
        }
    }

    pub fn is_text_only(&self) -> bool {
        self.inner.degradation.is_text_only()
    }

    pub fn is_active(&self) -> bool {
        self.inner.state.lock().active
    }

    /// Ready to take chat turns: an active session with an engine, or
    /// text-only mode.
    pub fn is_ready(&self) -> bool {
        self.is_text_only() || (self.is_active() && self.engine().is_some())
    }

    pub fn is_speaking(&self) -> bool {
        self.inner.dispatcher.is_speaking()
    }

    pub fn last_error(&self) -> Option<String> {
        self.inner.state.lock().last_error.clone()
    }

    /// Wait until all queued speech has been spoken.
    pub async fn wait_until_idle(&self) {
        self.inner.dispatcher.wait_idle().await;
    }

    pub fn status(&self) -> SessionStatus {
        let state = self.inner.state.lock().clone();
        let text_only = self.is_text_only();

        SessionStatus {
            phase: state.phase(text_only),
            is_initialized: state.initialized,
            is_ready: self.is_ready(),
            is_active: state.active,
            is_connected: state.connected && self.inner.negotiator.is_connected(),
            is_speaking: self.is_speaking(),
            text_only,
            error: state.last_error,
        }
    }
}
