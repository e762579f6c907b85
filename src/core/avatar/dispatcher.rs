//! Speech dispatch onto the avatar.
//!
//! Utterances are spoken strictly one at a time, in the order they were
//! submitted. A single worker task drains the FIFO queue; while it is busy,
//! new requests are appended and the caller returns immediately.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::{Notify, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::callbacks::AvatarCallbacks;
use super::degradation::TextOnlyMode;
use super::engine::{AvatarEngine, SynthesisReason};
use super::errors::{AvatarError, AvatarResult};
use super::ssml::build_avatar_ssml;
use super::transport::MediaNegotiator;

struct SpeechRequest {
    text: String,
    /// Signalled once this request has been spoken.
    done: Option<oneshot::Sender<()>>,
}

struct DispatcherInner {
    voice: String,
    language: String,
    callbacks: Arc<AvatarCallbacks>,
    negotiator: Arc<MediaNegotiator>,
    text_only: TextOnlyMode,
    engine: Mutex<Option<Arc<dyn AvatarEngine>>>,
    queue: Mutex<VecDeque<SpeechRequest>>,
    /// Generation of the worker currently speaking, 0 when silent.
    speaking: AtomicU64,
    /// Generation of the live worker. Bumped on shutdown so a detached
    /// worker can no longer touch dispatcher state.
    generation: AtomicU64,
    /// Set by `stop_speaking`; a canceled outcome afterwards is not an error.
    interrupted: AtomicBool,
    notify: Notify,
    idle: Notify,
    worker: Mutex<Option<(JoinHandle<()>, CancellationToken)>>,
}

impl DispatcherInner {
    fn is_busy(&self) -> bool {
        self.speaking.load(Ordering::SeqCst) != 0 || !self.queue.lock().is_empty()
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Clear the speaking marker if it still belongs to `generation`.
    fn clear_speaking(&self, generation: u64) {
        let _ = self
            .speaking
            .compare_exchange(generation, 0, Ordering::SeqCst, Ordering::SeqCst);
    }

    async fn synthesize(&self, text: &str, generation: u64) {
        let Some(engine) = self.engine.lock().clone() else {
            warn!("Engine released, dropping queued utterance");
            return;
        };
        self.interrupted.store(false, Ordering::SeqCst);

        let audio = self.negotiator.audio_element();
        if let Some(element) = &audio {
            element.set_muted(false);
        }
        self.callbacks.speaking_start();

        let ssml = build_avatar_ssml(text, &self.voice, &self.language);
        debug!(chars = text.len(), "Speaking utterance");

        let result = match engine.speak_ssml(&ssml).await {
            Ok(outcome) if outcome.is_completed() => Ok(()),
            Ok(outcome)
                if outcome.reason == SynthesisReason::Canceled
                    && self.interrupted.load(Ordering::SeqCst) =>
            {
                debug!("Utterance interrupted");
                Ok(())
            }
            Ok(outcome) => Err(AvatarError::SpeechSynthesis(outcome.failure_message())),
            Err(e) => Err(e),
        };

        if !self.is_current(generation) {
            // Shut down mid-utterance; stop_speaking already reported the end.
            debug!("Dropping outcome of an utterance from a stopped session");
            return;
        }

        if let Err(e) = result {
            error!(error = %e, "Speech synthesis failed");
            self.callbacks.error(e.to_string());
        }

        self.callbacks.speaking_end();
        if let Some(element) = audio {
            element.set_muted(true);
        }
    }
}

/// Reject empty or whitespace-only text.
pub(crate) fn validate_text(text: &str) -> AvatarResult<()> {
    if text.trim().is_empty() {
        return Err(AvatarError::InvalidInput(
            "Text to speak must not be empty".to_string(),
        ));
    }
    Ok(())
}

async fn run_worker(inner: Arc<DispatcherInner>, token: CancellationToken, generation: u64) {
    debug!(generation, "Speech worker started");

    while !token.is_cancelled() {
        let next = {
            let mut queue = inner.queue.lock();
            let next = queue.pop_front();
            match next {
                Some(_) => inner.speaking.store(generation, Ordering::SeqCst),
                None => inner.clear_speaking(generation),
            }
            next
        };

        match next {
            Some(request) => {
                inner.synthesize(&request.text, generation).await;
                if let Some(done) = request.done {
                    let _ = done.send(());
                }
            }
            None => {
                inner.idle.notify_waiters();
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = inner.notify.notified() => {}
                }
            }
        }
    }

    inner.clear_speaking(generation);
    inner.idle.notify_waiters();
    debug!(generation, "Speech worker exited");
}

/// Serializes avatar utterances.
#[derive(Clone)]
pub struct SpeechDispatcher {
    inner: Arc<DispatcherInner>,
}

impl SpeechDispatcher {
    pub fn new(
        voice: impl Into<String>,
        language: impl Into<String>,
        callbacks: Arc<AvatarCallbacks>,
        negotiator: Arc<MediaNegotiator>,
        text_only: TextOnlyMode,
    ) -> Self {
        Self {
            inner: Arc::new(DispatcherInner {
                voice: voice.into(),
                language: language.into(),
                callbacks,
                negotiator,
                text_only,
                engine: Mutex::new(None),
                queue: Mutex::new(VecDeque::new()),
                speaking: AtomicU64::new(0),
                generation: AtomicU64::new(0),
                interrupted: AtomicBool::new(false),
                notify: Notify::new(),
                idle: Notify::new(),
                worker: Mutex::new(None),
            }),
        }
    }

    /// Bind the engine utterances are spoken with.
    pub fn attach_engine(&self, engine: Arc<dyn AvatarEngine>) {
        *self.inner.engine.lock() = Some(engine);
    }

    pub fn has_engine(&self) -> bool {
        self.inner.engine.lock().is_some()
    }

    /// Speak `text` on the avatar.
    ///
    /// When the dispatcher is idle this resolves after the utterance has been
    /// spoken. When it is busy the text is queued and this returns right away.
    /// Synthesis failures are reported through the error callback, not here.
    ///
    /// # Errors
    /// * `InvalidInput` - `text` is empty or whitespace
    /// * `NotReady` - no engine is attached
    pub async fn speak(&self, text: &str) -> AvatarResult<()> {
        validate_text(text)?;

        if self.inner.text_only.is_enabled() {
            info!("Text-only mode, skipping avatar speech");
            return Ok(());
        }

        if !self.has_engine() {
            return Err(AvatarError::NotReady(
                "Avatar synthesizer not initialized".to_string(),
            ));
        }

        let (tx, rx) = oneshot::channel();
        let busy = {
            let mut queue = self.inner.queue.lock();
            let busy = self.inner.speaking.load(Ordering::SeqCst) != 0 || !queue.is_empty();
            queue.push_back(SpeechRequest {
                text: text.to_string(),
                done: (!busy).then_some(tx),
            });
            if busy {
                debug!(queued = queue.len(), "Speech queued");
            }
            busy
        };

        self.ensure_worker();
        self.inner.notify.notify_one();

        if !busy {
            // Sender dropped means the queue was cleared by stop_speaking.
            let _ = rx.await;
        }
        Ok(())
    }

    /// Queue `text` without waiting for it to be spoken. Blank text and
    /// text-only mode are silently ignored.
    pub fn enqueue(&self, text: &str) {
        if text.trim().is_empty() || self.inner.text_only.is_enabled() {
            return;
        }
        if !self.has_engine() {
            warn!("No avatar engine, dropping utterance");
            return;
        }

        self.inner.queue.lock().push_back(SpeechRequest {
            text: text.to_string(),
            done: None,
        });
        self.ensure_worker();
        self.inner.notify.notify_one();
    }

    /// Cancel the current utterance and drop everything queued.
    ///
    /// Always fires the speaking-end callback.
    pub async fn stop_speaking(&self) -> AvatarResult<()> {
        let dropped = {
            let mut queue = self.inner.queue.lock();
            let dropped = queue.len();
            queue.clear();
            dropped
        };
        self.inner.interrupted.store(true, Ordering::SeqCst);

        let engine = self.inner.engine.lock().clone();
        let result = match engine {
            Some(engine) => engine.stop_speaking().await,
            None => Ok(()),
        };

        if let Some(element) = self.inner.negotiator.audio_element() {
            element.set_muted(true);
        }
        self.inner.callbacks.speaking_end();
        info!(dropped, "Stopped speaking");

        result
    }

    /// Stop the worker and release the engine.
    ///
    /// A worker still waiting on an utterance is detached. It no longer
    /// affects speaking state, callbacks or a worker started afterwards.
    pub fn shutdown(&self) {
        if let Some((handle, token)) = self.inner.worker.lock().take() {
            token.cancel();
            drop(handle);
        }
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        self.inner.queue.lock().clear();
        self.inner.speaking.store(0, Ordering::SeqCst);
        *self.inner.engine.lock() = None;
        self.inner.idle.notify_waiters();
    }

    pub fn is_speaking(&self) -> bool {
        self.inner.speaking.load(Ordering::SeqCst) != 0
    }

    /// Speaking or holding queued utterances.
    pub fn is_busy(&self) -> bool {
        self.inner.is_busy()
    }

    pub fn queue_len(&self) -> usize {
        self.inner.queue.lock().len()
    }

    /// Wait until nothing is being spoken or queued.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if !self.is_busy() {
                return;
            }
            notified.await;
        }
    }

    fn ensure_worker(&self) {
        let mut worker = self.inner.worker.lock();
        if let Some((handle, _)) = worker.as_ref()
            && !handle.is_finished()
        {
            return;
        }

        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let token = CancellationToken::new();
        let handle = tokio::spawn(run_worker(self.inner.clone(), token.clone(), generation));
        *worker = Some((handle, token));
    }
}
