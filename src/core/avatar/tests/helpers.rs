//! Shared helpers for avatar session tests.

use std::sync::Arc;

use parking_lot::Mutex;

use super::stubs::{
    AttemptScript, RecordingNarrator, StubChatSource, StubCredentials, StubEngine,
    StubEngineProvider, StubTransportFactory,
};
use crate::core::avatar::{
    AvatarCallbacks, AvatarSession, AvatarSessionConfig, ElementContainer, MediaContainer,
    MediaElement, MediaKind, SessionDependencies,
};

/// Ordered log of callback invocations.
#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub fn count(&self, event: &str) -> usize {
        self.0.lock().iter().filter(|e| *e == event).count()
    }

    pub fn errors(&self) -> Vec<String> {
        self.0
            .lock()
            .iter()
            .filter_map(|e| e.strip_prefix("error:").map(str::to_string))
            .collect()
    }

    pub fn position(&self, event: &str) -> Option<usize> {
        self.0.lock().iter().position(|e| e == event)
    }

    /// Callbacks that append to this log.
    pub fn callbacks(&self) -> AvatarCallbacks {
        let (a, b, c, d, e, f, g, h, i) = (
            self.clone(),
            self.clone(),
            self.clone(),
            self.clone(),
            self.clone(),
            self.clone(),
            self.clone(),
            self.clone(),
            self.clone(),
        );
        AvatarCallbacks::default()
            .on_speaking_start(move || a.push("speaking_start"))
            .on_speaking_end(move || b.push("speaking_end"))
            .on_error(move |m| c.push(format!("error:{m}")))
            .on_session_start(move || d.push("session_start"))
            .on_session_end(move || e.push("session_end"))
            .on_video_ready(move |_| f.push("video_ready"))
            .on_audio_ready(move |_| g.push("audio_ready"))
            .on_message_update(move |t| h.push(format!("update:{t}")))
            .on_message_complete(move |t| i.push(format!("complete:{t}")))
    }
}

/// Handles to every stub behind a session.
pub struct Harness {
    pub session: AvatarSession,
    pub log: EventLog,
    pub engine: Arc<StubEngine>,
    pub engines: Arc<StubEngineProvider>,
    pub transports: Arc<StubTransportFactory>,
    pub credentials: Arc<StubCredentials>,
    pub chat: Arc<StubChatSource>,
    pub narrator: Arc<RecordingNarrator>,
    pub container: Arc<ElementContainer>,
}

pub struct HarnessBuilder {
    config: AvatarSessionConfig,
    scripts: Vec<AttemptScript>,
    engine: Arc<StubEngine>,
    chat: Arc<StubChatSource>,
}

impl HarnessBuilder {
    pub fn new() -> Self {
        Self {
            config: AvatarSessionConfig::default(),
            scripts: vec![AttemptScript::ConfirmByIce],
            engine: StubEngine::new(),
            chat: Arc::new(StubChatSource::default()),
        }
    }

    pub fn config(mut self, config: AvatarSessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn scripts(mut self, scripts: Vec<AttemptScript>) -> Self {
        self.scripts = scripts;
        self
    }

    pub fn engine(mut self, engine: Arc<StubEngine>) -> Self {
        self.engine = engine;
        self
    }

    pub fn chat(mut self, chat: Arc<StubChatSource>) -> Self {
        self.chat = chat;
        self
    }

    pub fn build(self) -> Harness {
        let log = EventLog::default();
        let engines = Arc::new(StubEngineProvider::new(self.engine.clone()));
        let transports = Arc::new(StubTransportFactory::new(self.scripts));
        let credentials = Arc::new(StubCredentials::default());
        let narrator = Arc::new(RecordingNarrator::default());

        let deps = SessionDependencies {
            credentials: credentials.clone(),
            engines: engines.clone(),
            transports: transports.clone(),
            chat: self.chat.clone(),
            local_speech: narrator.clone(),
        };

        Harness {
            session: AvatarSession::new(self.config, deps, log.callbacks()),
            log,
            engine: self.engine,
            engines,
            transports,
            credentials,
            chat: self.chat,
            narrator,
            container: Arc::new(ElementContainer::new()),
        }
    }
}

/// A session that has been initialized and started.
pub async fn active_harness(builder: HarnessBuilder) -> Harness {
    let harness = builder.build();
    harness.session.initialize().await.unwrap();
    harness
        .session
        .start_session(harness.container.clone())
        .await
        .unwrap();
    harness
}

impl Harness {
    pub fn audio_element(&self) -> Option<Arc<MediaElement>> {
        self.container
            .elements()
            .into_iter()
            .find(|e| e.kind() == MediaKind::Audio)
    }
}

/// Let spawned tasks (event pump, speech worker) run.
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}
