//! Media transport negotiation.
//!
//! One negotiation attempt creates a transport from fresh relay credentials,
//! adds receive-only video and audio transceivers, starts the avatar over it
//! and then waits for the connection to be confirmed. Either an ICE state of
//! `connected`/`completed` or the arrival of the first video track confirms
//! it, whichever comes first. A watchdog bounds the whole attempt.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::element::{MediaContainer, MediaElement, Presentation};
use super::{
    IceConnectionState, InboundTrack, MediaKind, PeerTransport, TransceiverDirection,
    TransportConfig, TransportEvent, TransportFactory,
};
use crate::core::avatar::callbacks::AvatarCallbacks;
use crate::core::avatar::credentials::RelayToken;
use crate::core::avatar::engine::AvatarEngine;
use crate::core::avatar::errors::TransportError;

/// Called when a confirmed link drops (`disconnected`, `failed` or `closed`).
pub type LinkLostCallback = Arc<dyn Fn(IceConnectionState) + Send + Sync>;

type Settle = oneshot::Sender<Result<(), TransportError>>;

/// State shared between the negotiator and the transport event pump.
struct LinkMedia {
    container: Arc<dyn MediaContainer>,
    video: Mutex<Option<Arc<MediaElement>>>,
    audio: Mutex<Option<Arc<MediaElement>>>,
    video_presentation: Presentation,
    callbacks: Arc<AvatarCallbacks>,
    on_link_lost: Option<LinkLostCallback>,
    settle: Mutex<Option<Settle>>,
    connected: AtomicBool,
}

impl LinkMedia {
    /// Resolve the pending attempt. Returns false if it was already resolved.
    fn settle(&self, result: Result<(), TransportError>) -> bool {
        let Some(tx) = self.settle.lock().take() else {
            return false;
        };
        if result.is_ok() {
            self.connected.store(true, Ordering::SeqCst);
        }
        // The receiver is gone when the watchdog already fired.
        let _ = tx.send(result);
        true
    }

    fn on_ice_state(&self, state: IceConnectionState) {
        debug!(%state, "ICE connection state changed");

        if state.is_established() {
            if self.settle(Ok(())) {
                info!(%state, "Media transport confirmed by ICE state");
            }
        } else if state.is_lost() {
            self.on_lost(state);
        }
    }

    fn on_lost(&self, state: IceConnectionState) {
        if self.settle(Err(TransportError::ConnectionFailed(state))) {
            return;
        }

        // Confirmed earlier; report the first drop only.
        if self.connected.swap(false, Ordering::SeqCst) {
            warn!(%state, "Media transport lost after confirmation");
            if let Some(cb) = &self.on_link_lost {
                cb(state);
            }
        }
    }

    fn on_track(&self, track: InboundTrack) {
        info!(kind = %track.kind, track_id = %track.track_id, "Received remote track");

        let presentation = match track.kind {
            MediaKind::Video => self.video_presentation.clone(),
            MediaKind::Audio => Presentation::default(),
        };
        let element = Arc::new(MediaElement::for_track(&track, presentation));

        let removed = self.container.remove_kind(track.kind);
        if removed > 0 {
            debug!(kind = %track.kind, removed, "Replaced existing media element");
        }
        self.container.append(element.clone());

        match track.kind {
            MediaKind::Video => {
                *self.video.lock() = Some(element.clone());
                self.callbacks.video_ready(Arc::downgrade(&element));
                if self.settle(Ok(())) {
                    info!("Media transport confirmed by first video track");
                }
            }
            MediaKind::Audio => {
                *self.audio.lock() = Some(element.clone());
                self.callbacks.audio_ready(Arc::downgrade(&element));
            }
        }
    }
}

async fn pump_events(media: Arc<LinkMedia>, mut events: mpsc::UnboundedReceiver<TransportEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            TransportEvent::IceStateChanged(state) => media.on_ice_state(state),
            TransportEvent::ConnectionFailed => {
                warn!("Peer connection reported failure");
                media.on_lost(IceConnectionState::Failed);
            }
            TransportEvent::Track(track) => media.on_track(track),
        }
    }

    debug!("Transport event stream ended");
    media.settle(Err(TransportError::Closed));
}

struct ActiveLink {
    transport: Arc<dyn PeerTransport>,
    media: Arc<LinkMedia>,
    pump: JoinHandle<()>,
}

/// Negotiates the avatar media transport and owns the resulting link.
///
/// The negotiator holds the only strong references to the transport and its
/// rendered elements (besides the container); callbacks receive weak ones.
pub struct MediaNegotiator {
    factory: Arc<dyn TransportFactory>,
    callbacks: Arc<AvatarCallbacks>,
    video_presentation: Presentation,
    on_link_lost: Option<LinkLostCallback>,
    link: Mutex<Option<ActiveLink>>,
}

impl MediaNegotiator {
    pub fn new(
        factory: Arc<dyn TransportFactory>,
        callbacks: Arc<AvatarCallbacks>,
        background_image: Option<String>,
    ) -> Self {
        Self {
            factory,
            callbacks,
            video_presentation: Presentation {
                background_image,
                ..Presentation::default()
            },
            on_link_lost: None,
            link: Mutex::new(None),
        }
    }

    /// Register the handler invoked when a confirmed link drops.
    pub fn with_link_lost(mut self, callback: LinkLostCallback) -> Self {
        self.on_link_lost = Some(callback);
        self
    }

    /// Run one negotiation attempt.
    ///
    /// Any previous link is torn down first. On failure the transport created
    /// for this attempt is closed and its elements are removed from the
    /// container.
    ///
    /// # Arguments
    /// * `relay` - Fresh relay credentials for this attempt
    /// * `engine` - Engine that publishes the avatar over the transport
    /// * `container` - Where rendered elements are attached
    /// * `timeout` - Watchdog for the whole attempt
    pub async fn negotiate(
        &self,
        relay: &RelayToken,
        engine: &Arc<dyn AvatarEngine>,
        container: Arc<dyn MediaContainer>,
        timeout: Duration,
    ) -> Result<(), TransportError> {
        self.teardown().await;

        let config = TransportConfig::from_relay(relay)?;
        let (transport, events) = self.factory.create(config)?;

        let (tx, rx) = oneshot::channel();
        let media = Arc::new(LinkMedia {
            container: container.clone(),
            video: Mutex::new(None),
            audio: Mutex::new(None),
            video_presentation: self.video_presentation.clone(),
            callbacks: self.callbacks.clone(),
            on_link_lost: self.on_link_lost.clone(),
            settle: Mutex::new(Some(tx)),
            connected: AtomicBool::new(false),
        });
        let pump = tokio::spawn(pump_events(media.clone(), events));

        let result = tokio::time::timeout(timeout, Self::establish(&transport, engine, rx))
            .await
            .unwrap_or(Err(TransportError::Timeout(timeout)));

        match result {
            Ok(()) => {
                info!("Media transport established");
                *self.link.lock() = Some(ActiveLink {
                    transport,
                    media,
                    pump,
                });
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Media transport negotiation failed");
                pump.abort();
                transport.close().await;
                container.remove_kind(MediaKind::Video);
                container.remove_kind(MediaKind::Audio);
                Err(e)
            }
        }
    }

    async fn establish(
        transport: &Arc<dyn PeerTransport>,
        engine: &Arc<dyn AvatarEngine>,
        confirmed: oneshot::Receiver<Result<(), TransportError>>,
    ) -> Result<(), TransportError> {
        transport.add_transceiver(MediaKind::Video, TransceiverDirection::RecvOnly)?;
        transport.add_transceiver(MediaKind::Audio, TransceiverDirection::RecvOnly)?;

        let outcome = engine
            .start_avatar(transport.clone())
            .await
            .map_err(|e| TransportError::StartFailed(e.to_string()))?;
        if !outcome.is_completed() {
            return Err(TransportError::StartFailed(outcome.failure_message()));
        }
        debug!("Avatar started, waiting for connection confirmation");

        confirmed.await.unwrap_or(Err(TransportError::Closed))
    }

    /// Close the active link (if any) and clear its container.
    pub async fn teardown(&self) {
        let link = self.link.lock().take();
        if let Some(link) = link {
            link.pump.abort();
            link.transport.close().await;
            link.media.container.clear();
            info!("Media transport closed");
        }
    }

    pub fn has_link(&self) -> bool {
        self.link.lock().is_some()
    }

    pub fn is_connected(&self) -> bool {
        self.link
            .lock()
            .as_ref()
            .is_some_and(|l| l.media.connected.load(Ordering::SeqCst))
    }

    pub fn audio_element(&self) -> Option<Arc<MediaElement>> {
        self.link
            .lock()
            .as_ref()
            .and_then(|l| l.media.audio.lock().clone())
    }

    pub fn video_element(&self) -> Option<Arc<MediaElement>> {
        self.link
            .lock()
            .as_ref()
            .and_then(|l| l.media.video.lock().clone())
    }
}

impl Drop for MediaNegotiator {
    fn drop(&mut self) {
        if let Some(link) = self.link.get_mut().take() {
            link.pump.abort();
        }
    }
}
