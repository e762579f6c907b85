//! Rendered media elements and the container that holds them.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use serde::Serialize;

use super::{InboundTrack, MediaKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectFit {
    Cover,
    Contain,
    Fill,
}

/// Presentation attributes applied to a rendered element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Presentation {
    pub width: String,
    pub height: String,
    pub object_fit: ObjectFit,
    /// Horizontally flipped. The avatar is never mirrored.
    pub mirrored: bool,
    pub background_image: Option<String>,
}

impl Default for Presentation {
    fn default() -> Self {
        Self {
            width: "100%".to_string(),
            height: "100%".to_string(),
            object_fit: ObjectFit::Cover,
            mirrored: false,
            background_image: None,
        }
    }
}

/// A media element bound to one inbound track.
///
/// Elements autoplay and play inline. Audio elements start muted and are
/// only unmuted while an utterance is being spoken.
#[derive(Debug)]
pub struct MediaElement {
    kind: MediaKind,
    track_id: String,
    stream_id: String,
    presentation: Presentation,
    muted: AtomicBool,
}

impl MediaElement {
    pub(crate) fn for_track(track: &InboundTrack, presentation: Presentation) -> Self {
        Self {
            kind: track.kind,
            track_id: track.track_id.clone(),
            stream_id: track.stream_id.clone(),
            presentation,
            muted: AtomicBool::new(track.kind == MediaKind::Audio),
        }
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn track_id(&self) -> &str {
        &self.track_id
    }

    pub fn stream_id(&self) -> &str {
        &self.stream_id
    }

    pub fn presentation(&self) -> &Presentation {
        &self.presentation
    }

    pub fn autoplay(&self) -> bool {
        true
    }

    pub fn plays_inline(&self) -> bool {
        true
    }

    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::SeqCst)
    }

    pub fn set_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::SeqCst);
    }
}

/// Where rendered media elements live (a UI region, a test double, ...).
pub trait MediaContainer: Send + Sync {
    /// Append an element.
    fn append(&self, element: Arc<MediaElement>);

    /// Remove all elements of the given kind, returning how many were removed.
    fn remove_kind(&self, kind: MediaKind) -> usize;

    /// Remove everything.
    fn clear(&self);

    /// Current elements, in insertion order.
    fn elements(&self) -> Vec<Arc<MediaElement>>;
}

/// In-memory [`MediaContainer`].
#[derive(Debug, Default)]
pub struct ElementContainer {
    elements: Mutex<Vec<Arc<MediaElement>>>,
}

impl ElementContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.elements.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.lock().is_empty()
    }

    pub fn count_kind(&self, kind: MediaKind) -> usize {
        self.elements.lock().iter().filter(|e| e.kind() == kind).count()
    }
}

impl MediaContainer for ElementContainer {
    fn append(&self, element: Arc<MediaElement>) {
        self.elements.lock().push(element);
    }

    fn remove_kind(&self, kind: MediaKind) -> usize {
        let mut elements = self.elements.lock();
        let before = elements.len();
        elements.retain(|e| e.kind() != kind);
        before - elements.len()
    }

    fn clear(&self) {
        self.elements.lock().clear();
    }

    fn elements(&self) -> Vec<Arc<MediaElement>> {
        self.elements.lock().clone()
    }
}
