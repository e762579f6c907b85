//! Media transport abstraction for the avatar stream.
//!
//! The avatar engine publishes video and audio over a peer connection that
//! is relayed through TURN servers. This module defines the seam between the
//! session and whatever peer-connection stack the host uses:
//!
//! - [`TransportFactory`] creates a [`PeerTransport`] from a [`TransportConfig`]
//!   and hands back a channel of [`TransportEvent`]s.
//! - [`MediaContainer`] is where rendered [`MediaElement`]s are attached.
//! - [`MediaNegotiator`] drives one negotiation attempt and owns the result.

mod element;
mod negotiator;

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;

use super::credentials::RelayToken;
use super::errors::TransportError;

pub use element::{ElementContainer, MediaContainer, MediaElement, ObjectFit, Presentation};
pub use negotiator::{LinkLostCallback, MediaNegotiator};

/// Kind of media carried by a track or element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Video,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Audio => f.write_str("audio"),
            Self::Video => f.write_str("video"),
        }
    }
}

/// Transceiver direction. The avatar only ever receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransceiverDirection {
    SendRecv,
    SendOnly,
    RecvOnly,
}

/// ICE connection state as reported by the peer connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IceConnectionState {
    New,
    Checking,
    Connected,
    Completed,
    Disconnected,
    Failed,
    Closed,
}

impl IceConnectionState {
    /// `connected` or `completed`: media can flow.
    pub fn is_established(self) -> bool {
        matches!(self, Self::Connected | Self::Completed)
    }

    /// `disconnected`, `failed` or `closed`: the link is gone or going.
    pub fn is_lost(self) -> bool {
        matches!(self, Self::Disconnected | Self::Failed | Self::Closed)
    }
}

impl fmt::Display for IceConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::New => "new",
            Self::Checking => "checking",
            Self::Connected => "connected",
            Self::Completed => "completed",
            Self::Disconnected => "disconnected",
            Self::Failed => "failed",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// A remote track delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundTrack {
    pub kind: MediaKind,
    pub track_id: String,
    /// Identifier of the remote media stream the track belongs to.
    pub stream_id: String,
}

/// Events emitted by a [`PeerTransport`].
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    IceStateChanged(IceConnectionState),
    /// Overall peer connection failure, reported separately from ICE.
    ConnectionFailed,
    Track(InboundTrack),
}

/// A single ICE server entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IceServer {
    pub urls: Vec<String>,
    pub username: String,
    pub credential: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IceTransportPolicy {
    All,
    Relay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundlePolicy {
    Balanced,
    MaxCompat,
    MaxBundle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RtcpMuxPolicy {
    Negotiate,
    Require,
}

/// Peer connection configuration for one negotiation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub ice_servers: Vec<IceServer>,
    pub ice_transport_policy: IceTransportPolicy,
    pub bundle_policy: BundlePolicy,
    pub rtcp_mux_policy: RtcpMuxPolicy,
}

impl TransportConfig {
    /// Build the transport configuration from relay credentials.
    ///
    /// Only the first relay URL is used; the relay service returns its
    /// preferred server first.
    pub fn from_relay(relay: &RelayToken) -> Result<Self, TransportError> {
        let url = relay.urls.first().ok_or(TransportError::NoIceServers)?;

        Ok(Self {
            ice_servers: vec![IceServer {
                urls: vec![url.clone()],
                username: relay.username.clone(),
                credential: relay.password.clone(),
            }],
            ice_transport_policy: IceTransportPolicy::All,
            bundle_policy: BundlePolicy::Balanced,
            rtcp_mux_policy: RtcpMuxPolicy::Require,
        })
    }
}

/// A peer connection used to receive the avatar stream.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    /// Add a transceiver for the given media kind.
    fn add_transceiver(
        &self,
        kind: MediaKind,
        direction: TransceiverDirection,
    ) -> Result<(), TransportError>;

    /// Close the connection. Must be idempotent.
    async fn close(&self);
}

/// Creates peer transports.
pub trait TransportFactory: Send + Sync {
    /// Create a transport and the receiver for its events. The sender side is
    /// dropped when the transport shuts down.
    fn create(
        &self,
        config: TransportConfig,
    ) -> Result<(Arc<dyn PeerTransport>, mpsc::UnboundedReceiver<TransportEvent>), TransportError>;
}
