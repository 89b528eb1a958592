// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Collaborator contracts.
//!
//! The negotiation core only talks to the outside world through these traits:
//! a peer connection, a media-capture provider and an HTTP signaling transport.
//! Concrete implementations live in [`crate::adapters`]; tests supply fakes.

#![allow(async_fn_in_trait)]

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::media::UserMediaConstraints;
use super::Result;

// ============================================================================
// MEDIA PRIMITIVES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Audio => "audio",
            MediaKind::Video => "video",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransceiverDirection {
    Sendonly,
    Recvonly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdpType {
    Offer,
    Answer,
}

/// A local or remote session description handed to the peer connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDescription {
    pub sdp_type: SdpType,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            sdp_type: SdpType::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            sdp_type: SdpType::Answer,
            sdp: sdp.into(),
        }
    }
}

/// A stoppable media track (local capture or remote receive).
pub trait MediaTrack: Send + Sync + fmt::Debug {
    fn id(&self) -> &str;

    fn kind(&self) -> MediaKind;

    /// Stops the track and releases the underlying device. Implementations
    /// must tolerate repeated calls; the lifecycle only issues one.
    fn stop(&self);

    /// Lets adapters recover their concrete track type.
    fn as_any(&self) -> &dyn Any;
}

pub type TrackRef = Arc<dyn MediaTrack>;

/// Invoked by the peer connection whenever a remote track arrives.
pub type RemoteTrackHandler = Arc<dyn Fn(TrackRef) + Send + Sync>;

// ============================================================================
// COLLABORATORS
// ============================================================================

/// The peer-connection surface the negotiation engine drives.
pub trait PeerConnection {
    async fn add_transceiver(&self, kind: MediaKind, direction: TransceiverDirection)
    -> Result<()>;

    async fn add_track(&self, track: &TrackRef) -> Result<()>;

    async fn create_offer(&self) -> Result<SessionDescription>;

    async fn set_local_description(&self, description: SessionDescription) -> Result<()>;

    /// Current local description, which may differ from the created offer
    /// once candidates have been gathered.
    async fn local_description(&self) -> Option<SessionDescription>;

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()>;

    /// Registers the single remote-track handler, replacing any previous one.
    fn set_on_track(&self, handler: RemoteTrackHandler);

    /// Tears the connection down. Must be callable from any state, including
    /// from `Drop`, so it cannot wait for the teardown to finish.
    fn close(&self);

    /// Tears the connection down and waits until it is closed.
    async fn shutdown(&self) -> Result<()> {
        self.close();
        Ok(())
    }
}

/// Camera / microphone / screen capture.
pub trait MediaDevices {
    /// Whether a capture API exists at all in this environment.
    fn is_available(&self) -> bool;

    async fn get_user_media(&self, constraints: &UserMediaConstraints) -> Result<Vec<TrackRef>>;

    /// Video-only display capture.
    async fn get_display_media(&self) -> Result<Vec<TrackRef>>;
}

/// One HTTP POST per negotiation.
pub trait SignalingTransport {
    /// POSTs `body` to `url` and returns the response text on 200/201.
    /// Any other status fails with [`super::RtcError::NegotiationHttp`].
    async fn post(&self, url: &str, body: &str, content_type: &str) -> Result<String>;
}
