// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Negotiation core: planning, lifecycle, offer/answer engine and the
//! collaborator traits it is written against.

pub mod client;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod media;
pub mod negotiation;
pub mod session_id;
pub mod stats;
pub mod stream;
pub mod traits;

pub use client::{ClientState, RtcClient};
pub use config::ClientConfig;
pub use error::{Result, RtcError};
pub use lifecycle::{AcquiredStream, ResourceLifecycle};
pub use media::{
    ensure_secure_context, plan_play, plan_publish, MediaDirection, MediaRequest, PlayOptions,
    PublishOptions, UserMediaConstraints, VideoConstraints,
};
pub use negotiation::{
    check_error_payload, validate_endpoint, NegotiationEngine, NegotiationState, SessionRole,
    SDP_CONTENT_TYPE,
};
pub use session_id::{derive, NegotiationResult, DIAGNOSTIC_PATH};
pub use stats::{format_codec_stats, RtcStatsEntry};
pub use stream::{MediaStream, TrackEvent, TrackHandler, TrackObserver};
pub use traits::{
    MediaDevices, MediaKind, MediaTrack, PeerConnection, RemoteTrackHandler, SdpType,
    SessionDescription, SignalingTransport, TrackRef, TransceiverDirection,
};
