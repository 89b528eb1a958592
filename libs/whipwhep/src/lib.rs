// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! WHIP/WHEP session negotiation.
//!
//! [`RtcClient`] publishes local media to a WHIP endpoint or plays a WHEP
//! stream: it plans the media request, captures and tracks hardware, runs the
//! single SDP offer/answer POST and derives the session id from the
//! negotiated ICE ufrags.
//!
//! The core is written against the traits in [`core::traits`]. The
//! [`adapters`] module provides the production implementations: a hyper
//! HTTP transport, a webrtc-rs peer connection and sample-fed local tracks.

pub mod adapters;
pub mod core;

pub use adapters::{
    feed_file, HyperTransport, NoDevices, RemoteTrack, SampleTrack, SampleTrackDevices,
    WebRtcPeerConnection,
};
pub use crate::core::{
    derive, format_codec_stats, ClientConfig, MediaKind, MediaStream, NegotiationResult,
    PlayOptions, PublishOptions, Result, RtcClient, RtcError, RtcStatsEntry, TrackEvent,
};
