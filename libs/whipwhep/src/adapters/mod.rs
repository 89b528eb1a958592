// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Native implementations of the collaborator traits: webrtc-rs for the peer
//! connection, hyper for signaling and sample-fed tracks for capture,
//! optionally fed from H.264 or Ogg/Opus files.

mod devices;
mod file_source;
mod http_transport;
mod peer_connection;

pub use devices::{NoDevices, SampleTrack, SampleTrackDevices};
pub use file_source::{feed_file, feed_h264_file, feed_ogg_opus_file};
pub use http_transport::HyperTransport;
pub use peer_connection::{RemoteTrack, WebRtcPeerConnection};

/// Installs ring as the process-wide rustls provider unless one is already
/// set. webrtc-rs (DTLS) and hyper-rustls both need it.
pub(crate) fn ensure_crypto_provider() {
    if rustls::crypto::CryptoProvider::get_default().is_none() {
        // Another thread may win the race; either provider is ring.
        let _ = rustls::crypto::ring::default_provider().install_default();
    }
}
