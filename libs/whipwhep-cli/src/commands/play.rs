// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::sync::Arc;

use anyhow::{Context, Result};
use whipwhep::core::TrackHandler;
use whipwhep::{
    ClientConfig, HyperTransport, NoDevices, PlayOptions, RtcClient, TrackEvent,
    WebRtcPeerConnection,
};

/// Subscribes to a WHEP endpoint and logs every remote track.
pub async fn run(url: &str, options: PlayOptions, config: ClientConfig) -> Result<()> {
    let peer = WebRtcPeerConnection::new()
        .await
        .context("Failed to create peer connection")?;
    let transport = HyperTransport::new(config.auth_token.clone())?;
    let mut client = RtcClient::new(peer, NoDevices, transport, config);

    let on_track: TrackHandler = Arc::new(|event: TrackEvent| {
        tracing::info!("Remote {} track {}", event.track.kind(), event.track.id());
        event.stream.add_track(event.track);
    });
    client.set_on_track(Some(on_track));

    let result = client
        .play(url, options)
        .await
        .with_context(|| format!("Failed to play from {}", url))?;

    println!("Playing from {}", url);
    super::report(&result, &client).await;
    super::hold_until_interrupted(&mut client).await
}
