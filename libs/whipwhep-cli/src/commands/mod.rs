// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

pub mod play;
pub mod publish;

use std::path::Path;

use anyhow::{Context, Result};
use whipwhep::core::{MediaDevices, SignalingTransport};
use whipwhep::{
    format_codec_stats, ClientConfig, MediaKind, NegotiationResult, RtcClient,
    WebRtcPeerConnection,
};

/// Config file (explicit or `./whipwhep.yaml`), then command-line overrides.
pub fn load_config(
    path: Option<&Path>,
    timeout_ms: Option<u64>,
    origin: Option<String>,
) -> Result<ClientConfig> {
    let mut config = match path {
        Some(path) => ClientConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ClientConfig::load_or_default(&std::env::current_dir()?),
    };

    if timeout_ms.is_some() {
        config.timeout_ms = timeout_ms;
    }
    if origin.is_some() {
        config.page_origin = origin;
    }
    Ok(config)
}

/// Prints the session and the codecs negotiated so far.
pub async fn report<D, T>(
    result: &NegotiationResult,
    client: &RtcClient<WebRtcPeerConnection, D, T>,
) where
    D: MediaDevices,
    T: SignalingTransport,
{
    println!("Session:     {}", result.session_id);
    println!("Diagnostics: {}", result.diagnostic_endpoint);

    let Some(peer) = client.peer_connection() else {
        return;
    };
    let stats = peer.codec_stats().await;
    for kind in [MediaKind::Audio, MediaKind::Video] {
        let summary = format_codec_stats(&stats, kind);
        if summary.is_empty() {
            println!("{:<12} -", format!("{}:", kind));
        } else {
            println!("{:<12} {}", format!("{}:", kind), summary);
        }
    }
}

/// Holds the session until Ctrl+C, then tears it down.
pub async fn hold_until_interrupted<D, T>(
    client: &mut RtcClient<WebRtcPeerConnection, D, T>,
) -> Result<()>
where
    D: MediaDevices,
    T: SignalingTransport,
{
    println!("\nPress Ctrl+C to stop");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    tracing::info!("Interrupted, closing session");
    // Await the teardown so the connection is down before the runtime exits.
    if let Err(e) = client.shutdown().await {
        tracing::warn!("Peer connection close failed: {}", e);
    }
    Ok(())
}
