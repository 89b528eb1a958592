// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::task::JoinHandle;
use whipwhep::{
    feed_file, ClientConfig, HyperTransport, MediaKind, MediaStream, PublishOptions, RtcClient,
    SampleTrackDevices, WebRtcPeerConnection,
};

/// Encoded files streamed into the published tracks.
#[derive(Debug, Default)]
pub struct MediaFiles {
    pub video: Option<PathBuf>,
    pub audio: Option<PathBuf>,
}

/// Publishes sample-fed tracks to a WHIP endpoint.
pub async fn run(
    url: &str,
    options: PublishOptions,
    files: MediaFiles,
    config: ClientConfig,
) -> Result<()> {
    let peer = WebRtcPeerConnection::new()
        .await
        .context("Failed to create peer connection")?;
    let transport = HyperTransport::new(config.auth_token.clone())?;
    let mut client = RtcClient::new(peer, SampleTrackDevices::new(), transport, config);

    let result = client
        .publish(url, options)
        .await
        .with_context(|| format!("Failed to publish to {}", url))?;

    println!("Publishing {} track(s) to {}", client.stream().len(), url);
    super::report(&result, &client).await;

    let feeders = spawn_feeders(&client.stream(), &files);
    if feeders.is_empty() {
        println!("No media files given; tracks stay silent");
    }

    let outcome = super::hold_until_interrupted(&mut client).await;
    for feeder in feeders {
        feeder.abort();
    }
    outcome
}

/// One task per track with a matching file. A task ends at end of file or
/// once its track is stopped.
fn spawn_feeders(stream: &MediaStream, files: &MediaFiles) -> Vec<JoinHandle<()>> {
    stream
        .tracks()
        .into_iter()
        .filter_map(|track| {
            let path = match track.kind() {
                MediaKind::Video => files.video.clone(),
                MediaKind::Audio => files.audio.clone(),
            }?;
            Some(tokio::spawn(async move {
                let id = track.id().to_owned();
                match feed_file(track, &path).await {
                    Ok(samples) => tracing::info!("{}: sent {} samples", id, samples),
                    Err(e) => tracing::warn!("{}: feeding {} stopped: {}", id, path.display(), e),
                }
            }))
        })
        .collect()
}
