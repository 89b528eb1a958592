// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

// WHIP/WHEP Client
//
// Publisher and player roles over one peer connection. Owns the session
// (peer connection, stream sink, track observer), the negotiation engine and
// the resource lifecycle, and sequences them for `publish` / `play`.

use std::sync::Arc;

use url::Url;

use super::config::ClientConfig;
use super::lifecycle::ResourceLifecycle;
use super::media::{ensure_secure_context, plan_play, plan_publish, MediaRequest, PlayOptions, PublishOptions};
use super::negotiation::{validate_endpoint, NegotiationEngine, NegotiationState, SessionRole};
use super::session_id::{derive, NegotiationResult};
use super::stream::{MediaStream, TrackHandler, TrackObserver};
use super::traits::{MediaDevices, PeerConnection, RemoteTrackHandler, SignalingTransport};
use super::{Result, RtcError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    /// Ready for exactly one `publish` or `play`.
    Idle,
    /// A `publish` or `play` has started; the session is spent.
    Active(SessionRole),
    Closed,
}

/// WHIP publisher / WHEP player.
///
/// Usage:
/// 1. Create with `RtcClient::new(peer, devices, transport, config)`
/// 2. Optionally register a track handler with `set_on_track`
/// 3. `publish(url, options)` or `play(url, options)`
/// 4. Render from `stream()`
/// 5. `close()` (also run on drop) or `shutdown().await`
///
/// A failed `publish` releases any hardware it captured before returning.
/// The client cannot be reused afterwards; close it and build a new one.
pub struct RtcClient<P: PeerConnection, D: MediaDevices, T: SignalingTransport> {
    config: ClientConfig,
    peer: Option<P>,
    devices: D,
    transport: T,
    observer: TrackObserver,
    lifecycle: ResourceLifecycle,
    engine: NegotiationEngine,
    state: ClientState,
}

impl<P: PeerConnection, D: MediaDevices, T: SignalingTransport> RtcClient<P, D, T> {
    pub fn new(peer: P, devices: D, transport: T, config: ClientConfig) -> Self {
        let observer = TrackObserver::new(MediaStream::new());

        // Remote tracks (player role) go through the same single observer.
        let remote_observer = observer.clone();
        let on_remote_track: RemoteTrackHandler = Arc::new(move |track| remote_observer.notify(track));
        peer.set_on_track(on_remote_track);

        let engine = NegotiationEngine::new(config.exchange_timeout());

        Self {
            config,
            peer: Some(peer),
            devices,
            transport,
            observer,
            lifecycle: ResourceLifecycle::new(),
            engine,
            state: ClientState::Idle,
        }
    }

    /// Publishes local media to a WHIP endpoint.
    pub async fn publish(&mut self, url: &str, options: PublishOptions) -> Result<NegotiationResult> {
        self.ensure_idle()?;
        let endpoint = validate_endpoint(url, SessionRole::Publisher)?;
        let request = plan_publish(&options)?;

        tracing::info!("[RtcClient] Publishing to {} ({:?})", endpoint, options);
        self.state = ClientState::Active(SessionRole::Publisher);

        let result = self.run_publish(&endpoint, &request).await;
        if let Err(e) = &result {
            tracing::warn!("[RtcClient] Publish failed, releasing captured media: {}", e);
            self.lifecycle.release();
        }
        result
    }

    async fn run_publish(&mut self, endpoint: &Url, request: &MediaRequest) -> Result<NegotiationResult> {
        let page_origin = self.config.page_origin_url()?;
        ensure_secure_context(self.devices.is_available(), page_origin.as_ref())?;

        let peer = self.peer.as_ref().ok_or_else(closed)?;
        self.lifecycle
            .acquire(request, &self.devices, peer, &self.observer)
            .await?;

        self.negotiate(endpoint, request).await
    }

    /// Subscribes to a WHEP endpoint. Remote tracks arrive through the track
    /// handler.
    pub async fn play(&mut self, url: &str, options: PlayOptions) -> Result<NegotiationResult> {
        self.ensure_idle()?;
        let endpoint = validate_endpoint(url, SessionRole::Player)?;
        let request = plan_play(&options)?;

        tracing::info!("[RtcClient] Playing from {} ({:?})", endpoint, options);
        self.state = ClientState::Active(SessionRole::Player);

        self.negotiate(&endpoint, &request).await
    }

    async fn negotiate(&mut self, endpoint: &Url, request: &MediaRequest) -> Result<NegotiationResult> {
        let peer = self.peer.as_ref().ok_or_else(closed)?;

        let offer = self.engine.build_offer(peer, request).await?;
        let answer = self.engine.exchange(&self.transport, endpoint, &offer).await?;
        self.engine.apply_answer(peer, &answer).await?;

        let result = derive(endpoint.as_str(), &offer, &answer)?;
        tracing::info!(
            "[RtcClient] Session {} established (diagnostics: {})",
            result.session_id,
            result.diagnostic_endpoint
        );
        Ok(result)
    }

    /// Closes the peer connection and stops every captured track. Safe to
    /// call from any state, any number of times.
    pub fn close(&mut self) {
        if let Some(peer) = self.peer.take() {
            tracing::info!("[RtcClient] Closing peer connection");
            peer.close();
        }
        self.lifecycle.release();
        self.state = ClientState::Closed;
    }

    /// Like `close`, but waits for the peer connection to finish closing.
    pub async fn shutdown(&mut self) -> Result<()> {
        let result = match self.peer.take() {
            Some(peer) => {
                tracing::info!("[RtcClient] Shutting down peer connection");
                peer.shutdown().await
            }
            None => Ok(()),
        };
        self.lifecycle.release();
        self.state = ClientState::Closed;
        result
    }

    /// Replaces the single track handler. `None` silences notifications,
    /// including the default of appending tracks to `stream()`.
    pub fn set_on_track(&self, handler: Option<TrackHandler>) {
        self.observer.set_handler(handler);
    }

    /// Handle to the session's stream sink for rendering.
    pub fn stream(&self) -> MediaStream {
        self.observer.stream().clone()
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    pub fn negotiation_state(&self) -> NegotiationState {
        self.engine.state()
    }

    pub fn lifecycle(&self) -> &ResourceLifecycle {
        &self.lifecycle
    }

    /// The underlying peer connection, until `close`.
    pub fn peer_connection(&self) -> Option<&P> {
        self.peer.as_ref()
    }

    fn ensure_idle(&self) -> Result<()> {
        match self.state {
            ClientState::Idle => Ok(()),
            ClientState::Active(role) => Err(RtcError::InvalidState(format!(
                "a {:?} session was already started on this client",
                role
            ))),
            ClientState::Closed => Err(closed()),
        }
    }
}

impl<P: PeerConnection, D: MediaDevices, T: SignalingTransport> Drop for RtcClient<P, D, T> {
    fn drop(&mut self) {
        if self.state != ClientState::Closed {
            self.close();
        }
    }
}

fn closed() -> RtcError {
    RtcError::InvalidState("client is closed".into())
}
