// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

// Negotiation Engine
//
// Drives the single offer/answer round-trip of a WHIP or WHEP session:
//   Idle -> OfferBuilt -> OfferSent -> AnswerReceived -> Negotiated
// Any error moves the engine to Failed. Hardware is never released here.

use std::time::Duration;

use url::Url;

use super::media::{MediaDirection, MediaRequest};
use super::traits::{
    MediaKind, PeerConnection, SessionDescription, SignalingTransport, TransceiverDirection,
};
use super::{Result, RtcError};

/// Content type of the offer body.
pub const SDP_CONTENT_TYPE: &str = "application/sdp";

// ============================================================================
// ENDPOINT VALIDATION
// ============================================================================

/// Which side of the session this client plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRole {
    /// WHIP ingest.
    Publisher,
    /// WHEP (or legacy whip-play) egress.
    Player,
}

impl SessionRole {
    fn accepted_segments(&self) -> &'static [&'static str] {
        match self {
            SessionRole::Publisher => &["whip"],
            SessionRole::Player => &["whip-play", "whep"],
        }
    }
}

/// Parses `url` and checks that its path references an endpoint for `role`,
/// e.g. `http://localhost:1985/rtc/v1/whip/?app=live&stream=livestream`.
pub fn validate_endpoint(url: &str, role: SessionRole) -> Result<Url> {
    let parsed =
        Url::parse(url).map_err(|e| RtcError::InvalidUrl(format!("{}: {}", url, e)))?;

    let accepted = role.accepted_segments();
    let matches = parsed
        .path_segments()
        .map(|mut segments| segments.any(|segment| accepted.contains(&segment)))
        .unwrap_or(false);

    if !matches {
        return Err(RtcError::InvalidUrl(format!(
            "{} is not a {} endpoint (expected a /{}/ path segment)",
            url,
            match role {
                SessionRole::Publisher => "WHIP",
                SessionRole::Player => "WHEP",
            },
            accepted.join("/ or /")
        )));
    }

    Ok(parsed)
}

/// Rejects bodies that carry an explicit error `code` instead of SDP text,
/// e.g. `{"code": 400, "message": "..."}`. A zero, empty or null code is the
/// server's success marker and passes.
pub fn check_error_payload(body: &str) -> Result<()> {
    let Ok(serde_json::Value::Object(payload)) = serde_json::from_str::<serde_json::Value>(body.trim())
    else {
        return Ok(());
    };

    if let Some(code) = payload.get("code").filter(|code| is_error_code(code)) {
        let detail = payload
            .get("message")
            .or_else(|| payload.get("msg"))
            .and_then(|m| m.as_str())
            .unwrap_or("no SDP answer");
        return Err(RtcError::http(
            None,
            format!("server rejected offer with code {}: {}", code, detail),
        ));
    }

    Ok(())
}

fn is_error_code(code: &serde_json::Value) -> bool {
    use serde_json::Value;
    match code {
        Value::Null => false,
        Value::Bool(set) => *set,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

// ============================================================================
// STATE MACHINE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    Idle,
    OfferBuilt,
    OfferSent,
    AnswerReceived,
    Negotiated,
    Failed,
}

#[derive(Debug)]
pub struct NegotiationEngine {
    state: NegotiationState,
    exchange_timeout: Option<Duration>,
}

impl NegotiationEngine {
    /// `exchange_timeout` bounds the HTTP round-trip; `None` waits forever.
    pub fn new(exchange_timeout: Option<Duration>) -> Self {
        Self {
            state: NegotiationState::Idle,
            exchange_timeout,
        }
    }

    pub fn state(&self) -> NegotiationState {
        self.state
    }

    /// Adds the transceivers `request` calls for, creates the offer and sets
    /// it as the local description. Returns the offer SDP.
    pub async fn build_offer<P: PeerConnection>(
        &mut self,
        peer: &P,
        request: &MediaRequest,
    ) -> Result<String> {
        self.expect(NegotiationState::Idle, "build an offer")?;
        let result = Self::build_offer_inner(peer, request).await;
        self.settle(result, NegotiationState::OfferBuilt)
    }

    async fn build_offer_inner<P: PeerConnection>(
        peer: &P,
        request: &MediaRequest,
    ) -> Result<String> {
        for (kind, direction) in Self::transceivers_for(request) {
            tracing::debug!("[Negotiation] Adding {:?} {} transceiver", direction, kind);
            peer.add_transceiver(kind, direction).await?;
        }

        let offer = peer.create_offer().await?;
        peer.set_local_description(offer.clone()).await?;

        // Prefer the gathered description when the peer connection has one.
        let local = peer.local_description().await.unwrap_or(offer);

        tracing::info!("[Negotiation] ========== SDP OFFER ==========");
        for (i, line) in local.sdp.lines().enumerate() {
            tracing::debug!("[Negotiation] OFFER [{}]: {}", i, line);
        }

        Ok(local.sdp)
    }

    fn transceivers_for(request: &MediaRequest) -> Vec<(MediaKind, TransceiverDirection)> {
        let mut transceivers = Vec::with_capacity(2);
        match request.direction {
            MediaDirection::Send => {
                if request.want_audio {
                    transceivers.push((MediaKind::Audio, TransceiverDirection::Sendonly));
                }
                if request.wants_video_send() {
                    transceivers.push((MediaKind::Video, TransceiverDirection::Sendonly));
                }
            }
            MediaDirection::Receive => {
                if !request.video_only {
                    transceivers.push((MediaKind::Audio, TransceiverDirection::Recvonly));
                }
                if !request.audio_only {
                    transceivers.push((MediaKind::Video, TransceiverDirection::Recvonly));
                }
            }
        }
        transceivers
    }

    /// POSTs the offer and returns the answer SDP.
    pub async fn exchange<T: SignalingTransport>(
        &mut self,
        transport: &T,
        endpoint: &Url,
        offer_sdp: &str,
    ) -> Result<String> {
        self.expect(NegotiationState::OfferBuilt, "send the offer")?;
        self.state = NegotiationState::OfferSent;
        tracing::debug!("[Negotiation] POST offer to {}", endpoint);

        let result = self.exchange_inner(transport, endpoint, offer_sdp).await;
        self.settle(result, NegotiationState::AnswerReceived)
    }

    async fn exchange_inner<T: SignalingTransport>(
        &self,
        transport: &T,
        endpoint: &Url,
        offer_sdp: &str,
    ) -> Result<String> {
        let post = transport.post(endpoint.as_str(), offer_sdp, SDP_CONTENT_TYPE);
        let answer = match self.exchange_timeout {
            Some(limit) => tokio::time::timeout(limit, post).await.map_err(|_| {
                RtcError::http(
                    None,
                    format!("offer exchange timed out after {}ms", limit.as_millis()),
                )
            })??,
            None => post.await?,
        };

        check_error_payload(&answer)?;

        tracing::info!("[Negotiation] ========== SDP ANSWER ==========");
        for (i, line) in answer.lines().enumerate() {
            tracing::debug!("[Negotiation] ANSWER [{}]: {}", i, line);
        }

        Ok(answer)
    }

    pub async fn apply_answer<P: PeerConnection>(&mut self, peer: &P, answer_sdp: &str) -> Result<()> {
        self.expect(NegotiationState::AnswerReceived, "apply the answer")?;
        let result = peer
            .set_remote_description(SessionDescription::answer(answer_sdp))
            .await;
        self.settle(result, NegotiationState::Negotiated)?;
        tracing::info!("[Negotiation] Negotiated");
        Ok(())
    }

    fn expect(&self, expected: NegotiationState, action: &str) -> Result<()> {
        if self.state != expected {
            return Err(RtcError::InvalidState(format!(
                "cannot {} in state {:?} (expected {:?})",
                action, self.state, expected
            )));
        }
        Ok(())
    }

    fn settle<T>(&mut self, result: Result<T>, next: NegotiationState) -> Result<T> {
        match result {
            Ok(value) => {
                self.state = next;
                Ok(value)
            }
            Err(e) => {
                tracing::warn!("[Negotiation] Failed in state {:?}: {}", self.state, e);
                self.state = NegotiationState::Failed;
                Err(e)
            }
        }
    }
}
