// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

// webrtc-rs Peer Connection
//
// H.264 (PT=102) and Opus (PT=111) with the default interceptors. Local
// descriptions are only reported after ICE gathering completes, so offers
// carry every host candidate (no trickle ICE).

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{MediaEngine, MIME_TYPE_H264, MIME_TYPE_OPUS};
use webrtc::api::APIBuilder;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::sdp::sdp_type::RTCSdpType;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::rtp_transceiver::rtp_codec::{RTCRtpCodecCapability, RTCRtpCodecParameters, RTPCodecType};
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use webrtc::rtp_transceiver::RTCRtpTransceiverInit;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_remote::TrackRemote;

use super::devices::SampleTrack;
use crate::core::{
    MediaKind, MediaTrack, PeerConnection, RemoteTrackHandler, Result, RtcError, RtcStatsEntry,
    SdpType, SessionDescription, TrackRef, TransceiverDirection,
};

pub struct WebRtcPeerConnection {
    inner: Arc<RTCPeerConnection>,
    on_track: Arc<Mutex<Option<RemoteTrackHandler>>>,
}

impl WebRtcPeerConnection {
    pub async fn new() -> Result<Self> {
        // DTLS starts inside set_remote_description and needs a provider.
        super::ensure_crypto_provider();

        let mut media_engine = MediaEngine::default();

        media_engine
            .register_codec(
                RTCRtpCodecParameters {
                    capability: RTCRtpCodecCapability {
                        mime_type: MIME_TYPE_H264.to_owned(),
                        clock_rate: 90000,
                        channels: 0,
                        sdp_fmtp_line:
                            "level-asymmetry-allowed=1;packetization-mode=1;profile-level-id=42e01f"
                                .to_owned(),
                        rtcp_feedback: vec![],
                    },
                    payload_type: 102,
                    ..Default::default()
                },
                RTPCodecType::Video,
            )
            .map_err(|e| RtcError::PeerConnection(format!("Failed to register H.264 codec: {}", e)))?;

        media_engine
            .register_codec(
                RTCRtpCodecParameters {
                    capability: RTCRtpCodecCapability {
                        mime_type: MIME_TYPE_OPUS.to_owned(),
                        clock_rate: 48000,
                        channels: 2,
                        sdp_fmtp_line: "minptime=10;useinbandfec=1".to_owned(),
                        rtcp_feedback: vec![],
                    },
                    payload_type: 111,
                    ..Default::default()
                },
                RTPCodecType::Audio,
            )
            .map_err(|e| RtcError::PeerConnection(format!("Failed to register Opus codec: {}", e)))?;

        tracing::debug!("[WebRtcPeerConnection] Registered H.264 (PT=102) and Opus (PT=111) codecs");

        let registry = register_default_interceptors(Registry::new(), &mut media_engine).map_err(|e| {
            RtcError::PeerConnection(format!("Failed to register interceptors: {}", e))
        })?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let inner = Arc::new(
            api.new_peer_connection(RTCConfiguration::default())
                .await
                .map_err(|e| RtcError::PeerConnection(format!("Failed to create PeerConnection: {}", e)))?,
        );

        inner.on_peer_connection_state_change(Box::new(move |state| {
            Box::pin(async move {
                tracing::info!("[WebRtcPeerConnection] Peer connection state: {:?}", state);
            })
        }));

        inner.on_ice_connection_state_change(Box::new(move |state| {
            Box::pin(async move {
                tracing::info!("[WebRtcPeerConnection] ICE connection state: {:?}", state);
            })
        }));

        let on_track: Arc<Mutex<Option<RemoteTrackHandler>>> = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&on_track);
        inner.on_track(Box::new(move |track, _receiver, _transceiver| {
            let remote = RemoteTrack::new(track);
            tracing::info!(
                "[WebRtcPeerConnection] Received {} track {}",
                remote.kind,
                remote.id
            );
            // Clone out of the lock; the handler may re-enter set_on_track.
            let handler = slot.lock().clone();
            if let Some(handler) = handler {
                handler(Arc::new(remote));
            }
            Box::pin(async {})
        }));

        Ok(Self { inner, on_track })
    }

    /// The underlying webrtc-rs connection.
    pub fn inner(&self) -> &Arc<RTCPeerConnection> {
        &self.inner
    }

    /// Codec entries of the current stats snapshot.
    pub async fn codec_stats(&self) -> Vec<RtcStatsEntry> {
        let stats = self.inner.get_stats().await;
        stats
            .reports
            .values()
            .filter_map(|report| match report {
                webrtc::stats::StatsReportType::Codec(codec) => Some(RtcStatsEntry {
                    stats_type: "codec".to_owned(),
                    mime_type: Some(codec.mime_type.clone()),
                    clock_rate: Some(codec.clock_rate),
                    channels: Some(codec.channels),
                    payload_type: Some(codec.payload_type),
                }),
                _ => None,
            })
            .collect()
    }
}

fn codec_type(kind: MediaKind) -> RTPCodecType {
    match kind {
        MediaKind::Audio => RTPCodecType::Audio,
        MediaKind::Video => RTPCodecType::Video,
    }
}

impl PeerConnection for WebRtcPeerConnection {
    async fn add_transceiver(&self, kind: MediaKind, direction: TransceiverDirection) -> Result<()> {
        let direction = match direction {
            TransceiverDirection::Sendonly => RTCRtpTransceiverDirection::Sendonly,
            TransceiverDirection::Recvonly => RTCRtpTransceiverDirection::Recvonly,
        };

        // add_track already created a sendrecv transceiver for captured media;
        // narrow it instead of adding an empty one next to it.
        if direction == RTCRtpTransceiverDirection::Sendonly {
            let mut converted = false;
            for transceiver in self.inner.get_transceivers().await {
                if transceiver.kind() == codec_type(kind)
                    && transceiver.sender().await.track().await.is_some()
                {
                    transceiver.set_direction(direction).await;
                    converted = true;
                }
            }
            if converted {
                tracing::debug!("[WebRtcPeerConnection] Set {} transceivers to sendonly", kind);
                return Ok(());
            }
        }

        self.inner
            .add_transceiver_from_kind(
                codec_type(kind),
                Some(RTCRtpTransceiverInit {
                    direction,
                    send_encodings: vec![],
                }),
            )
            .await
            .map_err(|e| {
                RtcError::PeerConnection(format!("Failed to add {} transceiver: {}", kind, e))
            })?;

        tracing::debug!("[WebRtcPeerConnection] Added {} {:?} transceiver", kind, direction);
        Ok(())
    }

    async fn add_track(&self, track: &TrackRef) -> Result<()> {
        let sample = track.as_any().downcast_ref::<SampleTrack>().ok_or_else(|| {
            RtcError::PeerConnection(format!(
                "Track {} is not backed by a webrtc-rs sample track",
                track.id()
            ))
        })?;

        self.inner
            .add_track(sample.local_track() as Arc<dyn TrackLocal + Send + Sync>)
            .await
            .map_err(|e| {
                RtcError::PeerConnection(format!("Failed to add {} track: {}", track.kind(), e))
            })?;
        Ok(())
    }

    async fn create_offer(&self) -> Result<SessionDescription> {
        let offer = self
            .inner
            .create_offer(None)
            .await
            .map_err(|e| RtcError::PeerConnection(format!("Failed to create offer: {}", e)))?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn set_local_description(&self, description: SessionDescription) -> Result<()> {
        let description = to_rtc(description)?;

        // Subscribe before setting so the completion signal cannot be missed.
        let mut done_rx = self.inner.gathering_complete_promise().await;

        self.inner
            .set_local_description(description)
            .await
            .map_err(|e| RtcError::PeerConnection(format!("Failed to set local description: {}", e)))?;

        let _ = done_rx.recv().await;
        tracing::debug!("[WebRtcPeerConnection] ICE gathering complete");
        Ok(())
    }

    async fn local_description(&self) -> Option<SessionDescription> {
        self.inner.local_description().await.map(|desc| SessionDescription {
            sdp_type: match desc.sdp_type {
                RTCSdpType::Answer => SdpType::Answer,
                _ => SdpType::Offer,
            },
            sdp: desc.sdp,
        })
    }

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()> {
        let description = to_rtc(description)?;
        self.inner
            .set_remote_description(description)
            .await
            .map_err(|e| RtcError::PeerConnection(format!("Failed to set remote description: {}", e)))
    }

    fn set_on_track(&self, handler: RemoteTrackHandler) {
        *self.on_track.lock() = Some(handler);
    }

    async fn shutdown(&self) -> Result<()> {
        self.inner
            .close()
            .await
            .map_err(|e| RtcError::PeerConnection(format!("Failed to close PeerConnection: {}", e)))
    }

    fn close(&self) {
        let pc = Arc::clone(&self.inner);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = pc.close().await {
                        tracing::warn!("[WebRtcPeerConnection] Close failed: {}", e);
                    }
                });
            }
            Err(_) => {
                tracing::warn!("[WebRtcPeerConnection] No Tokio runtime, connection left to drop");
            }
        }
    }
}

fn to_rtc(description: SessionDescription) -> Result<RTCSessionDescription> {
    let parsed = match description.sdp_type {
        SdpType::Offer => RTCSessionDescription::offer(description.sdp),
        SdpType::Answer => RTCSessionDescription::answer(description.sdp),
    };
    parsed.map_err(|e| RtcError::MalformedSdp(format!("Failed to parse SDP: {}", e)))
}

// ============================================================================
// REMOTE TRACK
// ============================================================================

/// A track received from the server.
pub struct RemoteTrack {
    id: String,
    kind: MediaKind,
    track: Arc<TrackRemote>,
    stopped: AtomicBool,
}

impl RemoteTrack {
    fn new(track: Arc<TrackRemote>) -> Self {
        let mime_type = track.codec().capability.mime_type.to_lowercase();
        let kind = if mime_type.starts_with("audio") {
            MediaKind::Audio
        } else {
            MediaKind::Video
        };
        Self {
            id: track.id(),
            kind,
            track,
            stopped: AtomicBool::new(false),
        }
    }

    /// The webrtc-rs track to read RTP from.
    pub fn remote_track(&self) -> Arc<TrackRemote> {
        Arc::clone(&self.track)
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for RemoteTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteTrack")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .finish()
    }
}

impl MediaTrack for RemoteTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> MediaKind {
        self.kind
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
