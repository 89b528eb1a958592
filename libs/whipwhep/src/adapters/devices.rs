// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

// Sample-fed capture devices
//
// There is no getUserMedia outside a browser: "capturing" here hands out
// webrtc-rs TrackLocalStaticSample tracks that the application feeds with
// encoded frames (H.264 video, Opus audio). Stopping a track closes it for
// writing.

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use webrtc::api::media_engine::{MIME_TYPE_H264, MIME_TYPE_OPUS};
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

use crate::core::{
    MediaDevices, MediaKind, MediaTrack, Result, RtcError, TrackRef, UserMediaConstraints,
};

const STREAM_ID: &str = "whipwhep";

// ============================================================================
// SAMPLE TRACK
// ============================================================================

/// Local track backed by a webrtc-rs sample track.
pub struct SampleTrack {
    id: String,
    kind: MediaKind,
    inner: Arc<TrackLocalStaticSample>,
    stopped: AtomicBool,
}

impl SampleTrack {
    /// H.264 video track (90kHz).
    pub fn h264(label: &str) -> Self {
        let capability = RTCRtpCodecCapability {
            mime_type: MIME_TYPE_H264.to_owned(),
            clock_rate: 90000,
            channels: 0,
            sdp_fmtp_line: "level-asymmetry-allowed=1;packetization-mode=1;profile-level-id=42e01f"
                .to_owned(),
            ..Default::default()
        };
        Self::new(label, MediaKind::Video, capability)
    }

    /// Opus audio track (48kHz stereo).
    pub fn opus(label: &str) -> Self {
        let capability = RTCRtpCodecCapability {
            mime_type: MIME_TYPE_OPUS.to_owned(),
            clock_rate: 48000,
            channels: 2,
            sdp_fmtp_line: "minptime=10;useinbandfec=1".to_owned(),
            ..Default::default()
        };
        Self::new(label, MediaKind::Audio, capability)
    }

    fn new(label: &str, kind: MediaKind, capability: RTCRtpCodecCapability) -> Self {
        let id = format!("{}-{}", label, uuid::Uuid::new_v4());
        let inner = Arc::new(TrackLocalStaticSample::new(
            capability,
            id.clone(),
            STREAM_ID.to_owned(),
        ));
        Self {
            id,
            kind,
            inner,
            stopped: AtomicBool::new(false),
        }
    }

    /// The webrtc-rs track to attach to a peer connection.
    pub fn local_track(&self) -> Arc<TrackLocalStaticSample> {
        Arc::clone(&self.inner)
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Writes one encoded sample. Fails once the track has been stopped.
    pub async fn write_sample(&self, sample: &webrtc::media::Sample) -> Result<()> {
        if self.is_stopped() {
            return Err(RtcError::MediaCapture(format!("track {} is stopped", self.id)));
        }
        self.inner
            .write_sample(sample)
            .await
            .map_err(|e| RtcError::MediaCapture(format!("Failed to write sample to {}: {}", self.id, e)))
    }
}

impl std::fmt::Debug for SampleTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleTrack")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

impl MediaTrack for SampleTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> MediaKind {
        self.kind
    }

    fn stop(&self) {
        if !self.stopped.swap(true, Ordering::AcqRel) {
            tracing::debug!("[SampleTrack] Stopped {} track {}", self.kind, self.id);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// DEVICES
// ============================================================================

/// Media devices producing [`SampleTrack`]s.
#[derive(Debug, Clone, Default)]
pub struct SampleTrackDevices;

impl SampleTrackDevices {
    pub fn new() -> Self {
        Self
    }
}

impl MediaDevices for SampleTrackDevices {
    fn is_available(&self) -> bool {
        true
    }

    async fn get_user_media(&self, constraints: &UserMediaConstraints) -> Result<Vec<TrackRef>> {
        let mut tracks: Vec<TrackRef> = Vec::new();
        if constraints.audio {
            tracks.push(Arc::new(SampleTrack::opus("microphone")));
        }
        if let Some(video) = constraints.video {
            tracks.push(Arc::new(SampleTrack::h264("camera")));
            tracing::debug!(
                "[SampleTrackDevices] Camera track expects width ~{} (max {})",
                video.ideal_width,
                video.max_width
            );
        }
        if tracks.is_empty() {
            return Err(RtcError::MediaCapture(
                "getUserMedia requires audio or video".into(),
            ));
        }
        Ok(tracks)
    }

    async fn get_display_media(&self) -> Result<Vec<TrackRef>> {
        let screen: TrackRef = Arc::new(SampleTrack::h264("screen"));
        Ok(vec![screen])
    }
}

/// No capture API at all (receive-only clients).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDevices;

impl MediaDevices for NoDevices {
    fn is_available(&self) -> bool {
        false
    }

    async fn get_user_media(&self, _constraints: &UserMediaConstraints) -> Result<Vec<TrackRef>> {
        Err(RtcError::MediaCapture("no capture devices available".into()))
    }

    async fn get_display_media(&self) -> Result<Vec<TrackRef>> {
        Err(RtcError::MediaCapture("no display capture available".into()))
    }
}
