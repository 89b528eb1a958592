// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

// In-memory collaborators for driving RtcClient without a network or devices.
//
// Every fake writes to one shared call log so tests can assert ordering
// across the peer connection, the devices and the transport.

#![allow(dead_code)]

use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use whipwhep::core::{
    MediaDevices, MediaKind, MediaTrack, PeerConnection, RemoteTrackHandler, RtcError,
    SessionDescription, SignalingTransport, TrackRef, TransceiverDirection, UserMediaConstraints,
};
use whipwhep::Result;

pub const OFFER_UFRAG: &str = "abc123";
pub const ANSWER_UFRAG: &str = "xyz789";

pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn answer_sdp() -> String {
    format!(
        "v=0\r\no=- 1 2 IN IP4 127.0.0.1\r\ns=-\r\nt=0 0\r\na=ice-ufrag:{}\r\na=ice-pwd:answerpwd\r\n",
        ANSWER_UFRAG
    )
}

// ============================================================================
// TRACKS
// ============================================================================

#[derive(Debug)]
pub struct FakeTrack {
    id: String,
    kind: MediaKind,
    stops: AtomicUsize,
}

impl FakeTrack {
    pub fn new(id: &str, kind: MediaKind) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_owned(),
            kind,
            stops: AtomicUsize::new(0),
        })
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl MediaTrack for FakeTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> MediaKind {
        self.kind
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// DEVICES
// ============================================================================

#[derive(Clone)]
pub struct FakeDevices {
    log: CallLog,
    available: bool,
    fail_user_media: bool,
    captured: Arc<Mutex<Vec<Arc<FakeTrack>>>>,
}

impl FakeDevices {
    pub fn new(log: &CallLog) -> Self {
        Self {
            log: Arc::clone(log),
            available: true,
            fail_user_media: false,
            captured: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// No capture API, as on a plain-HTTP page.
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Camera/microphone capture fails (permission denied).
    pub fn failing_user_media(mut self) -> Self {
        self.fail_user_media = true;
        self
    }

    /// Every track handed out so far, in capture order.
    pub fn captured(&self) -> Vec<Arc<FakeTrack>> {
        self.captured.lock().clone()
    }

    fn hand_out(&self, track: Arc<FakeTrack>) -> TrackRef {
        self.captured.lock().push(Arc::clone(&track));
        track
    }
}

impl MediaDevices for FakeDevices {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn get_user_media(&self, constraints: &UserMediaConstraints) -> Result<Vec<TrackRef>> {
        self.log.lock().push(format!(
            "get_user_media(audio={}, video={})",
            constraints.audio,
            constraints.video.is_some()
        ));
        if self.fail_user_media {
            return Err(RtcError::MediaCapture("Permission denied".into()));
        }

        let mut tracks = Vec::new();
        if constraints.audio {
            tracks.push(self.hand_out(FakeTrack::new("microphone", MediaKind::Audio)));
        }
        if constraints.video.is_some() {
            tracks.push(self.hand_out(FakeTrack::new("camera", MediaKind::Video)));
        }
        Ok(tracks)
    }

    async fn get_display_media(&self) -> Result<Vec<TrackRef>> {
        self.log.lock().push("get_display_media".into());
        Ok(vec![self.hand_out(FakeTrack::new("screen", MediaKind::Video))])
    }
}

// ============================================================================
// PEER CONNECTION
// ============================================================================

struct FakePeerState {
    log: CallLog,
    local: Mutex<Option<SessionDescription>>,
    remote: Mutex<Option<SessionDescription>>,
    on_track: Mutex<Option<RemoteTrackHandler>>,
    closes: AtomicUsize,
}

/// Cloning shares state, so a test keeps a handle after moving the peer into
/// the client.
#[derive(Clone)]
pub struct FakePeer {
    state: Arc<FakePeerState>,
}

impl FakePeer {
    pub fn new(log: &CallLog) -> Self {
        Self {
            state: Arc::new(FakePeerState {
                log: Arc::clone(log),
                local: Mutex::new(None),
                remote: Mutex::new(None),
                on_track: Mutex::new(None),
                closes: AtomicUsize::new(0),
            }),
        }
    }

    pub fn close_count(&self) -> usize {
        self.state.closes.load(Ordering::SeqCst)
    }

    pub fn remote_description(&self) -> Option<SessionDescription> {
        self.state.remote.lock().clone()
    }

    /// Simulates a track arriving from the server.
    pub fn deliver_remote_track(&self, track: TrackRef) {
        let handler = self.state.on_track.lock().clone();
        if let Some(handler) = handler {
            handler(track);
        }
    }

    fn record(&self, entry: String) {
        self.state.log.lock().push(entry);
    }
}

impl PeerConnection for FakePeer {
    async fn add_transceiver(&self, kind: MediaKind, direction: TransceiverDirection) -> Result<()> {
        self.record(format!("add_transceiver({}, {:?})", kind, direction));
        Ok(())
    }

    async fn add_track(&self, track: &TrackRef) -> Result<()> {
        self.record(format!("add_track({})", track.id()));
        Ok(())
    }

    async fn create_offer(&self) -> Result<SessionDescription> {
        self.record("create_offer".into());
        Ok(SessionDescription::offer(format!(
            "v=0\r\no=- 1 2 IN IP4 127.0.0.1\r\ns=-\r\nt=0 0\r\na=ice-ufrag:{}\r\na=ice-pwd:offerpwd\r\n",
            OFFER_UFRAG
        )))
    }

    async fn set_local_description(&self, description: SessionDescription) -> Result<()> {
        self.record("set_local_description".into());
        *self.state.local.lock() = Some(description);
        Ok(())
    }

    async fn local_description(&self) -> Option<SessionDescription> {
        self.state.local.lock().clone()
    }

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()> {
        self.record("set_remote_description".into());
        *self.state.remote.lock() = Some(description);
        Ok(())
    }

    fn set_on_track(&self, handler: RemoteTrackHandler) {
        *self.state.on_track.lock() = Some(handler);
    }

    fn close(&self) {
        self.record("close".into());
        self.state.closes.fetch_add(1, Ordering::SeqCst);
    }
}

// ============================================================================
// TRANSPORT
// ============================================================================

#[derive(Clone, Debug)]
pub enum StubResponse {
    /// 200/201 with this body.
    Body(String),
    /// Any other HTTP status.
    Status(u16, String),
    /// Never answers.
    Hang,
}

#[derive(Clone)]
pub struct StubTransport {
    log: CallLog,
    response: StubResponse,
    requests: Arc<Mutex<Vec<(String, String, String)>>>,
}

impl StubTransport {
    pub fn new(log: &CallLog, response: StubResponse) -> Self {
        Self {
            log: Arc::clone(log),
            response,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn answering(log: &CallLog) -> Self {
        Self::new(log, StubResponse::Body(answer_sdp()))
    }

    /// `(url, body, content_type)` of every POST.
    pub fn requests(&self) -> Vec<(String, String, String)> {
        self.requests.lock().clone()
    }
}

impl SignalingTransport for StubTransport {
    async fn post(&self, url: &str, body: &str, content_type: &str) -> Result<String> {
        self.log.lock().push("post".into());
        self.requests
            .lock()
            .push((url.to_owned(), body.to_owned(), content_type.to_owned()));

        match &self.response {
            StubResponse::Body(body) => Ok(body.clone()),
            StubResponse::Status(status, message) => Err(RtcError::NegotiationHttp {
                status: Some(*status),
                message: message.clone(),
            }),
            StubResponse::Hang => std::future::pending().await,
        }
    }
}
