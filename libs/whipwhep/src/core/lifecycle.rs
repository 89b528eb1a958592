// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

// Resource Lifecycle
//
// Owns every captured stream from acquisition until release. Each track is
// stopped exactly once, however far negotiation got.

use super::media::MediaRequest;
use super::stream::TrackObserver;
use super::traits::{MediaDevices, PeerConnection, TrackRef};
use super::Result;

#[derive(Debug, Clone)]
pub enum AcquiredStream {
    /// Video-only screen capture.
    Display(Vec<TrackRef>),
    /// Camera and/or microphone capture.
    User(Vec<TrackRef>),
}

impl AcquiredStream {
    pub fn tracks(&self) -> &[TrackRef] {
        match self {
            AcquiredStream::Display(tracks) | AcquiredStream::User(tracks) => tracks,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            AcquiredStream::Display(_) => "display",
            AcquiredStream::User(_) => "user",
        }
    }
}

#[derive(Debug, Default)]
pub struct ResourceLifecycle {
    streams: Vec<AcquiredStream>,
}

impl ResourceLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Captures what `request` asks for, attaches every track to `peer` and
    /// reports it to `observer`. Display tracks come before user-media tracks.
    ///
    /// Streams are registered as soon as capture returns, so an error part
    /// way through still leaves everything captured so far releasable.
    pub async fn acquire<D, P>(
        &mut self,
        request: &MediaRequest,
        devices: &D,
        peer: &P,
        observer: &TrackObserver,
    ) -> Result<Vec<TrackRef>>
    where
        D: MediaDevices,
        P: PeerConnection,
    {
        let mut added = Vec::new();

        if request.want_screen {
            let tracks = devices.get_display_media().await?;
            tracing::info!("[ResourceLifecycle] Display capture: {} track(s)", tracks.len());
            self.streams.push(AcquiredStream::Display(tracks.clone()));
            Self::attach(tracks, peer, observer, &mut added).await?;
        }

        if request.wants_user_media() {
            let constraints = request.user_media_constraints();
            let tracks = devices.get_user_media(&constraints).await?;
            tracing::info!(
                "[ResourceLifecycle] User media capture (audio={}, video={:?}): {} track(s)",
                constraints.audio,
                constraints.video,
                tracks.len()
            );
            self.streams.push(AcquiredStream::User(tracks.clone()));
            Self::attach(tracks, peer, observer, &mut added).await?;
        }

        Ok(added)
    }

    async fn attach<P: PeerConnection>(
        tracks: Vec<TrackRef>,
        peer: &P,
        observer: &TrackObserver,
        added: &mut Vec<TrackRef>,
    ) -> Result<()> {
        for track in tracks {
            peer.add_track(&track).await?;
            observer.notify(track.clone());
            added.push(track);
        }
        Ok(())
    }

    /// Stops every registered track once and forgets them. A second call is
    /// a no-op.
    pub fn release(&mut self) {
        if self.streams.is_empty() {
            return;
        }

        for stream in self.streams.drain(..) {
            tracing::debug!(
                "[ResourceLifecycle] Stopping {} stream ({} track(s))",
                stream.label(),
                stream.tracks().len()
            );
            for track in stream.tracks() {
                track.stop();
            }
        }
        tracing::info!("[ResourceLifecycle] Released all captured tracks");
    }

    pub fn streams(&self) -> &[AcquiredStream] {
        &self.streams
    }

    pub fn track_count(&self) -> usize {
        self.streams.iter().map(|s| s.tracks().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::media::{plan_publish, PublishOptions, UserMediaConstraints};
    use crate::core::stream::MediaStream;
    use crate::core::traits::{
        MediaKind, MediaTrack, RemoteTrackHandler, SessionDescription, TransceiverDirection,
    };
    use crate::core::RtcError;
    use std::any::Any;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug)]
    struct CountingTrack {
        kind: MediaKind,
        stops: AtomicUsize,
    }

    impl MediaTrack for CountingTrack {
        fn id(&self) -> &str {
            self.kind.as_str()
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

    fn track(kind: MediaKind) -> Arc<CountingTrack> {
        Arc::new(CountingTrack {
            kind,
            stops: AtomicUsize::new(0),
        })
    }

    struct Devices {
        screen: Arc<CountingTrack>,
        audio: Arc<CountingTrack>,
        fail_user_media: bool,
    }

    impl MediaDevices for Devices {
        fn is_available(&self) -> bool {
            true
        }
        async fn get_user_media(&self, _constraints: &UserMediaConstraints) -> Result<Vec<TrackRef>> {
            if self.fail_user_media {
                return Err(RtcError::MediaCapture("denied".into()));
            }
            let audio: TrackRef = self.audio.clone();
            Ok(vec![audio])
        }
        async fn get_display_media(&self) -> Result<Vec<TrackRef>> {
            let screen: TrackRef = self.screen.clone();
            Ok(vec![screen])
        }
    }

    struct Peer;

    impl PeerConnection for Peer {
        async fn add_transceiver(&self, _: MediaKind, _: TransceiverDirection) -> Result<()> {
            Ok(())
        }
        async fn add_track(&self, _track: &TrackRef) -> Result<()> {
            Ok(())
        }
        async fn create_offer(&self) -> Result<SessionDescription> {
            Ok(SessionDescription::offer(""))
        }
        async fn set_local_description(&self, _: SessionDescription) -> Result<()> {
            Ok(())
        }
        async fn local_description(&self) -> Option<SessionDescription> {
            None
        }
        async fn set_remote_description(&self, _: SessionDescription) -> Result<()> {
            Ok(())
        }
        fn set_on_track(&self, _handler: RemoteTrackHandler) {}
        fn close(&self) {}
    }

    fn screen_and_audio() -> MediaRequest {
        plan_publish(&PublishOptions {
            audio: true,
            camera: false,
            screen: true,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_acquire_orders_display_before_user_media() {
        let devices = Devices {
            screen: track(MediaKind::Video),
            audio: track(MediaKind::Audio),
            fail_user_media: false,
        };
        let observer = TrackObserver::new(MediaStream::new());
        let mut lifecycle = ResourceLifecycle::new();

        let added = lifecycle
            .acquire(&screen_and_audio(), &devices, &Peer, &observer)
            .await
            .unwrap();

        let kinds: Vec<MediaKind> = added.iter().map(|t| t.kind()).collect();
        assert_eq!(kinds, vec![MediaKind::Video, MediaKind::Audio]);
        assert!(matches!(lifecycle.streams()[0], AcquiredStream::Display(_)));
        assert!(matches!(lifecycle.streams()[1], AcquiredStream::User(_)));
        assert_eq!(observer.stream().len(), 2);
    }

    #[tokio::test]
    async fn test_release_twice_stops_each_track_once() {
        let devices = Devices {
            screen: track(MediaKind::Video),
            audio: track(MediaKind::Audio),
            fail_user_media: false,
        };
        let observer = TrackObserver::new(MediaStream::new());
        let mut lifecycle = ResourceLifecycle::new();
        lifecycle
            .acquire(&screen_and_audio(), &devices, &Peer, &observer)
            .await
            .unwrap();

        lifecycle.release();
        lifecycle.release();

        assert_eq!(devices.screen.stops.load(Ordering::SeqCst), 1);
        assert_eq!(devices.audio.stops.load(Ordering::SeqCst), 1);
        assert!(lifecycle.is_empty());
        assert_eq!(lifecycle.track_count(), 0);
    }

    #[tokio::test]
    async fn test_partial_acquisition_stays_releasable() {
        let devices = Devices {
            screen: track(MediaKind::Video),
            audio: track(MediaKind::Audio),
            fail_user_media: true,
        };
        let observer = TrackObserver::new(MediaStream::new());
        let mut lifecycle = ResourceLifecycle::new();

        let result = lifecycle
            .acquire(&screen_and_audio(), &devices, &Peer, &observer)
            .await;
        assert!(matches!(result, Err(RtcError::MediaCapture(_))));
        assert_eq!(lifecycle.track_count(), 1);

        lifecycle.release();
        assert_eq!(devices.screen.stops.load(Ordering::SeqCst), 1);
        assert_eq!(devices.audio.stops.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_release_without_acquisition_is_a_no_op() {
        let mut lifecycle = ResourceLifecycle::new();
        lifecycle.release();
        assert!(lifecycle.is_empty());
    }
}
