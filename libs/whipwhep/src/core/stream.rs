// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Local stream sink and the single-subscriber track observer.

use std::sync::Arc;

use parking_lot::Mutex;

use super::traits::TrackRef;

/// Ordered set of tracks shared with the caller for rendering.
///
/// Cloning yields another handle to the same sink.
#[derive(Debug, Clone, Default)]
pub struct MediaStream {
    tracks: Arc<Mutex<Vec<TrackRef>>>,
}

impl MediaStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_track(&self, track: TrackRef) {
        self.tracks.lock().push(track);
    }

    /// Snapshot of the tracks in arrival order.
    pub fn tracks(&self) -> Vec<TrackRef> {
        self.tracks.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.tracks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.lock().is_empty()
    }
}

/// Delivered to the track handler for every local or remote track.
#[derive(Debug, Clone)]
pub struct TrackEvent {
    pub track: TrackRef,
    /// The session's stream sink, so handlers can render into it.
    pub stream: MediaStream,
}

pub type TrackHandler = Arc<dyn Fn(TrackEvent) + Send + Sync>;

/// At most one registered handler, invoked synchronously on track arrival.
///
/// A fresh observer carries a handler that appends each track to the
/// stream. Replacing it hands that responsibility to the caller.
#[derive(Clone)]
pub struct TrackObserver {
    handler: Arc<Mutex<Option<TrackHandler>>>,
    stream: MediaStream,
}

impl TrackObserver {
    pub fn new(stream: MediaStream) -> Self {
        let default_handler: TrackHandler = Arc::new(|event: TrackEvent| {
            event.stream.add_track(event.track);
        });
        Self {
            handler: Arc::new(Mutex::new(Some(default_handler))),
            stream,
        }
    }

    /// Replaces the handler; `None` silences notifications entirely.
    pub fn set_handler(&self, handler: Option<TrackHandler>) {
        *self.handler.lock() = handler;
    }

    pub fn stream(&self) -> &MediaStream {
        &self.stream
    }

    pub fn notify(&self, track: TrackRef) {
        // Clone out of the slot so a handler may re-register without deadlocking.
        let handler = self.handler.lock().clone();
        if let Some(handler) = handler {
            tracing::debug!("[TrackObserver] {} track {}", track.kind(), track.id());
            handler(TrackEvent {
                track,
                stream: self.stream.clone(),
            });
        }
    }
}
