// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

// Media Planning
//
// Turns caller options into an immutable MediaRequest and enforces the
// secure-context precondition before any hardware is touched.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};
use url::{Host, Url};

use super::{Result, RtcError};

// ============================================================================
// OPTIONS
// ============================================================================

/// Options recognised by `publish`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishOptions {
    /// Capture the microphone.
    pub audio: bool,
    /// Capture the camera.
    pub camera: bool,
    /// Capture the screen.
    pub screen: bool,
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self {
            audio: true,
            camera: true,
            screen: false,
        }
    }
}

/// Options recognised by `play`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayOptions {
    pub video_only: bool,
    pub audio_only: bool,
}

// ============================================================================
// MEDIA REQUEST
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaDirection {
    Send,
    Receive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaRequest {
    pub want_audio: bool,
    pub want_camera: bool,
    pub want_screen: bool,
    pub direction: MediaDirection,
    pub audio_only: bool,
    pub video_only: bool,
}

impl MediaRequest {
    /// Whether any send-side video source (camera or screen) was requested.
    pub fn wants_video_send(&self) -> bool {
        self.want_camera || self.want_screen
    }

    /// Whether a user-media stream (camera and/or microphone) is needed.
    pub fn wants_user_media(&self) -> bool {
        self.direction == MediaDirection::Send && (self.want_camera || self.want_audio)
    }

    pub fn user_media_constraints(&self) -> UserMediaConstraints {
        UserMediaConstraints {
            audio: self.want_audio,
            video: self.want_camera.then(VideoConstraints::default),
        }
    }
}

pub fn plan_publish(options: &PublishOptions) -> Result<MediaRequest> {
    if !options.audio && !options.camera && !options.screen {
        return Err(RtcError::InvalidRequest(
            "The camera, screen and audio can't be false at the same time".into(),
        ));
    }

    Ok(MediaRequest {
        want_audio: options.audio,
        want_camera: options.camera,
        want_screen: options.screen,
        direction: MediaDirection::Send,
        audio_only: false,
        video_only: false,
    })
}

pub fn plan_play(options: &PlayOptions) -> Result<MediaRequest> {
    if options.video_only && options.audio_only {
        return Err(RtcError::InvalidRequest(
            "The video_only and audio_only options can't be true at the same time".into(),
        ));
    }

    Ok(MediaRequest {
        want_audio: !options.video_only,
        want_camera: false,
        want_screen: false,
        direction: MediaDirection::Receive,
        audio_only: options.audio_only,
        video_only: options.video_only,
    })
}

// ============================================================================
// CAPTURE CONSTRAINTS
// ============================================================================

/// Video constraints for camera capture, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoConstraints {
    pub ideal_width: u32,
    pub max_width: u32,
}

impl Default for VideoConstraints {
    fn default() -> Self {
        Self {
            ideal_width: 320,
            max_width: 720,
        }
    }
}

/// getUserMedia-style constraints. `video: None` means no video is captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMediaConstraints {
    pub audio: bool,
    pub video: Option<VideoConstraints>,
}

// ============================================================================
// SECURE CONTEXT
// ============================================================================

/// Fails when capture is unavailable because the page is served over plain
/// HTTP from a non-loopback host. With no page origin there is nothing to
/// check.
pub fn ensure_secure_context(capture_available: bool, page_origin: Option<&Url>) -> Result<()> {
    let Some(origin) = page_origin else {
        return Ok(());
    };

    if !capture_available && origin.scheme() == "http" && !is_loopback(origin) {
        return Err(RtcError::InsecureContext(format!(
            "Please use HTTPS or localhost to publish, page origin is {}",
            origin.origin().ascii_serialization()
        )));
    }

    Ok(())
}

fn is_loopback(origin: &Url) -> bool {
    match origin.host() {
        Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(Host::Ipv4(ip)) => IpAddr::V4(ip).is_loopback(),
        Some(Host::Ipv6(ip)) => IpAddr::V6(ip).is_loopback(),
        None => false,
    }
}
