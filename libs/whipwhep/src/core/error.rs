// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RtcError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Capture API unavailable because the page origin is plain HTTP on a
    /// non-loopback host.
    #[error("Insecure context: {0}")]
    InsecureContext(String),

    #[error("Negotiation HTTP error{}: {message}", .status.map(|s| format!(" ({})", s)).unwrap_or_default())]
    NegotiationHttp {
        /// HTTP status when the server answered, `None` for transport failures,
        /// timeouts and error payloads delivered with a success status.
        status: Option<u16>,
        message: String,
    },

    #[error("Malformed SDP: {0}")]
    MalformedSdp(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Media capture failed: {0}")]
    MediaCapture(String),

    #[error("Peer connection error: {0}")]
    PeerConnection(String),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RtcError {
    pub(crate) fn http(status: Option<u16>, message: impl Into<String>) -> Self {
        RtcError::NegotiationHttp {
            status,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RtcError>;
