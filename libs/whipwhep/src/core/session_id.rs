// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Session identifier derived from the negotiated SDP pair.

use serde::{Deserialize, Serialize};
use url::Url;

use super::{Result, RtcError};

const ICE_UFRAG_ATTRIBUTE: &str = "a=ice-ufrag:";

/// Path of the server's NACK simulator, appended to the endpoint origin.
pub const DIAGNOSTIC_PATH: &str = "/rtc/v1/nack/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegotiationResult {
    /// `<offer ufrag>:<answer ufrag>`.
    pub session_id: String,
    pub diagnostic_endpoint: String,
}

/// Derives the session id and diagnostic endpoint. Pure: the same inputs
/// always produce the same result.
pub fn derive(url: &str, offer_sdp: &str, answer_sdp: &str) -> Result<NegotiationResult> {
    let endpoint = Url::parse(url).map_err(|e| RtcError::InvalidUrl(format!("{}: {}", url, e)))?;

    let offer_ufrag = ice_ufrag(offer_sdp, "offer")?;
    let answer_ufrag = ice_ufrag(answer_sdp, "answer")?;

    Ok(NegotiationResult {
        session_id: format!("{}:{}", offer_ufrag, answer_ufrag),
        diagnostic_endpoint: diagnostic_endpoint(&endpoint)?,
    })
}

/// First `a=ice-ufrag:` value, up to the end of its line.
fn ice_ufrag<'a>(sdp: &'a str, which: &str) -> Result<&'a str> {
    let start = sdp
        .find(ICE_UFRAG_ATTRIBUTE)
        .map(|i| i + ICE_UFRAG_ATTRIBUTE.len())
        .ok_or_else(|| RtcError::MalformedSdp(format!("{} has no {}", which, ICE_UFRAG_ATTRIBUTE)))?;

    let rest = &sdp[start..];
    let value = rest.split(['\r', '\n']).next().unwrap_or_default().trim();
    if value.is_empty() {
        return Err(RtcError::MalformedSdp(format!(
            "{} has an empty {} value",
            which, ICE_UFRAG_ATTRIBUTE
        )));
    }
    Ok(value)
}

fn diagnostic_endpoint(endpoint: &Url) -> Result<String> {
    let host = endpoint
        .host_str()
        .ok_or_else(|| RtcError::InvalidUrl(format!("{} has no host", endpoint)))?;

    let authority = match endpoint.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_owned(),
    };

    Ok(format!("{}://{}{}", endpoint.scheme(), authority, DIAGNOSTIC_PATH))
}
