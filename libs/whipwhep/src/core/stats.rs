// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Human-readable codec summary from a stats snapshot. Display only.

use serde::{Deserialize, Serialize};

use super::traits::MediaKind;

/// One entry of a peer-connection stats snapshot. Only the fields used for
/// codec summaries are modelled; unknown fields are ignored on deserialize.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RtcStatsEntry {
    #[serde(rename = "type")]
    pub stats_type: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub clock_rate: Option<u32>,
    #[serde(default)]
    pub channels: Option<u16>,
    #[serde(default)]
    pub payload_type: Option<u8>,
}

/// `"opus, 48000HZ, channels: 2, pt: 111"` for every codec entry of `kind`,
/// joined with `", "`. Zero or missing fields are left out; channels only
/// appear for audio.
pub fn format_codec_stats<'a, I>(entries: I, kind: MediaKind) -> String
where
    I: IntoIterator<Item = &'a RtcStatsEntry>,
{
    entries
        .into_iter()
        .filter(|entry| entry.stats_type == "codec")
        .filter_map(|entry| {
            let mime_type = entry.mime_type.as_deref()?;
            mime_type
                .to_lowercase()
                .starts_with(kind.as_str())
                .then(|| describe(entry, mime_type, kind))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe(entry: &RtcStatsEntry, mime_type: &str, kind: MediaKind) -> String {
    let mut summary = match mime_type.split('/').nth(1) {
        Some(name) if !name.is_empty() => name.to_owned(),
        _ => mime_type.to_owned(),
    };

    if let Some(clock_rate) = entry.clock_rate.filter(|&r| r != 0) {
        summary.push_str(&format!(", {}HZ", clock_rate));
    }
    if kind == MediaKind::Audio {
        if let Some(channels) = entry.channels.filter(|&c| c != 0) {
            summary.push_str(&format!(", channels: {}", channels));
        }
    }
    if let Some(pt) = entry.payload_type.filter(|&pt| pt != 0) {
        summary.push_str(&format!(", pt: {}", pt));
    }

    summary
}
