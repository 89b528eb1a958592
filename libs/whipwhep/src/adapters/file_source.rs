// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

// File-backed sample feeders
//
// Reads pre-encoded media from disk and writes it into a SampleTrack at
// real-time pace: Annex-B H.264 one NAL per tick, Ogg/Opus one page per tick.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use webrtc::media::io::h264_reader::H264Reader;
use webrtc::media::io::ogg_reader::OggReader;
use webrtc::media::Sample;

use super::devices::SampleTrack;
use crate::core::{MediaKind, MediaTrack, Result, RtcError, TrackRef};

/// 30fps.
const VIDEO_FRAME_INTERVAL: Duration = Duration::from_millis(33);
/// Opus pages written by common muxers hold 20ms.
const AUDIO_PAGE_INTERVAL: Duration = Duration::from_millis(20);
const OPUS_SAMPLE_RATE: u64 = 48000;
const H264_READ_CAPACITY: usize = 1_048_576;

/// Feeds `path` into a [`SampleTrack`], choosing the reader from the track
/// kind (H.264 for video, Ogg/Opus for audio). Returns the number of samples
/// written.
pub async fn feed_file(track: TrackRef, path: &Path) -> Result<usize> {
    let sample_track = track.as_any().downcast_ref::<SampleTrack>().ok_or_else(|| {
        RtcError::MediaCapture(format!("track {} cannot be fed from a file", track.id()))
    })?;
    match sample_track.kind() {
        MediaKind::Video => feed_h264_file(sample_track, path).await,
        MediaKind::Audio => feed_ogg_opus_file(sample_track, path).await,
    }
}

/// Writes every NAL unit of an Annex-B H.264 file, one per frame interval.
pub async fn feed_h264_file(track: &SampleTrack, path: &Path) -> Result<usize> {
    let mut reader = H264Reader::new(open(path)?, H264_READ_CAPACITY);
    let mut ticker = tokio::time::interval(VIDEO_FRAME_INTERVAL);
    let mut written = 0usize;

    // The reader reports end of file as an error.
    while let Ok(nal) = reader.next_nal() {
        if nal.data.is_empty() {
            continue;
        }
        let nal_type = nal.data[0] & 0x1F;
        if written < 3 || nal_type == 5 {
            let nal_name = match nal_type {
                1 => "P-frame",
                5 => "IDR",
                7 => "SPS",
                8 => "PPS",
                _ => "Other",
            };
            tracing::debug!(
                "[FileSource] Video NAL #{}: {} ({} bytes)",
                written,
                nal_name,
                nal.data.len()
            );
        }

        ticker.tick().await;
        track
            .write_sample(&Sample {
                data: nal.data.freeze(),
                duration: VIDEO_FRAME_INTERVAL,
                ..Default::default()
            })
            .await?;
        written += 1;
    }

    if written == 0 {
        return Err(RtcError::MediaCapture(format!(
            "no H.264 NAL units in {}",
            path.display()
        )));
    }
    tracing::info!("[FileSource] Sent {} video samples from {}", written, path.display());
    Ok(written)
}

/// Writes every page of an Ogg/Opus file, timed by its granule positions.
pub async fn feed_ogg_opus_file(track: &SampleTrack, path: &Path) -> Result<usize> {
    let (mut reader, header) = OggReader::new(open(path)?, true).map_err(|e| {
        RtcError::MediaCapture(format!("{} is not an Ogg/Opus file: {}", path.display(), e))
    })?;
    tracing::debug!(
        "[FileSource] Ogg/Opus {} ({} channels, {}Hz)",
        path.display(),
        header.channels,
        header.sample_rate
    );

    let mut ticker = tokio::time::interval(AUDIO_PAGE_INTERVAL);
    let mut last_granule = 0u64;
    let mut written = 0usize;

    while let Ok((page, page_header)) = reader.parse_next_page() {
        let samples = page_header.granule_position.saturating_sub(last_granule);
        last_granule = page_header.granule_position;

        ticker.tick().await;
        track
            .write_sample(&Sample {
                data: page.freeze(),
                duration: Duration::from_millis(samples * 1000 / OPUS_SAMPLE_RATE),
                ..Default::default()
            })
            .await?;
        written += 1;
    }

    tracing::info!("[FileSource] Sent {} audio pages from {}", written, path.display());
    Ok(written)
}

fn open(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| RtcError::MediaCapture(format!("Failed to open {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Arc;

    /// SPS, PPS and one IDR slice with 4-byte start codes.
    const ANNEX_B: &[u8] = &[
        0x00, 0x00, 0x00, 0x01, 0x67, 0x42, 0x00, 0x1f, 0xe9, //
        0x00, 0x00, 0x00, 0x01, 0x68, 0xce, 0x3c, 0x80, //
        0x00, 0x00, 0x00, 0x01, 0x65, 0x88, 0x84, 0x00, 0x33,
    ];

    fn write_temp(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        file
    }

    #[tokio::test]
    async fn test_h264_file_is_written_nal_by_nal() {
        let file = write_temp(ANNEX_B);
        let track = SampleTrack::h264("camera");

        let written = feed_h264_file(&track, file.path()).await.unwrap();

        assert!(written >= 2, "wrote {} samples", written);
    }

    #[tokio::test]
    async fn test_file_without_start_codes_is_rejected() {
        let file = write_temp(b"");
        let track = SampleTrack::h264("camera");

        assert!(matches!(
            feed_h264_file(&track, file.path()).await,
            Err(RtcError::MediaCapture(_))
        ));
    }

    #[tokio::test]
    async fn test_stopped_track_ends_the_feed() {
        let file = write_temp(ANNEX_B);
        let track = SampleTrack::h264("camera");
        track.stop();

        assert!(matches!(
            feed_h264_file(&track, file.path()).await,
            Err(RtcError::MediaCapture(_))
        ));
    }

    #[tokio::test]
    async fn test_non_ogg_audio_is_rejected() {
        let file = write_temp(b"RIFF\x24\x00\x00\x00WAVEfmt ");
        let track = SampleTrack::opus("microphone");

        assert!(matches!(
            feed_ogg_opus_file(&track, file.path()).await,
            Err(RtcError::MediaCapture(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_file_is_a_capture_error() {
        let track: TrackRef = Arc::new(SampleTrack::opus("microphone"));

        assert!(matches!(
            feed_file(track, Path::new("/nonexistent/whipwhep.ogg")).await,
            Err(RtcError::MediaCapture(_))
        ));
    }

    #[tokio::test]
    async fn test_video_track_dispatches_to_h264() {
        let file = write_temp(ANNEX_B);
        let track: TrackRef = Arc::new(SampleTrack::h264("screen"));

        assert!(feed_file(track, file.path()).await.unwrap() >= 2);
    }
}
