// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! whipwhep CLI
//!
//! Publishes to a WHIP endpoint (optionally streaming H.264/Ogg files) or
//! plays from a WHEP endpoint, prints the negotiated session and holds it
//! until Ctrl+C.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use whipwhep::{PlayOptions, PublishOptions};

mod commands;

#[derive(Parser)]
#[command(name = "whipwhep")]
#[command(author, version, about = "WHIP publisher / WHEP player", long_about = None)]
struct Cli {
    /// Client config file (defaults to ./whipwhep.yaml when present)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Offer/answer exchange timeout in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Page origin for the secure-context check (e.g. http://192.168.1.10:8080)
    #[arg(long, global = true)]
    origin: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish local media to a WHIP endpoint
    Publish {
        /// WHIP URL, e.g. http://localhost:1985/rtc/v1/whip/?app=live&stream=livestream
        url: String,

        /// Do not capture the microphone
        #[arg(long)]
        no_audio: bool,

        /// Do not capture the camera
        #[arg(long)]
        no_camera: bool,

        /// Capture the screen
        #[arg(long)]
        screen: bool,

        /// Annex-B H.264 file to send on the video track(s)
        #[arg(long, value_name = "FILE")]
        video_file: Option<PathBuf>,

        /// Ogg/Opus file to send on the audio track
        #[arg(long, value_name = "FILE")]
        audio_file: Option<PathBuf>,
    },

    /// Play a stream from a WHEP endpoint
    Play {
        /// WHEP URL, e.g. http://localhost:1985/rtc/v1/whep/?app=live&stream=livestream
        url: String,

        /// Receive audio only
        #[arg(long)]
        audio_only: bool,

        /// Receive video only
        #[arg(long)]
        video_only: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = commands::load_config(cli.config.as_deref(), cli.timeout_ms, cli.origin)?;

    match cli.command {
        Commands::Publish {
            url,
            no_audio,
            no_camera,
            screen,
            video_file,
            audio_file,
        } => {
            let options = PublishOptions {
                audio: !no_audio,
                camera: !no_camera,
                screen,
            };
            let sources = commands::publish::MediaFiles {
                video: video_file,
                audio: audio_file,
            };
            commands::publish::run(&url, options, sources, config).await?;
        }
        Commands::Play {
            url,
            audio_only,
            video_only,
        } => {
            let options = PlayOptions {
                video_only,
                audio_only,
            };
            commands::play::run(&url, options, config).await?;
        }
    }

    Ok(())
}
