// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docscan: command-line document scanner
//
// Entry point. Initialises logging, builds the session configuration, and
// runs one scan session over the software bridge, replaying the given image
// files as camera photos. In adjust mode the detected corners of each photo
// are accepted as-is; in hands-free mode the live trigger takes the photo.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use docscan_bridge::{PlatformBridge, SoftwareBridge};
use docscan_core::error::Result;
use docscan_core::human_errors::humanize_error;
use docscan_core::{ColorFilter, ResponseFormat, ScanConfig, ViewLayout};
use docscan_session::{
    ScanOutput, ScanSession, SessionChannels, SessionDriver, SessionEvent, SessionOutcome,
    SessionUpdate, UserAction,
};
use tracing::{debug, info, warn};

/// How long hands-free mode waits for the live trigger before taking the
/// photo manually.
const TRIGGER_GRACE: Duration = Duration::from_secs(5);

#[derive(Parser, Debug)]
#[command(name = "docscan")]
#[command(about = "Detect, straighten and save documents from photos")]
struct Args {
    /// Photos to scan, one page per photo
    #[arg(required = true)]
    photos: Vec<PathBuf>,

    /// Session configuration (JSON); command-line flags override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Accept the first detected document without adjustment (single page)
    #[arg(long)]
    hands_free: bool,

    /// Directory the cropped pages are written to
    #[arg(short, long, default_value = "scans")]
    output_dir: PathBuf,

    /// Result format printed on stdout
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// JPEG quality of the saved pages (1-100)
    #[arg(short, long)]
    quality: Option<u8>,

    /// Colour filter applied to every page
    #[arg(long, value_enum, default_value = "none")]
    filter: FilterChoice,

    /// Live preview frames streamed per photo in hands-free mode
    #[arg(long, default_value = "300")]
    preview_frames: usize,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Base64,
    Files,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum FilterChoice {
    None,
    Grayscale,
    BlackAndWhite,
    HighContrast,
}

impl FilterChoice {
    fn color_filter(self) -> Option<ColorFilter> {
        match self {
            Self::None => None,
            Self::Grayscale => Some(ColorFilter::GRAYSCALE),
            Self::BlackAndWhite => Some(ColorFilter::BLACK_AND_WHITE),
            Self::HighContrast => Some(ColorFilter::HIGH_CONTRAST),
        }
    }
}

impl Args {
    /// Configuration file (or defaults) with command-line overrides applied.
    fn scan_config(&self) -> Result<ScanConfig> {
        let mut config = match &self.config {
            Some(path) => ScanConfig::load(path)?,
            None => ScanConfig::default(),
        };
        if self.hands_free {
            config.let_user_adjust_crop = false;
        }
        if let Some(format) = self.format {
            config.response_format = match format {
                OutputFormat::Base64 => ResponseFormat::Base64,
                OutputFormat::Files => ResponseFormat::ImageFilePath,
            };
        }
        if let Some(quality) = self.quality {
            config.cropped_image_quality = quality;
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    info!("docscan starting");

    match scan(args).await {
        Ok(SessionOutcome::Completed(outputs)) => {
            for output in outputs {
                match output {
                    ScanOutput::File(path) => println!("{}", path.display()),
                    ScanOutput::Base64(data) => println!("{data}"),
                }
            }
            ExitCode::SUCCESS
        }
        Ok(SessionOutcome::Cancelled) => {
            eprintln!("scan cancelled");
            ExitCode::FAILURE
        }
        Ok(SessionOutcome::Failed(message)) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
        Err(err) => {
            let human = humanize_error(&err);
            eprintln!("error: {err}\n{}\n{}", human.message, human.suggestion);
            ExitCode::FAILURE
        }
    }
}

async fn scan(args: Args) -> Result<SessionOutcome> {
    let config = args.scan_config()?;
    let hands_free = config.hands_free();
    docscan_bridge::init();

    let pages = if hands_free { 1 } else { args.photos.len().min(config.max_num_documents) };
    let bridge = Arc::new(
        SoftwareBridge::with_photos(args.photos.clone(), args.output_dir.join(".captures"))
            .with_preview_frames(if hands_free { args.preview_frames } else { 0 }),
    );
    info!(
        platform = bridge.platform_name(),
        pages,
        hands_free,
        "scanning"
    );

    let session = ScanSession::new(config, ViewLayout::default(), bridge.clone(), &args.output_dir)?;
    let (driver, channels) = SessionDriver::new(session, bridge);
    let run = tokio::spawn(driver.run());

    drive_user(channels, pages, hands_free, args.filter.color_filter()).await;

    run.await
        .map_err(|err| docscan_core::DocScanError::Bridge(format!("session task failed: {err}")))
}

/// Play the user's part: take each photo, keep the detected corners, and
/// finish after the last page.
async fn drive_user(
    mut channels: SessionChannels,
    pages: usize,
    hands_free: bool,
    filter: Option<ColorFilter>,
) {
    let send = |action: UserAction| {
        if channels.events.send(SessionEvent::User(action)).is_err() {
            debug!("session already ended");
        }
    };

    if !hands_free {
        send(UserAction::TakePhoto);
    }

    let mut accepted = 0;
    let mut manual_fallback_sent = false;
    loop {
        let update = match tokio::time::timeout(TRIGGER_GRACE, channels.updates.recv()).await {
            Ok(Some(update)) => update,
            Ok(None) => break,
            Err(_) => {
                if hands_free && !manual_fallback_sent {
                    warn!("live trigger did not fire, taking the photo manually");
                    send(UserAction::TakePhoto);
                    manual_fallback_sent = true;
                }
                continue;
            }
        };

        match update {
            SessionUpdate::Overlay(_) => {}
            SessionUpdate::AwaitingAdjustment { quads, .. } => {
                accepted += 1;
                info!(page = accepted, documents = quads.len(), "accepting detected corners");
                send(UserAction::Adjust { quads, filter });
                if accepted >= pages {
                    send(UserAction::Done);
                } else {
                    send(UserAction::AcceptAndNew);
                    send(UserAction::TakePhoto);
                }
            }
            SessionUpdate::DocumentCount { count, remaining } => {
                info!(count, remaining, "documents collected");
            }
            SessionUpdate::Finished(_) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let args = Args::try_parse_from([
            "docscan",
            "--hands-free",
            "--format",
            "files",
            "--quality",
            "80",
            "page.jpg",
        ])
        .expect("parse");
        let config = args.scan_config().expect("config");
        assert!(config.hands_free());
        assert_eq!(config.response_format, ResponseFormat::ImageFilePath);
        assert_eq!(config.cropped_image_quality, 80);
    }

    #[test]
    fn out_of_range_quality_is_rejected() {
        let args = Args::try_parse_from(["docscan", "--quality", "0", "page.jpg"]).expect("parse");
        assert!(args.scan_config().is_err());
    }

    #[test]
    fn filter_names_map_to_presets() {
        let args = Args::try_parse_from(["docscan", "--filter", "black-and-white", "page.jpg"])
            .expect("parse");
        assert_eq!(args.filter.color_filter(), Some(ColorFilter::BLACK_AND_WHITE));
    }

    #[test]
    fn at_least_one_photo_is_required() {
        assert!(Args::try_parse_from(["docscan"]).is_err());
    }
}
