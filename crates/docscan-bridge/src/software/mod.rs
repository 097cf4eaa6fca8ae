// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Software bridge for desktop/CI builds where no native camera or vision
// library is present.
//
// Vision runs on `HoughVision`. The "camera" replays image files: each
// `take_photo` copies the next queued file into the capture directory (the
// session deletes captures once cropped, so the sources are never touched)
// and can stream a few downscaled preview frames of it first.

mod vision;

pub use vision::HoughVision;

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use docscan_core::error::{DocScanError, Result};
use docscan_core::{CropSize, FlashMode, Point};
use image::DynamicImage;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::traits::{CameraEvent, NativeCamera, PlatformBridge, VisionPrimitives};

/// Width preview frames are downscaled to before being streamed.
const PREVIEW_FRAME_WIDTH: u32 = 640;

/// Pause between streamed preview frames (about 30 fps).
const FRAME_INTERVAL: Duration = Duration::from_millis(33);

/// File-replaying camera plus software vision.
#[derive(Default)]
pub struct SoftwareBridge {
    vision: HoughVision,
    sources: Mutex<VecDeque<PathBuf>>,
    capture_dir: Option<PathBuf>,
    preview_frames: usize,
    events: Mutex<Option<UnboundedSender<CameraEvent>>>,
    captured: Mutex<usize>,
}

impl SoftwareBridge {
    /// Replay `sources` as successive photos, writing captures into
    /// `capture_dir`.
    pub fn with_photos(sources: Vec<PathBuf>, capture_dir: impl Into<PathBuf>) -> Self {
        Self {
            sources: Mutex::new(sources.into()),
            capture_dir: Some(capture_dir.into()),
            ..Self::default()
        }
    }

    /// Stream `count` preview frames of the upcoming photo whenever the camera
    /// starts, so live detection (and the hands-free trigger) can run.
    pub fn with_preview_frames(mut self, count: usize) -> Self {
        self.preview_frames = count;
        self
    }

    fn sender(&self) -> Result<UnboundedSender<CameraEvent>> {
        self.events
            .lock()
            .map_err(|_| DocScanError::Bridge("camera state lock poisoned".into()))?
            .clone()
            .ok_or_else(|| DocScanError::Bridge("camera not started".into()))
    }

    fn stream_preview_frames(&self, events: &UnboundedSender<CameraEvent>) -> Result<()> {
        if self.preview_frames == 0 {
            return Ok(());
        }
        let next = self
            .sources
            .lock()
            .map_err(|_| DocScanError::Bridge("camera state lock poisoned".into()))?
            .front()
            .cloned();
        let Some(path) = next else {
            return Ok(());
        };

        let frame = decode_preview(&path)?;
        let count = self.preview_frames;
        let events = events.clone();
        std::thread::spawn(move || {
            for _ in 0..count {
                let event = CameraEvent::FrameReady {
                    frame: frame.clone(),
                    rotation_degrees: 0,
                };
                if events.send(event).is_err() {
                    break;
                }
                std::thread::sleep(FRAME_INTERVAL);
            }
        });
        debug!(count, path = %path.display(), "streaming preview frames");
        Ok(())
    }

    fn capture_next(&self) -> Result<PathBuf> {
        let source = self
            .sources
            .lock()
            .map_err(|_| DocScanError::Bridge("camera state lock poisoned".into()))?
            .pop_front()
            .ok_or_else(|| DocScanError::Bridge("no more photos to replay".into()))?;
        let dir = self
            .capture_dir
            .as_ref()
            .ok_or(DocScanError::PlatformUnavailable)?;

        let mut captured = self
            .captured
            .lock()
            .map_err(|_| DocScanError::Bridge("camera state lock poisoned".into()))?;
        *captured += 1;

        let ext = source
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("jpg");
        let target = dir.join(format!("capture_{:03}.{ext}", *captured));
        std::fs::create_dir_all(dir)?;
        std::fs::copy(&source, &target)?;
        info!(source = %source.display(), target = %target.display(), "photo captured");
        Ok(target)
    }
}

fn decode_preview(path: &Path) -> Result<DynamicImage> {
    let image = image::open(path).map_err(|err| {
        DocScanError::ImageError(format!("failed to open {}: {}", path.display(), err))
    })?;
    Ok(if image.width() > PREVIEW_FRAME_WIDTH {
        image.resize(PREVIEW_FRAME_WIDTH, u32::MAX, image::imageops::FilterType::Triangle)
    } else {
        image
    })
}

impl PlatformBridge for SoftwareBridge {
    fn platform_name(&self) -> &str {
        "Desktop (software)"
    }
}

impl VisionPrimitives for SoftwareBridge {
    fn find_quadrilaterals(
        &self,
        image: &DynamicImage,
        shrunk_height: u32,
        rotation_degrees: i32,
    ) -> Result<Vec<Vec<Point>>> {
        self.vision
            .find_quadrilaterals(image, shrunk_height, rotation_degrees)
    }

    fn warp_perspective(
        &self,
        image: &DynamicImage,
        corners: &[Point; 4],
        size: CropSize,
    ) -> Result<DynamicImage> {
        self.vision.warp_perspective(image, corners, size)
    }
}

impl NativeCamera for SoftwareBridge {
    fn start(&self, events: UnboundedSender<CameraEvent>) -> Result<()> {
        self.stream_preview_frames(&events)?;
        *self
            .events
            .lock()
            .map_err(|_| DocScanError::Bridge("camera state lock poisoned".into()))? = Some(events);
        Ok(())
    }

    fn take_photo(&self) -> Result<()> {
        let events = self.sender()?;
        let event = match self.capture_next() {
            Ok(path) => CameraEvent::PhotoReady { path },
            Err(err) => {
                warn!(error = %err, "software camera could not capture");
                CameraEvent::Error {
                    message: err.to_string(),
                }
            }
        };
        events
            .send(event)
            .map_err(|_| DocScanError::Bridge("camera event queue closed".into()))?;

        // Keep the live preview going for the next page.
        if let Err(err) = self.stream_preview_frames(&events) {
            warn!(error = %err, "could not stream preview frames");
        }
        Ok(())
    }

    fn stop(&self) {
        if let Ok(mut guard) = self.events.lock() {
            guard.take();
        }
        debug!("software camera stopped");
    }

    fn set_flash_mode(&self, mode: FlashMode) -> Result<()> {
        debug!(?mode, "flash mode ignored by software camera");
        Ok(())
    }

    fn set_auto_focus(&self, enabled: bool) -> Result<()> {
        debug!(enabled, "auto focus ignored by software camera");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tokio::sync::mpsc::unbounded_channel;

    fn write_photo(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        RgbImage::from_pixel(32, 48, Rgb([200, 200, 200]))
            .save(&path)
            .expect("write photo");
        path
    }

    #[test]
    fn take_photo_copies_next_source() {
        let dir = tempfile::tempdir().expect("tempdir");
        let src = write_photo(dir.path(), "page.png");
        let bridge = SoftwareBridge::with_photos(vec![src.clone()], dir.path().join("captures"));
        let (tx, mut rx) = unbounded_channel();

        bridge.start(tx).expect("start");
        bridge.take_photo().expect("take photo");

        match rx.try_recv().expect("event") {
            CameraEvent::PhotoReady { path } => {
                assert!(path.exists());
                assert_ne!(path, src);
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert!(src.exists(), "source must be left in place");
    }

    #[test]
    fn running_out_of_photos_reports_camera_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let bridge = SoftwareBridge::with_photos(Vec::new(), dir.path());
        let (tx, mut rx) = unbounded_channel();
        bridge.start(tx).expect("start");
        bridge.take_photo().expect("event delivered");
        assert!(matches!(rx.try_recv(), Ok(CameraEvent::Error { .. })));
    }

    #[test]
    fn take_photo_before_start_fails() {
        let bridge = SoftwareBridge::default();
        assert!(bridge.take_photo().is_err());
    }
}
