// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for native capabilities.

use std::path::PathBuf;

use docscan_core::error::Result;
use docscan_core::{CropSize, FlashMode, Point};
use image::DynamicImage;
use tokio::sync::mpsc::UnboundedSender;

/// Everything a scan session needs from the host platform.
pub trait PlatformBridge: VisionPrimitives + NativeCamera {
    /// Human-readable platform name (e.g. "Android 14", "Desktop (software)").
    fn platform_name(&self) -> &str;
}

/// The two heavy vision calls, normally backed by a native library.
///
/// Implementations must be callable from a blocking worker thread.
pub trait VisionPrimitives: Send + Sync {
    /// Find document-shaped quadrilaterals in `image`.
    ///
    /// The implementation shrinks the image to `shrunk_height` before
    /// searching and compensates for `rotation_degrees` of sensor rotation.
    /// Each candidate is a list of corner points in the (rotated) full-size
    /// image space, in no particular order. An empty list, or an empty first
    /// candidate, means nothing was found.
    fn find_quadrilaterals(
        &self,
        image: &DynamicImage,
        shrunk_height: u32,
        rotation_degrees: i32,
    ) -> Result<Vec<Vec<Point>>>;

    /// Rectify the region bounded by `corners` (any order) into an upright
    /// image of exactly `size`.
    fn warp_perspective(
        &self,
        image: &DynamicImage,
        corners: &[Point; 4],
        size: CropSize,
    ) -> Result<DynamicImage>;
}

/// Events a camera pushes to the session's single consumer queue.
#[derive(Debug, Clone)]
pub enum CameraEvent {
    /// A live preview frame is ready for analysis.
    FrameReady {
        frame: DynamicImage,
        rotation_degrees: i32,
    },
    /// A full-resolution photo was written to `path`. The session owns the
    /// file from here on and deletes it when done.
    PhotoReady { path: PathBuf },
    /// The camera failed; the session cannot continue.
    Error { message: String },
}

/// Camera control.
pub trait NativeCamera: Send + Sync {
    /// Open the camera and begin streaming events into `events`.
    fn start(&self, events: UnboundedSender<CameraEvent>) -> Result<()>;

    /// Request a full-resolution photo. Completion is reported as a
    /// `PhotoReady` or `Error` event.
    fn take_photo(&self) -> Result<()>;

    /// Stop streaming and release the camera.
    fn stop(&self);

    fn set_flash_mode(&self, mode: FlashMode) -> Result<()>;

    fn set_auto_focus(&self, enabled: bool) -> Result<()>;
}
