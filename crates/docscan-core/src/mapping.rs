// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Coordinate mapping between original-photo space and a displayed preview.
//
// A preview is described by its bounds inside the view and a scale ratio
// (preview pixels per source pixel). The mapping functions are pure; the
// ratio is always computed by the caller, usually via `scale_ratio`.

use crate::error::{DocScanError, Result};
use crate::geometry::{Point, Quad, Rect};

/// Place a source-space quad onto the (possibly letterboxed) preview.
pub fn to_preview_space(quad: &Quad, bounds: &Rect, ratio: f64) -> Quad {
    quad.map_points(|p| Point::new(p.x * ratio + bounds.left, p.y * ratio + bounds.top))
}

/// Inverse of [`to_preview_space`]. `ratio` must be positive.
pub fn to_original_space(quad: &Quad, bounds: &Rect, ratio: f64) -> Quad {
    quad.map_points(|p| Point::new((p.x - bounds.left) / ratio, (p.y - bounds.top) / ratio))
}

/// `preview_height / source_height`, rejecting ratios that would make the
/// inverse mapping divide by zero.
pub fn scale_ratio(preview_height: f64, source_height: u32) -> Result<f64> {
    if source_height == 0 {
        return Err(DocScanError::InvalidDimensions(
            "source image has zero height".into(),
        ));
    }
    if !preview_height.is_finite() || preview_height <= 0.0 {
        return Err(DocScanError::InvalidDimensions(format!(
            "preview height must be positive, got {preview_height}"
        )));
    }
    Ok(preview_height / source_height as f64)
}

/// Bounds of an `image_w` x `image_h` image scaled to fit inside a
/// `container_w` x `container_h` view, keeping aspect ratio and centring the
/// blank bands.
pub fn fit_centered(image_w: u32, image_h: u32, container_w: u32, container_h: u32) -> Result<Rect> {
    if image_w == 0 || image_h == 0 {
        return Err(DocScanError::InvalidDimensions(format!(
            "cannot fit an empty {image_w}x{image_h} image"
        )));
    }
    if container_w == 0 || container_h == 0 {
        return Err(DocScanError::InvalidDimensions(format!(
            "preview container is empty ({container_w}x{container_h})"
        )));
    }

    let (iw, ih) = (image_w as f64, image_h as f64);
    let (cw, ch) = (container_w as f64, container_h as f64);
    let scale = (cw / iw).min(ch / ih);
    let (w, h) = (iw * scale, ih * scale);

    Ok(Rect::new((cw - w) / 2.0, (ch - h) / 2.0, w, h))
}

/// Height of an analysis frame once the sensor rotation is applied: sideways
/// frames (90° / 270°) present their width as height.
pub fn analysis_height(frame_w: u32, frame_h: u32, rotation_degrees: i32) -> u32 {
    match rotation_degrees.rem_euclid(360) {
        90 | 270 => frame_w,
        _ => frame_h,
    }
}
