// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Software vision primitives: Hough-line document detection and projective
// warping on top of `imageproc`, for builds without a native vision library.

use std::borrow::Cow;

use docscan_core::error::{DocScanError, Result};
use docscan_core::{CropSize, Point, Quad};
use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, Rgba, RgbaImage};
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use imageproc::hough::{LineDetectionOptions, PolarLine, detect_lines};
use tracing::{debug, instrument, warn};

use crate::traits::VisionPrimitives;

/// Smallest share of the analysed frame a detected document may cover.
const MIN_AREA_FRACTION: f64 = 0.10;

/// Document finder based on the dominant straight edges of the frame.
///
/// ## Pipeline
///
/// 1. Rotate by the sensor rotation, shrink to the analysis height, grayscale
/// 2. Gaussian blur (sigma 2.0) for noise reduction
/// 3. Canny edge detection
/// 4. Hough line detection
/// 5. Split lines into roughly horizontal and roughly vertical
/// 6. Pick the outermost line on each side
/// 7. Intersect them into four corners, reject tiny quads
/// 8. Scale the corners back to full-size coordinates
///
/// Only one candidate is ever returned.
#[derive(Debug, Clone, Copy, Default)]
pub struct HoughVision;

impl VisionPrimitives for HoughVision {
    #[instrument(skip(self, image), fields(width = image.width(), height = image.height()))]
    fn find_quadrilaterals(
        &self,
        image: &DynamicImage,
        shrunk_height: u32,
        rotation_degrees: i32,
    ) -> Result<Vec<Vec<Point>>> {
        let oriented: Cow<'_, DynamicImage> = match rotation_degrees.rem_euclid(360) {
            90 => Cow::Owned(image.rotate90()),
            180 => Cow::Owned(image.rotate180()),
            270 => Cow::Owned(image.rotate270()),
            _ => Cow::Borrowed(image),
        };

        let (full_w, full_h) = (oriented.width(), oriented.height());
        if full_w == 0 || full_h == 0 {
            return Err(DocScanError::InvalidDimensions(format!(
                "cannot analyse an empty {full_w}x{full_h} frame"
            )));
        }

        let gray = oriented.to_luma8();
        let (gray, scale) = if shrunk_height > 0 && full_h > shrunk_height {
            let scale = shrunk_height as f64 / full_h as f64;
            let w = ((full_w as f64 * scale).round() as u32).max(1);
            (
                image::imageops::resize(&gray, w, shrunk_height, FilterType::Triangle),
                scale,
            )
        } else {
            (gray, 1.0)
        };

        let Some(corners) = find_document_corners(&gray) else {
            return Ok(Vec::new());
        };

        let points = corners
            .iter()
            .map(|&(x, y)| Point::new(x / scale, y / scale))
            .collect();
        Ok(vec![points])
    }

    #[instrument(skip(self, image, corners), fields(out_w = size.width, out_h = size.height))]
    fn warp_perspective(
        &self,
        image: &DynamicImage,
        corners: &[Point; 4],
        size: CropSize,
    ) -> Result<DynamicImage> {
        if size.is_empty() {
            return Err(DocScanError::InvalidDimensions(format!(
                "warp target {}x{} is empty",
                size.width, size.height
            )));
        }

        let quad = Quad::canonicalize(corners)?;
        let src = quad.corners().map(|p| (p.x as f32, p.y as f32));
        let (w, h) = (size.width as f32, size.height as f32);
        let dest = [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)];

        let projection = Projection::from_control_points(src, dest).ok_or_else(|| {
            DocScanError::ImageError("corners do not define a projective transform".into())
        })?;

        let rgba = image.to_rgba8();
        let mut output = RgbaImage::new(size.width, size.height);
        warp_into(
            &rgba,
            &projection,
            Interpolation::Bilinear,
            Rgba([255u8, 255, 255, 255]),
            &mut output,
        );

        debug!("perspective warp applied");
        Ok(DynamicImage::ImageRgba8(output))
    }
}

/// Run the edge/line pipeline on an already shrunk grayscale frame.
///
/// Returns `[top_left, top_right, bottom_right, bottom_left]` in frame pixels.
fn find_document_corners(gray: &GrayImage) -> Option<[(f64, f64); 4]> {
    let (w, h) = gray.dimensions();

    let blurred = gaussian_blur_f32(gray, 2.0);
    let edges = canny(&blurred, 50.0, 150.0);

    // Vote threshold proportional to the diagonal so detection scales with
    // resolution.
    let diagonal = ((w as f64).powi(2) + (h as f64).powi(2)).sqrt();
    let options = LineDetectionOptions {
        vote_threshold: (diagonal * 0.25).max(40.0) as u32,
        suppression_radius: 8,
    };
    let lines = detect_lines(&edges, options);
    debug!(line_count = lines.len(), "Hough lines detected");

    let (horizontal, vertical) = classify_lines(&lines);
    if horizontal.len() < 2 || vertical.len() < 2 {
        debug!(
            horizontal = horizontal.len(),
            vertical = vertical.len(),
            "not enough edges for a document"
        );
        return None;
    }

    let mid_x = w as f64 / 2.0;
    let mid_y = h as f64 / 2.0;
    let (top, bottom) = extremes(&horizontal, |l| horizontal_y_at(l, mid_x))?;
    let (left, right) = extremes(&vertical, |l| vertical_x_at(l, mid_y))?;

    let corners = [
        intersect_polar_lines(&top, &left)?,
        intersect_polar_lines(&top, &right)?,
        intersect_polar_lines(&bottom, &right)?,
        intersect_polar_lines(&bottom, &left)?,
    ];

    let area = Quad {
        top_left: Point::new(corners[0].0, corners[0].1),
        top_right: Point::new(corners[1].0, corners[1].1),
        bottom_right: Point::new(corners[2].0, corners[2].1),
        bottom_left: Point::new(corners[3].0, corners[3].1),
    }
    .area();
    let min_area = w as f64 * h as f64 * MIN_AREA_FRACTION;
    if area < min_area {
        warn!(area, min_area, "detected quadrilateral too small; ignoring");
        return None;
    }

    Some(corners)
}

/// Split Hough lines by orientation.
///
/// A `PolarLine` is `x cos θ + y sin θ = r`, so θ near 90° is a horizontal
/// edge and θ near 0°/180° a vertical one. Diagonal lines are dropped.
fn classify_lines(lines: &[PolarLine]) -> (Vec<PolarLine>, Vec<PolarLine>) {
    let mut horizontal = Vec::new();
    let mut vertical = Vec::new();

    for line in lines {
        let angle = line.angle_in_degrees;
        if (60..=120).contains(&angle) {
            horizontal.push(*line);
        } else if angle <= 30 || angle >= 150 {
            vertical.push(*line);
        }
    }

    (horizontal, vertical)
}

/// The lines with the smallest and largest `position`, if they differ.
fn extremes(lines: &[PolarLine], position: impl Fn(&PolarLine) -> f64) -> Option<(PolarLine, PolarLine)> {
    let first = *lines.iter().min_by(|a, b| position(a).total_cmp(&position(b)))?;
    let last = *lines.iter().max_by(|a, b| position(a).total_cmp(&position(b)))?;
    if (position(&last) - position(&first)).abs() < 1.0 {
        return None;
    }
    Some((first, last))
}

/// `y` where a roughly horizontal line crosses `x`.
fn horizontal_y_at(line: &PolarLine, x: f64) -> f64 {
    let theta = (line.angle_in_degrees as f64).to_radians();
    (line.r as f64 - x * theta.cos()) / theta.sin()
}

/// `x` where a roughly vertical line crosses `y`.
fn vertical_x_at(line: &PolarLine, y: f64) -> f64 {
    let theta = (line.angle_in_degrees as f64).to_radians();
    (line.r as f64 - y * theta.sin()) / theta.cos()
}

/// Intersection of two lines in polar (Hough) form, or `None` when they are
/// (nearly) parallel.
fn intersect_polar_lines(a: &PolarLine, b: &PolarLine) -> Option<(f64, f64)> {
    let theta_a = (a.angle_in_degrees as f64).to_radians();
    let theta_b = (b.angle_in_degrees as f64).to_radians();

    let (sin_a, cos_a) = theta_a.sin_cos();
    let (sin_b, cos_b) = theta_b.sin_cos();

    let denom = cos_a * sin_b - sin_a * cos_b;
    if denom.abs() < 1e-6 {
        return None;
    }

    let r_a = a.r as f64;
    let r_b = b.r as f64;
    let x = (r_a * sin_b - r_b * sin_a) / denom;
    let y = (r_b * cos_a - r_a * cos_b) / denom;
    Some((x, y))
}
