// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Corner detection orchestrator.
//
// Wraps the `find_quadrilaterals` primitive: detector failures are logged and
// treated as "nothing found", raw candidates are put into canonical corner
// order and capped, and a photo with no document can fall back to a quad
// inset from its edges so the user still has something to drag.

use std::sync::Arc;

use docscan_bridge::VisionPrimitives;
use docscan_core::{Point, Quad, Rect, ScanConfig};
use image::DynamicImage;
use tracing::{debug, instrument, warn};

/// Margin, in pixels, of the fallback quad from every photo edge.
pub const DEFAULT_INSET: f64 = 100.0;

/// Produces document quads for a photo or live frame.
///
/// Returned quads are in the (rotated) coordinate space of `photo`. `None`
/// means no document was found and no fallback was requested.
pub trait CornerAnalyzer: Send + Sync {
    fn detect_corners(&self, photo: &DynamicImage, params: &DetectParams) -> Option<Vec<Quad>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectParams {
    /// Height frames are shrunk to before detection.
    pub shrunk_height: u32,
    pub rotation_degrees: i32,
    /// Return an inset quad instead of `None` when nothing is found.
    pub use_default_fallback: bool,
    /// Upper bound on the number of quads returned.
    pub max_simultaneous: usize,
}

impl Default for DetectParams {
    fn default() -> Self {
        Self {
            shrunk_height: 500,
            rotation_degrees: 0,
            use_default_fallback: true,
            max_simultaneous: 1,
        }
    }
}

impl DetectParams {
    /// Parameters for a captured photo under `config`.
    pub fn for_photo(config: &ScanConfig) -> Self {
        Self {
            shrunk_height: config.shrunk_analysis_height,
            max_simultaneous: config.max_num_simultaneous_documents,
            ..Self::default()
        }
    }

    /// Parameters for a live preview frame: no fallback, so an empty frame
    /// does not count as a detection.
    pub fn for_live_frame(config: &ScanConfig, rotation_degrees: i32) -> Self {
        Self {
            rotation_degrees,
            use_default_fallback: false,
            ..Self::for_photo(config)
        }
    }
}

/// The fallback quad: the `width` x `height` photo inset by
/// [`DEFAULT_INSET`] on every side.
///
/// Photos no larger than twice the inset yield a degenerate or inverted quad;
/// it is returned unchanged.
pub fn default_quad(width: u32, height: u32) -> Quad {
    if f64::from(width) <= 2.0 * DEFAULT_INSET || f64::from(height) <= 2.0 * DEFAULT_INSET {
        warn!(width, height, "photo too small for the default inset");
    }
    Quad::from_rect(Rect::from_size(width, height).inset(DEFAULT_INSET))
}

/// `CornerAnalyzer` over a `VisionPrimitives` implementation.
#[derive(Clone)]
pub struct CornerDetector {
    vision: Arc<dyn VisionPrimitives>,
}

impl CornerDetector {
    pub fn new(vision: Arc<dyn VisionPrimitives>) -> Self {
        Self { vision }
    }
}

impl CornerAnalyzer for CornerDetector {
    #[instrument(skip_all, fields(
        width = photo.width(),
        height = photo.height(),
        rotation = params.rotation_degrees,
    ))]
    fn detect_corners(&self, photo: &DynamicImage, params: &DetectParams) -> Option<Vec<Quad>> {
        let candidates = match self.vision.find_quadrilaterals(
            photo,
            params.shrunk_height,
            params.rotation_degrees,
        ) {
            Ok(candidates) => candidates,
            Err(err) => {
                warn!(error = %err, "corner detection failed; treating as no document");
                Vec::new()
            }
        };

        let quads = canonical_quads(&candidates, params.max_simultaneous);
        if !quads.is_empty() {
            debug!(count = quads.len(), "document corners found");
            return Some(quads);
        }

        if params.use_default_fallback {
            let (w, h) = (photo.width(), photo.height());
            debug!(w, h, "no document found, using inset fallback");
            Some(vec![default_quad(w, h)])
        } else {
            None
        }
    }
}

/// Canonicalize raw candidates, dropping malformed ones, and keep at most
/// `cap` of them.
fn canonical_quads(candidates: &[Vec<Point>], cap: usize) -> Vec<Quad> {
    if candidates.first().is_none_or(|first| first.is_empty()) {
        return Vec::new();
    }

    candidates
        .iter()
        .filter_map(|points| match Quad::canonicalize(points) {
            Ok(quad) => Some(quad),
            Err(err) => {
                warn!(error = %err, "dropping malformed candidate");
                None
            }
        })
        .take(cap)
        .collect()
}
