// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Crop finalizer: turns a chosen quad into the final upright document image.
//
// The quad is chosen on a downscaled preview, so it is first mapped back onto
// the full-resolution original, then rectified by the warp primitive and
// optionally colour-filtered.

use std::sync::Arc;

use docscan_bridge::VisionPrimitives;
use docscan_core::error::{DocScanError, Result};
use docscan_core::mapping::{scale_ratio, to_original_space};
use docscan_core::{ColorFilter, Rect};
use image::DynamicImage;
use tracing::{debug, info, instrument};

use crate::document::Document;
use crate::filter::apply_color_filter;
use crate::image::processor::ImageProcessor;

/// Longest side, in pixels, an original photo is decoded at for cropping.
pub const MAX_ORIGINAL_DIMENSION: u32 = 4000;

#[derive(Clone)]
pub struct CropFinalizer {
    vision: Arc<dyn VisionPrimitives>,
}

impl CropFinalizer {
    pub fn new(vision: Arc<dyn VisionPrimitives>) -> Self {
        Self { vision }
    }

    /// Load the document's original photo and crop it.
    ///
    /// Deleting the original afterwards is the caller's job, whatever the
    /// outcome.
    #[instrument(skip_all, fields(path = %document.original_photo_path.display()))]
    pub fn finalize_crop(
        &self,
        document: &Document,
        color_filter: Option<&ColorFilter>,
    ) -> Result<DynamicImage> {
        if document.quad.is_none() {
            return Err(DocScanError::MissingQuad);
        }
        let original =
            ImageProcessor::open_bounded(&document.original_photo_path, MAX_ORIGINAL_DIMENSION)
                .map_err(crop_failed)?
                .into_dynamic();
        self.crop_loaded(document, &original, color_filter)
    }

    /// Crop an already decoded original.
    pub fn crop_loaded(
        &self,
        document: &Document,
        original: &DynamicImage,
        color_filter: Option<&ColorFilter>,
    ) -> Result<DynamicImage> {
        let quad = document.quad.ok_or(DocScanError::MissingQuad)?;

        let corners = match &document.preview {
            Some(preview) => {
                let bounds = Rect::from_size(preview.width(), preview.height());
                let ratio =
                    scale_ratio(f64::from(preview.height()), original.height()).map_err(crop_failed)?;
                to_original_space(&quad, &bounds, ratio)
            }
            None => quad,
        };

        let size = corners.crop_size();
        debug!(?corners, width = size.width, height = size.height, "warping document");

        let cropped = self
            .vision
            .warp_perspective(original, &corners.corners(), size)
            .map_err(crop_failed)?;

        info!(width = cropped.width(), height = cropped.height(), "document cropped");
        Ok(match color_filter {
            Some(filter) => apply_color_filter(&cropped, filter),
            None => cropped,
        })
    }
}

fn crop_failed(err: DocScanError) -> DocScanError {
    match err {
        DocScanError::CropFailed(_) => err,
        other => DocScanError::CropFailed(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use docscan_core::{CropSize, Point, Quad};
    use image::{Rgba, RgbaImage};

    /// Records the warp request and returns a flat image of the requested size.
    #[derive(Default)]
    struct RecordingWarp {
        calls: Mutex<Vec<([Point; 4], CropSize)>>,
        fail: bool,
    }

    impl VisionPrimitives for RecordingWarp {
        fn find_quadrilaterals(&self, _: &DynamicImage, _: u32, _: i32) -> Result<Vec<Vec<Point>>> {
            Ok(Vec::new())
        }

        fn warp_perspective(
            &self,
            _: &DynamicImage,
            corners: &[Point; 4],
            size: CropSize,
        ) -> Result<DynamicImage> {
            if self.fail {
                return Err(DocScanError::ImageError("warp exploded".into()));
            }
            self.calls.lock().expect("lock").push((*corners, size));
            Ok(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
                size.width,
                size.height,
                Rgba([10, 120, 240, 255]),
            )))
        }
    }

    fn rect_quad(x0: f64, y0: f64, x1: f64, y1: f64) -> Quad {
        Quad {
            top_left: Point::new(x0, y0),
            top_right: Point::new(x1, y0),
            bottom_right: Point::new(x1, y1),
            bottom_left: Point::new(x0, y1),
        }
    }

    fn blank(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::new(w, h))
    }

    #[test]
    fn preview_quad_is_mapped_to_original_space() {
        let warp = Arc::new(RecordingWarp::default());
        let finalizer = CropFinalizer::new(warp.clone());
        let document = Document::new("unused.jpg", Some(Arc::new(blank(500, 800))))
            .with_quad(rect_quad(50.0, 50.0, 450.0, 750.0));

        let out = finalizer
            .crop_loaded(&document, &blank(1000, 1600), None)
            .expect("crop");

        assert_eq!((out.width(), out.height()), (800, 1400));
        let calls = warp.calls.lock().expect("lock");
        let (corners, size) = calls[0];
        assert_eq!(size, CropSize { width: 800, height: 1400 });
        assert_eq!(corners[0], Point::new(100.0, 100.0));
        assert_eq!(corners[2], Point::new(900.0, 1500.0));
    }

    #[test]
    fn quad_without_preview_is_used_as_is() {
        let warp = Arc::new(RecordingWarp::default());
        let finalizer = CropFinalizer::new(warp.clone());
        let document = Document::new("unused.jpg", None).with_quad(rect_quad(10.0, 20.0, 110.0, 220.0));

        finalizer
            .crop_loaded(&document, &blank(300, 300), None)
            .expect("crop");
        let calls = warp.calls.lock().expect("lock");
        assert_eq!(calls[0].0[0], Point::new(10.0, 20.0));
        assert_eq!(calls[0].1, CropSize { width: 100, height: 200 });
    }

    #[test]
    fn missing_quad_is_rejected() {
        let finalizer = CropFinalizer::new(Arc::new(RecordingWarp::default()));
        let document = Document::new("unused.jpg", None);
        assert!(matches!(
            finalizer.crop_loaded(&document, &blank(10, 10), None),
            Err(DocScanError::MissingQuad)
        ));
        assert!(matches!(
            finalizer.finalize_crop(&document, None),
            Err(DocScanError::MissingQuad)
        ));
    }

    #[test]
    fn warp_failure_becomes_crop_failed() {
        let finalizer = CropFinalizer::new(Arc::new(RecordingWarp {
            fail: true,
            ..RecordingWarp::default()
        }));
        let document = Document::new("unused.jpg", None).with_quad(rect_quad(0.0, 0.0, 5.0, 5.0));
        let err = finalizer
            .crop_loaded(&document, &blank(10, 10), None)
            .expect_err("should fail");
        assert!(matches!(err, DocScanError::CropFailed(_)));
        assert!(err.to_string().starts_with("unable to crop image"));
    }

    #[test]
    fn unreadable_original_becomes_crop_failed() {
        let finalizer = CropFinalizer::new(Arc::new(RecordingWarp::default()));
        let document =
            Document::new("/nonexistent/capture.jpg", None).with_quad(rect_quad(0.0, 0.0, 5.0, 5.0));
        assert!(matches!(
            finalizer.finalize_crop(&document, None),
            Err(DocScanError::CropFailed(_))
        ));
    }

    #[test]
    fn colour_filter_is_applied_to_the_crop() {
        let finalizer = CropFinalizer::new(Arc::new(RecordingWarp::default()));
        let document = Document::new("unused.jpg", None).with_quad(rect_quad(0.0, 0.0, 4.0, 4.0));
        let out = finalizer
            .crop_loaded(&document, &blank(10, 10), Some(&ColorFilter::GRAYSCALE))
            .expect("crop")
            .to_rgba8();
        let Rgba([r, g, b, _]) = *out.get_pixel(0, 0);
        assert_eq!(r, g);
        assert_eq!(g, b);
    }

    #[test]
    fn finalize_reads_the_original_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("capture.png");
        blank(200, 320).save(&path).expect("write original");

        let warp = Arc::new(RecordingWarp::default());
        let finalizer = CropFinalizer::new(warp.clone());
        let document = Document::new(&path, Some(Arc::new(blank(100, 160))))
            .with_quad(rect_quad(10.0, 10.0, 90.0, 150.0));

        let out = finalizer.finalize_crop(&document, None).expect("crop");
        assert_eq!((out.width(), out.height()), (160, 280));
    }
}
