// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capture record: one document cut out of one photo.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use docscan_core::{ColorFilter, Quad};
use image::DynamicImage;

/// A document waiting to be cropped.
///
/// `quad` is in preview-image coordinates when `preview` is set, otherwise in
/// original-photo coordinates. Several documents cut from the same photo share
/// one preview.
#[derive(Clone)]
pub struct Document {
    pub original_photo_path: PathBuf,
    pub preview: Option<Arc<DynamicImage>>,
    pub quad: Option<Quad>,
    pub color_filter: Option<ColorFilter>,
}

impl Document {
    pub fn new(original_photo_path: impl Into<PathBuf>, preview: Option<Arc<DynamicImage>>) -> Self {
        Self {
            original_photo_path: original_photo_path.into(),
            preview,
            quad: None,
            color_filter: None,
        }
    }

    pub fn with_quad(mut self, quad: Quad) -> Self {
        self.quad = Some(quad);
        self
    }

    pub fn with_color_filter(mut self, filter: Option<ColorFilter>) -> Self {
        self.color_filter = filter;
        self
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("original_photo_path", &self.original_photo_path)
            .field(
                "preview",
                &self.preview.as_ref().map(|p| (p.width(), p.height())),
            )
            .field("quad", &self.quad)
            .field("color_filter", &self.color_filter)
            .finish()
    }
}
