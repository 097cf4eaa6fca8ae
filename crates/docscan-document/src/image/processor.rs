// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor: bounded loading of captured photos and JPEG output of
// finished crops.

use std::path::Path;

use docscan_core::error::{DocScanError, Result};
use image::DynamicImage;
use image::imageops::FilterType;
use tracing::{debug, info, instrument};

/// Owns one in-memory image on its way from disk to an encoded crop.
///
/// Transformations consume `self` and return a new processor, so calls chain:
///
/// ```ignore
/// let bytes = ImageProcessor::open_bounded("capture.jpg", 4000)?
///     .to_jpeg_bytes(90)?;
/// ```
pub struct ImageProcessor {
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let img = image::open(path.as_ref()).map_err(|err| {
            DocScanError::ImageError(format!(
                "failed to open {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        info!(width = img.width(), height = img.height(), "Image loaded");
        Ok(Self { image: img })
    }

    /// Load an image and shrink it so neither side exceeds `max_dimension`.
    pub fn open_bounded(path: impl AsRef<Path>, max_dimension: u32) -> Result<Self> {
        Ok(Self::open(path)?.fit_within(max_dimension))
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations ------------------------------------------------------

    /// Downscale (never upscale) so the longest side is at most
    /// `max_dimension`, keeping aspect ratio.
    pub fn fit_within(self, max_dimension: u32) -> Self {
        if self.width().max(self.height()) <= max_dimension || max_dimension == 0 {
            return self;
        }
        self.resize(max_dimension, max_dimension)
    }

    /// Downscale (never upscale) to at most `max_width` pixels wide.
    pub fn fit_width(self, max_width: u32) -> Self {
        if self.width() <= max_width || max_width == 0 {
            return self;
        }
        self.resize(max_width, u32::MAX)
    }

    #[instrument(skip(self))]
    fn resize(self, max_width: u32, max_height: u32) -> Self {
        let resized = self
            .image
            .resize(max_width, max_height, FilterType::Lanczos3);
        debug!(
            from_w = self.image.width(),
            from_h = self.image.height(),
            new_w = resized.width(),
            new_h = resized.height(),
            "Resize complete"
        );
        Self { image: resized }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as JPEG bytes with the given quality (1-100).
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let rgb = self.image.to_rgb8();
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality);
        rgb.write_with_encoder(encoder)
            .map_err(|err| DocScanError::ImageError(format!("JPEG encoding failed: {}", err)))?;
        Ok(buffer)
    }

    /// Write the image as a JPEG file at `quality`.
    #[instrument(skip_all, fields(path = %path.as_ref().display(), quality = quality))]
    pub fn save_jpeg(&self, path: impl AsRef<Path>, quality: u8) -> Result<()> {
        let bytes = self.to_jpeg_bytes(quality)?;
        std::fs::write(path.as_ref(), &bytes)?;
        debug!(bytes = bytes.len(), "JPEG written");
        Ok(())
    }
}
