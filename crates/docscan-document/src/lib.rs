// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docscan-document: Per-photo document processing.
//
// Corner detection over a captured photo (with the inset fallback), the crop
// finalizer that maps a chosen quad back onto the full-resolution original
// and rectifies it, colour filters, and the image loading/encoding helpers
// they share.

pub mod crop;
pub mod detect;
pub mod document;
pub mod filter;
pub mod image;

pub use crop::CropFinalizer;
pub use detect::{CornerAnalyzer, CornerDetector, DetectParams};
pub use document::Document;
pub use filter::apply_color_filter;
pub use self::image::processor::ImageProcessor;
