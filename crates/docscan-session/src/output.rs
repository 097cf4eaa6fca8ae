// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Result delivery: saving finished crops and packaging them in the
// configured response format.

use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Local};
use docscan_core::ResponseFormat;
use docscan_core::error::{DocScanError, Result};
use docscan_document::ImageProcessor;
use image::DynamicImage;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// One delivered page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutput {
    /// Base64 (standard alphabet) JPEG bytes.
    Base64(String),
    /// Path of the saved JPEG.
    File(PathBuf),
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Pages in capture order.
    Completed(Vec<ScanOutput>),
    Cancelled,
    /// The error message handed back to the host.
    Failed(String),
}

impl SessionOutcome {
    pub fn failed(err: &DocScanError) -> Self {
        Self::Failed(err.to_string())
    }
}

/// File name for page `page` (zero-based) of a scan finished at `taken_at`.
///
/// A random suffix keeps names unique within the same second.
pub fn crop_file_name(page: usize, taken_at: &DateTime<Local>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "SCAN_{page}_{}_{}.jpg",
        taken_at.format("%Y%m%d_%H%M%S"),
        &suffix[..8]
    )
}

/// Save a finished crop as a JPEG in `dir`.
#[instrument(skip_all, fields(dir = %dir.display(), page = page, quality = quality))]
pub fn save_crop(
    image: &DynamicImage,
    dir: &Path,
    page: usize,
    taken_at: &DateTime<Local>,
    quality: u8,
) -> Result<PathBuf> {
    let path = dir.join(crop_file_name(page, taken_at));
    std::fs::create_dir_all(dir).map_err(|err| DocScanError::SaveFailed(err.to_string()))?;
    ImageProcessor::from_dynamic(image.clone())
        .save_jpeg(&path, quality)
        .map_err(|err| DocScanError::SaveFailed(err.to_string()))?;
    debug!(path = %path.display(), "crop saved");
    Ok(path)
}

/// Package saved crops for the host.
///
/// `Base64` re-encodes each file at `quality` and deletes it; `ImageFilePath`
/// hands the paths over as they are.
#[instrument(skip(saved), fields(pages = saved.len()))]
pub fn deliver(saved: Vec<PathBuf>, format: ResponseFormat, quality: u8) -> Result<Vec<ScanOutput>> {
    let outputs = match format {
        ResponseFormat::ImageFilePath => saved.into_iter().map(ScanOutput::File).collect(),
        ResponseFormat::Base64 => {
            let mut outputs = Vec::with_capacity(saved.len());
            for (index, path) in saved.iter().enumerate() {
                let encoded = ImageProcessor::open(path).and_then(|img| img.to_jpeg_bytes(quality));
                let bytes = match encoded {
                    Ok(bytes) => bytes,
                    Err(err) => {
                        saved[index..].iter().for_each(|p| remove_crop(p));
                        return Err(err);
                    }
                };
                outputs.push(ScanOutput::Base64(STANDARD.encode(bytes)));
                remove_crop(path);
            }
            outputs
        }
    };
    info!(?format, count = outputs.len(), "scan results ready");
    Ok(outputs)
}

fn remove_crop(path: &Path) {
    if let Err(err) = std::fs::remove_file(path) {
        warn!(path = %path.display(), error = %err, "could not delete crop");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn page() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(24, 32, Rgb([240, 240, 235])))
    }

    #[test]
    fn file_name_follows_scan_pattern() {
        let taken_at = Local::now();
        let name = crop_file_name(3, &taken_at);
        let stamp = taken_at.format("%Y%m%d_%H%M%S").to_string();
        assert!(name.starts_with(&format!("SCAN_3_{stamp}_")));
        assert!(name.ends_with(".jpg"));
        assert_ne!(name, crop_file_name(3, &taken_at));
    }

    #[test]
    fn base64_delivery_encodes_and_removes_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let now = Local::now();
        let saved = vec![
            save_crop(&page(), dir.path(), 0, &now, 90).expect("save"),
            save_crop(&page(), dir.path(), 1, &now, 90).expect("save"),
        ];

        let outputs = deliver(saved.clone(), ResponseFormat::Base64, 80).expect("deliver");
        assert_eq!(outputs.len(), 2);
        for output in &outputs {
            let ScanOutput::Base64(encoded) = output else {
                panic!("expected base64 output");
            };
            let bytes = STANDARD.decode(encoded).expect("valid base64");
            assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        }
        assert!(saved.iter().all(|p| !p.exists()));
    }

    #[test]
    fn base64_delivery_failure_removes_remaining_crops() {
        let dir = tempfile::tempdir().expect("tempdir");
        let now = Local::now();
        let saved = vec![
            save_crop(&page(), dir.path(), 0, &now, 90).expect("save"),
            save_crop(&page(), dir.path(), 1, &now, 90).expect("save"),
            save_crop(&page(), dir.path(), 2, &now, 90).expect("save"),
        ];
        std::fs::write(&saved[1], b"not a jpeg").expect("corrupt crop");

        assert!(deliver(saved.clone(), ResponseFormat::Base64, 80).is_err());
        assert!(saved.iter().all(|p| !p.exists()));
    }

    #[test]
    fn file_delivery_keeps_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let saved = vec![save_crop(&page(), dir.path(), 0, &Local::now(), 90).expect("save")];
        let outputs = deliver(saved.clone(), ResponseFormat::ImageFilePath, 80).expect("deliver");
        assert_eq!(outputs, vec![ScanOutput::File(saved[0].clone())]);
        assert!(saved[0].exists());
    }

    #[test]
    fn failed_outcome_keeps_boundary_message() {
        assert_eq!(
            SessionOutcome::failed(&DocScanError::NoCorners),
            SessionOutcome::Failed("unable to get document corners".into())
        );
    }
}
