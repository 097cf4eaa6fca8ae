// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan session configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{DocScanError, Result};
use crate::types::{FlashMode, ResponseFormat};

/// Options for one scan session. Every field is optional in serialized form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScanConfig {
    /// Let the user drag detected corners before cropping. When false the
    /// session runs hands-free: the first detected quad is accepted.
    pub let_user_adjust_crop: bool,
    /// Maximum number of documents in one session.
    pub max_num_documents: usize,
    /// Maximum number of documents cropped out of a single photo.
    pub max_num_simultaneous_documents: usize,
    /// JPEG quality (1-100) of the saved crops.
    pub cropped_image_quality: u8,
    pub flash_mode: FlashMode,
    pub auto_focus: bool,
    pub show_color_filters: bool,
    /// Height the detector shrinks frames to before searching for corners.
    pub shrunk_analysis_height: u32,
    pub response_format: ResponseFormat,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            let_user_adjust_crop: true,
            max_num_documents: 90,
            max_num_simultaneous_documents: 1,
            cropped_image_quality: 100,
            flash_mode: FlashMode::Off,
            auto_focus: true,
            show_color_filters: true,
            shrunk_analysis_height: 500,
            response_format: ResponseFormat::Base64,
        }
    }
}

impl ScanConfig {
    /// Whether the session accepts detections without user adjustment.
    pub fn hands_free(&self) -> bool {
        !self.let_user_adjust_crop
    }

    /// Document cap actually enforced: a hands-free session stops after one.
    pub fn effective_max_documents(&self) -> usize {
        if self.hands_free() {
            1
        } else {
            self.max_num_documents
        }
    }

    /// Reject values the session cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.max_num_documents == 0 {
            return Err(DocScanError::InvalidConfig(
                "maxNumDocuments must be at least 1".into(),
            ));
        }
        if self.max_num_simultaneous_documents == 0 {
            return Err(DocScanError::InvalidConfig(
                "maxNumSimultaneousDocuments must be at least 1".into(),
            ));
        }
        if !(1..=100).contains(&self.cropped_image_quality) {
            return Err(DocScanError::InvalidConfig(format!(
                "croppedImageQuality must be within 1-100, got {}",
                self.cropped_image_quality
            )));
        }
        if self.shrunk_analysis_height == 0 {
            return Err(DocScanError::InvalidConfig(
                "shrunkAnalysisHeight must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Load and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        info!(path = %path.as_ref().display(), "scan config loaded");
        Ok(config)
    }

    /// Write the config as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        debug!(path = %path.as_ref().display(), "scan config saved");
        Ok(())
    }
}
