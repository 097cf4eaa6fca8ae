// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for docscan.

use thiserror::Error;

/// Top-level error type for all docscan operations.
#[derive(Debug, Error)]
pub enum DocScanError {
    // -- Geometry --
    #[error("a quadrilateral needs 4 corner points, got {found}")]
    InvalidQuad { found: usize },

    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),

    // -- Detection / cropping --
    #[error("corner detection failed: {0}")]
    Detection(String),

    #[error("unable to get document corners")]
    NoCorners,

    #[error("no quadrilateral chosen for this document")]
    MissingQuad,

    #[error("unable to crop image: {0}")]
    CropFailed(String),

    #[error("unable to save cropped image: {0}")]
    SaveFailed(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Session --
    #[error("invalid scan configuration: {0}")]
    InvalidConfig(String),

    #[error("document limit reached ({max})")]
    DocumentLimit { max: usize },

    #[error("a capture is already in progress")]
    CaptureInFlight,

    #[error("scan session is closed")]
    SessionClosed,

    #[error("no photo is awaiting adjustment")]
    NoPendingCapture,

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -- Platform bridge --
    #[error("platform bridge error: {0}")]
    Bridge(String),

    #[error("feature not available on this platform")]
    PlatformUnavailable,
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocScanError>;
