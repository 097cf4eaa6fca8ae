// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the person holding the camera.
//
// Every technical error is mapped to plain English with a clear suggestion.
// The severity drives how the embedding UI presents it.

use crate::error::DocScanError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Retrying usually works (lighting, a shaky hand).
    Transient,
    /// User must do something (free storage, grant access, retake).
    ActionRequired,
    /// Retrying cannot help, e.g. bad configuration.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether retrying the same step can succeed.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert a `DocScanError` into a `HumanError`.
pub fn humanize_error(err: &DocScanError) -> HumanError {
    match err {
        // -- Geometry / detection --
        DocScanError::InvalidQuad { .. } | DocScanError::NoCorners | DocScanError::Detection(_) => {
            HumanError {
                message: "We couldn't find the document's edges.".into(),
                suggestion: "Place the document on a contrasting surface, make sure all four corners are visible, and try again.".into(),
                retriable: true,
                severity: Severity::Transient,
            }
        }

        DocScanError::InvalidDimensions(_) => HumanError {
            message: "The photo has an unexpected size.".into(),
            suggestion: "Retake the photo.".into(),
            retriable: true,
            severity: Severity::ActionRequired,
        },

        // -- Cropping --
        DocScanError::MissingQuad => HumanError {
            message: "No document area was selected.".into(),
            suggestion: "Drag the corners onto the document, then tap done.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        DocScanError::CropFailed(_) | DocScanError::ImageError(_) => HumanError {
            message: "We couldn't straighten this page.".into(),
            suggestion: "Retake the photo, keeping the whole page in view.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        DocScanError::SaveFailed(_) => HumanError {
            message: "The scanned page couldn't be saved.".into(),
            suggestion: "Free up some storage space and scan again.".into(),
            retriable: true,
            severity: Severity::ActionRequired,
        },

        // -- Session --
        DocScanError::InvalidConfig(detail) => HumanError {
            message: "The scanner was started with invalid options.".into(),
            suggestion: format!("Fix the scanner options and start again. ({detail})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        DocScanError::DocumentLimit { max } => HumanError {
            message: "You've reached the page limit.".into(),
            suggestion: format!("A single scan can hold up to {max} pages. Finish this scan and start a new one."),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        DocScanError::CaptureInFlight => HumanError {
            message: "A photo is already being taken.".into(),
            suggestion: "Hold still for a moment.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        DocScanError::SessionClosed => HumanError {
            message: "This scan has already finished.".into(),
            suggestion: "Start a new scan.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        DocScanError::NoPendingCapture => HumanError {
            message: "There is no photo to adjust.".into(),
            suggestion: "Take a photo first.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        // -- Storage --
        DocScanError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The photo file couldn't be found.".into(),
                    suggestion: "It may have been cleaned up by the system. Retake the photo.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "The app doesn't have permission to save the scan.".into(),
                    suggestion: "Check the app's storage permission, then try again.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, your device's storage may be full.".into(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        DocScanError::Serialization(_) => HumanError {
            message: "The scanner settings couldn't be read.".into(),
            suggestion: "Check the settings file, or delete it to use the defaults.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        // -- Platform --
        DocScanError::Bridge(_) => HumanError {
            message: "The camera didn't work.".into(),
            suggestion: "Close other apps that may be using the camera and try again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        DocScanError::PlatformUnavailable => HumanError {
            message: "This feature isn't available on your device.".into(),
            suggestion: "Scanning needs a device with a camera.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },
    }
}
