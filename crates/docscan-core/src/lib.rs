// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docscan: Core types, quad geometry, coordinate mapping and error
// definitions shared across all crates.

pub mod config;
pub mod error;
pub mod geometry;
pub mod human_errors;
pub mod mapping;
pub mod types;

pub use config::ScanConfig;
pub use error::DocScanError;
pub use geometry::{CropSize, Point, Quad, Rect};
pub use types::*;
