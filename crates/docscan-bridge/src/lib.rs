// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docscan: Native capability bridge.
//
// The scanner core never calls platform code directly. Corner detection,
// perspective warping and camera control are reached through the traits in
// `traits`; an on-device host application implements `PlatformBridge` over
// its native vision library and camera stack, while desktop and CI builds
// use the pure-Rust `software` bridge.

use std::sync::OnceLock;

pub mod software;
pub mod traits;

pub use software::{HoughVision, SoftwareBridge};
pub use traits::{CameraEvent, NativeCamera, PlatformBridge, VisionPrimitives};

static INITIALISED: OnceLock<()> = OnceLock::new();

/// One-time process-wide initialisation of the bridge layer.
///
/// Safe to call from every session start; only the first call does work.
/// Returns `true` for that first call.
pub fn init() -> bool {
    let mut first = false;
    INITIALISED.get_or_init(|| {
        first = true;
        tracing::info!(platform = std::env::consts::OS, "docscan bridge initialised");
    });
    first
}

/// Bridge for builds without a host-provided native implementation.
pub fn platform_bridge() -> Box<dyn PlatformBridge> {
    init();
    Box::new(SoftwareBridge::default())
}
