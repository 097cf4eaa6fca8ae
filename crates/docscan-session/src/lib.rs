// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docscan-session: One scan session from camera start to delivered pages.
//
// `ScanSession` holds the state (documents, the photo on screen, the live
// trigger) and `SessionDriver` is the single task that feeds it camera and
// user events, running detection off the event loop.

pub mod driver;
pub mod output;
pub mod session;
pub mod trigger;

pub use driver::{SessionChannels, SessionDriver, SessionEvent, SessionUpdate, UserAction};
pub use output::{ScanOutput, SessionOutcome};
pub use session::{FinishJob, LiveFrameOutcome, PhotoOutcome, ScanSession, SessionId, SessionMode};
pub use trigger::{LiveCaptureTrigger, TriggerDecision};
