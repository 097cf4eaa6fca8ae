// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Hands-free capture trigger.
//
// Counts consecutive live frames with a detected document and asks for a
// photo once the document has been held steady long enough. Any miss starts
// the count over.

use tracing::{debug, info};

/// Consecutive detections needed before a photo is taken.
pub const DEFAULT_THRESHOLD: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerDecision {
    Idle,
    FireCapture,
}

#[derive(Debug, Clone)]
pub struct LiveCaptureTrigger {
    counter: u32,
    threshold: u32,
    capture_in_flight: bool,
}

impl Default for LiveCaptureTrigger {
    fn default() -> Self {
        Self::with_threshold(DEFAULT_THRESHOLD)
    }
}

impl LiveCaptureTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threshold(threshold: u32) -> Self {
        Self {
            counter: 0,
            threshold: threshold.max(1),
            capture_in_flight: false,
        }
    }

    /// Feed one analysed frame.
    ///
    /// Frames are not counted outside hands-free mode or while a photo is
    /// being taken.
    pub fn observe(&mut self, detected: bool, hands_free: bool) -> TriggerDecision {
        if !hands_free || self.capture_in_flight {
            return TriggerDecision::Idle;
        }
        if !detected {
            if self.counter > 0 {
                debug!(counter = self.counter, "document lost, resetting count");
            }
            self.counter = 0;
            return TriggerDecision::Idle;
        }

        self.counter += 1;
        if self.counter < self.threshold {
            return TriggerDecision::Idle;
        }

        info!(threshold = self.threshold, "document held steady, capturing");
        self.counter = 0;
        self.capture_in_flight = true;
        TriggerDecision::FireCapture
    }

    /// Record a manually requested capture so live frames stop counting.
    pub fn mark_capture_started(&mut self) {
        self.counter = 0;
        self.capture_in_flight = true;
    }

    /// The pending photo arrived or failed.
    pub fn capture_finished(&mut self) {
        self.capture_in_flight = false;
    }

    pub fn is_capture_in_flight(&self) -> bool {
        self.capture_in_flight
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }
}
