// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the document scanner.

use serde::{Deserialize, Serialize};

/// Camera flash setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FlashMode {
    #[default]
    Off,
    On,
    Auto,
    /// Continuous light while previewing.
    Torch,
}

impl FlashMode {
    /// The mode the flash button switches to next: Auto → On → Torch → Off → Auto.
    pub fn next(self) -> Self {
        match self {
            Self::Auto => Self::On,
            Self::On => Self::Torch,
            Self::Torch => Self::Off,
            Self::Off => Self::Auto,
        }
    }
}

/// How finished crops are handed back to the embedding application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResponseFormat {
    /// JPEG bytes, base64-encoded. The crop file is deleted afterwards.
    #[default]
    Base64,
    /// Path of the saved JPEG crop.
    ImageFilePath,
}

/// Colour matrix applied as a render pass over a finished crop.
///
/// Each component is a multiplier where `1.0` is neutral:
/// `saturation` mixes toward Rec. 709 luminance, `contrast` stretches around
/// mid-grey, `brightness` scales the final value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorFilter {
    pub saturation: f32,
    pub contrast: f32,
    pub brightness: f32,
}

impl ColorFilter {
    pub const GRAYSCALE: Self = Self {
        saturation: 0.0,
        contrast: 1.0,
        brightness: 1.0,
    };

    /// Washed-out black and white, suited to printed text.
    pub const BLACK_AND_WHITE: Self = Self {
        saturation: 0.0,
        contrast: 1.4,
        brightness: 0.65,
    };

    pub const HIGH_CONTRAST: Self = Self {
        saturation: 1.0,
        contrast: 2.0,
        brightness: 1.0,
    };

    /// The filters offered next to the "no filter" choice, in button order.
    pub const PRESETS: [Self; 3] = [Self::GRAYSCALE, Self::BLACK_AND_WHITE, Self::HIGH_CONTRAST];

    /// Whether applying this filter would leave every pixel unchanged.
    pub fn is_identity(&self) -> bool {
        self.saturation == 1.0 && self.contrast == 1.0 && self.brightness == 1.0
    }
}

impl Default for ColorFilter {
    fn default() -> Self {
        Self {
            saturation: 1.0,
            contrast: 1.0,
            brightness: 1.0,
        }
    }
}

/// On-screen areas the session maps quads into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewLayout {
    /// Width of the photo container (and max decode width of previews).
    pub screen_width: u32,
    pub screen_height: u32,
    /// Height taken by the filter bar / buttons below the adjustable photo.
    pub controls_height: u32,
    /// Height of the live overlay drawn on top of the camera preview.
    pub overlay_height: u32,
}

impl Default for ViewLayout {
    fn default() -> Self {
        Self {
            screen_width: 1080,
            screen_height: 1920,
            controls_height: 0,
            overlay_height: 1920,
        }
    }
}
