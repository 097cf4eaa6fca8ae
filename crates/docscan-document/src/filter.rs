// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Colour filters applied to finished crops.
//
// A `ColorFilter` is a small colour matrix: saturation mixes each channel
// toward Rec. 709 luminance, contrast scales around mid-grey, and brightness
// is a final gain. Alpha is untouched.

use docscan_core::ColorFilter;
use image::{DynamicImage, ImageBuffer, Rgba};
use tracing::{debug, instrument};

const LUMA_R: f32 = 0.2126;
const LUMA_G: f32 = 0.7152;
const LUMA_B: f32 = 0.0722;

/// Render `filter` over `image` into a new RGBA buffer. The input is left
/// as-is.
#[instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub fn apply_color_filter(image: &DynamicImage, filter: &ColorFilter) -> DynamicImage {
    if filter.is_identity() {
        debug!("identity filter, copying");
        return image.clone();
    }

    let rgba = image.to_rgba8();
    let ColorFilter {
        saturation,
        contrast,
        brightness,
    } = *filter;

    let filtered = ImageBuffer::from_fn(rgba.width(), rgba.height(), |x, y| {
        let Rgba([r, g, b, a]) = *rgba.get_pixel(x, y);
        let (r, g, b) = (r as f32, g as f32, b as f32);
        let luma = LUMA_R * r + LUMA_G * g + LUMA_B * b;

        let adjust = |channel: f32| -> u8 {
            let saturated = luma + saturation * (channel - luma);
            let contrasted = contrast * (saturated - 128.0) + 128.0;
            (contrasted * brightness).clamp(0.0, 255.0) as u8
        };
        Rgba([adjust(r), adjust(g), adjust(b), a])
    });

    DynamicImage::ImageRgba8(filtered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn colourful() -> DynamicImage {
        let mut img = RgbImage::new(4, 1);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        img.put_pixel(1, 0, Rgb([0, 255, 0]));
        img.put_pixel(2, 0, Rgb([10, 120, 240]));
        img.put_pixel(3, 0, Rgb([200, 200, 200]));
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn grayscale_has_equal_channels() {
        let out = apply_color_filter(&colourful(), &ColorFilter::GRAYSCALE).to_rgba8();
        for pixel in out.pixels() {
            let Rgba([r, g, b, _]) = *pixel;
            assert_eq!(r, g);
            assert_eq!(g, b);
        }
    }

    #[test]
    fn black_and_white_is_gray_and_darker() {
        let src = DynamicImage::ImageRgb8(RgbImage::from_pixel(1, 1, Rgb([100, 100, 100])));
        let out = apply_color_filter(&src, &ColorFilter::BLACK_AND_WHITE).to_rgba8();
        let Rgba([r, g, b, _]) = *out.get_pixel(0, 0);
        assert_eq!((r, g), (g, b));
        // 1.4 * (100 - 128) + 128 = 88.8, then * 0.65.
        assert_eq!(r, 57);
    }

    #[test]
    fn high_contrast_pushes_away_from_mid_grey() {
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(0, 0, Rgb([200, 200, 200]));
        img.put_pixel(1, 0, Rgb([60, 60, 60]));
        let out = apply_color_filter(&DynamicImage::ImageRgb8(img), &ColorFilter::HIGH_CONTRAST)
            .to_rgba8();
        assert_eq!(out.get_pixel(0, 0).0[0], 255);
        assert_eq!(out.get_pixel(1, 0).0[0], 0);
    }

    #[test]
    fn input_is_not_modified() {
        let src = colourful();
        let before = src.to_rgb8().into_raw();
        let _ = apply_color_filter(&src, &ColorFilter::HIGH_CONTRAST);
        assert_eq!(src.to_rgb8().into_raw(), before);
    }

    #[test]
    fn identity_filter_keeps_pixels() {
        let src = colourful();
        let out = apply_color_filter(&src, &ColorFilter::default());
        assert_eq!(out.to_rgb8().into_raw(), src.to_rgb8().into_raw());
    }
}
