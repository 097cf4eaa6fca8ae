// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the per-photo pipeline: corner detection on a
// synthetic page and the crop + filter pass that follows it.

use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use docscan_bridge::HoughVision;
use docscan_core::{ColorFilter, Point, Quad};
use docscan_document::{CornerAnalyzer, CornerDetector, CropFinalizer, DetectParams, Document};
use image::{DynamicImage, Rgb, RgbImage};

/// 600x800 dark frame with a bright page from (80, 100) to (520, 700).
fn synthetic_page() -> DynamicImage {
    let mut img = RgbImage::from_pixel(600, 800, Rgb([30, 30, 30]));
    for y in 100..700 {
        for x in 80..520 {
            img.put_pixel(x, y, Rgb([235, 235, 230]));
        }
    }
    DynamicImage::ImageRgb8(img)
}

fn bench_detect_corners(c: &mut Criterion) {
    let photo = synthetic_page();
    let detector = CornerDetector::new(Arc::new(HoughVision));
    let params = DetectParams::default();

    c.bench_function("detect_corners (600x800)", |b| {
        b.iter(|| black_box(detector.detect_corners(black_box(&photo), &params)));
    });
}

fn bench_crop_with_filter(c: &mut Criterion) {
    let photo = synthetic_page();
    let finalizer = CropFinalizer::new(Arc::new(HoughVision));
    let document = Document::new("bench.jpg", None).with_quad(Quad {
        top_left: Point::new(80.0, 100.0),
        top_right: Point::new(520.0, 100.0),
        bottom_right: Point::new(520.0, 700.0),
        bottom_left: Point::new(80.0, 700.0),
    });

    c.bench_function("crop_loaded + black_and_white (440x600)", |b| {
        b.iter(|| {
            let out = finalizer.crop_loaded(&document, black_box(&photo), Some(&ColorFilter::BLACK_AND_WHITE));
            black_box(out.ok());
        });
    });
}

criterion_group!(benches, bench_detect_corners, bench_crop_with_filter);
criterion_main!(benches);
