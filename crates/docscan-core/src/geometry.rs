// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Point and quadrilateral geometry: canonical corner ordering, side lengths,
// crop dimensions and scaling.
//
// None of these types record which coordinate space they live in. Callers
// convert explicitly with `crate::mapping` before handing a quad to another
// stage.

use serde::{Deserialize, Serialize};

use crate::error::{DocScanError, Result};

/// A 2D coordinate in some pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    fn scaled(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

/// Axis-aligned rectangle, used for preview bounds inside a view.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Rectangle anchored at the origin with the given size.
    pub fn from_size(width: u32, height: u32) -> Self {
        Self::new(0.0, 0.0, width as f64, height as f64)
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Shrink by `margin` on every side. No clamping: a margin larger than
    /// half a side yields an inverted rectangle.
    pub fn inset(&self, margin: f64) -> Self {
        Self::new(
            self.left + margin,
            self.top + margin,
            self.width - 2.0 * margin,
            self.height - 2.0 * margin,
        )
    }
}

/// Target size of a rectified crop, in output pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropSize {
    pub width: u32,
    pub height: u32,
}

impl CropSize {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Four document corners in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quad {
    pub top_left: Point,
    pub top_right: Point,
    pub bottom_right: Point,
    pub bottom_left: Point,
}

impl Quad {
    /// Order raw detector points as top-left, top-right, bottom-right,
    /// bottom-left.
    ///
    /// Points are sorted by `y`, split into a top and a bottom pair, and each
    /// pair is sorted by `x`. The result does not depend on emission order as
    /// long as the document is tilted by less than ~45°. When more than four
    /// points are supplied, the four smallest-`y` points are used.
    pub fn canonicalize(raw: &[Point]) -> Result<Self> {
        if raw.len() < 4 {
            return Err(DocScanError::InvalidQuad { found: raw.len() });
        }

        let mut by_y: Vec<Point> = raw.to_vec();
        by_y.sort_by(|a, b| a.y.total_cmp(&b.y));

        let mut top = [by_y[0], by_y[1]];
        let mut bottom = [by_y[2], by_y[3]];
        top.sort_by(|a, b| a.x.total_cmp(&b.x));
        bottom.sort_by(|a, b| a.x.total_cmp(&b.x));

        Ok(Self {
            top_left: top[0],
            top_right: top[1],
            bottom_right: bottom[1],
            bottom_left: bottom[0],
        })
    }

    /// Quad covering `rect` exactly.
    pub fn from_rect(rect: Rect) -> Self {
        Self {
            top_left: Point::new(rect.left, rect.top),
            top_right: Point::new(rect.right(), rect.top),
            bottom_right: Point::new(rect.right(), rect.bottom()),
            bottom_left: Point::new(rect.left, rect.bottom()),
        }
    }

    /// Corners in canonical order (TL, TR, BR, BL).
    pub fn corners(&self) -> [Point; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }

    /// Apply `f` to every corner, keeping the corner roles.
    pub fn map_points(&self, f: impl Fn(Point) -> Point) -> Self {
        Self {
            top_left: f(self.top_left),
            top_right: f(self.top_right),
            bottom_right: f(self.bottom_right),
            bottom_left: f(self.bottom_left),
        }
    }

    /// Multiply every coordinate by `factor`.
    pub fn scale(&self, factor: f64) -> Self {
        self.map_points(|p| p.scaled(factor))
    }

    /// Output size for rectifying this quad.
    ///
    /// Opposite sides of a skewed photo rarely match, so each dimension is the
    /// mean of its two sides, truncated toward zero.
    pub fn crop_size(&self) -> CropSize {
        let width = (self.top_left.distance(self.top_right)
            + self.bottom_left.distance(self.bottom_right))
            / 2.0;
        let height = (self.bottom_left.distance(self.top_left)
            + self.bottom_right.distance(self.top_right))
            / 2.0;
        CropSize {
            width: width as u32,
            height: height as u32,
        }
    }

    /// Enclosed area (shoelace formula).
    pub fn area(&self) -> f64 {
        let c = self.corners();
        let mut twice = 0.0;
        for i in 0..c.len() {
            let j = (i + 1) % c.len();
            twice += c[i].x * c[j].y - c[j].x * c[i].y;
        }
        twice.abs() / 2.0
    }
}
