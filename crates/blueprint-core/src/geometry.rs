//! Geometric primitives for diagram positioning.
//!
//! This module provides the types used throughout Blueprint for item
//! placement: [`Point`], [`Size`], and [`Bounds`], plus grid snapping.
//!
//! # Coordinate System
//!
//! Blueprint uses a screen-style coordinate system:
//!
//! ```text
//!   (0,0) ────────► +X
//!     │
//!     │
//!     ▼
//!    +Y
//! ```
//!
//! - **Origin**: Top-left corner at `(0, 0)`
//! - **X-axis**: Increases rightward
//! - **Y-axis**: Increases downward
//!
//! Item positions are the top-left corner of the item in the owning stack's
//! local frame; stacks carry a translation-only transform to the scene frame.

use serde::{Deserialize, Serialize};

/// A 2D point in diagram coordinate space.
///
/// Used both for positions (top-left corners in a stack's local frame, or
/// scene coordinates) and for direction vectors on endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    /// Creates a new point with the specified coordinates.
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Vector addition.
    pub fn add(self, other: Point) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    /// Vector subtraction.
    pub fn sub(self, other: Point) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }

    /// Multiplies both coordinates by the given factor.
    pub fn scale(self, factor: f32) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(self, other: Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Snaps both coordinates to the nearest multiple of `grid`.
    pub fn snapped(self, grid: f32) -> Self {
        Self {
            x: (self.x / grid).round() * grid,
            y: (self.y / grid).round() * grid,
        }
    }
}

/// Width and height of a diagram item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// An axis-aligned rectangle defined by a top-left corner and a size.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

impl Bounds {
    /// Creates bounds from a top-left point and a size.
    pub fn new(top_left: Point, size: Size) -> Self {
        Self {
            min_x: top_left.x,
            min_y: top_left.y,
            max_x: top_left.x + size.width,
            max_y: top_left.y + size.height,
        }
    }

    pub fn min_x(self) -> f32 {
        self.min_x
    }

    pub fn min_y(self) -> f32 {
        self.min_y
    }

    pub fn max_x(self) -> f32 {
        self.max_x
    }

    pub fn max_y(self) -> f32 {
        self.max_y
    }

    pub fn width(self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(self) -> f32 {
        self.max_y - self.min_y
    }

    /// Returns true if the point lies inside the bounds (inclusive edges).
    pub fn contains(self, p: Point) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    /// Returns the rectangle common to both bounds, or `None` when they do
    /// not intersect.
    pub fn intersection(self, other: Bounds) -> Option<Bounds> {
        let min_x = self.min_x.max(other.min_x);
        let min_y = self.min_y.max(other.min_y);
        let max_x = self.max_x.min(other.max_x);
        let max_y = self.max_y.min(other.max_y);

        if min_x < max_x && min_y < max_y {
            Some(Bounds {
                min_x,
                min_y,
                max_x,
                max_y,
            })
        } else {
            None
        }
    }

}

/// Shortest distance from point `p` to the segment `a`-`b`.
///
/// Used for hit-testing connection routes.
pub fn segment_distance(p: Point, a: Point, b: Point) -> f32 {
    let ab = b.sub(a);
    let len_sq = ab.x * ab.x + ab.y * ab.y;

    if len_sq == 0.0 {
        return p.distance_to(a);
    }

    let t = (((p.x - a.x) * ab.x + (p.y - a.y) * ab.y) / len_sq).clamp(0.0, 1.0);
    p.distance_to(Point::new(a.x + t * ab.x, a.y + t * ab.y))
}


#[cfg(test)]
mod proptest_tests {
    use float_cmp::approx_eq;
    use proptest::prelude::*;

    use super::*;

    fn point_strategy() -> impl Strategy<Value = Point> {
        (-1000.0f32..1000.0, -1000.0f32..1000.0).prop_map(|(x, y)| Point::new(x, y))
    }

    proptest! {
        /// Snapping is idempotent: snapping an already snapped point is a no-op.
        #[test]
        fn snapped_is_idempotent(p in point_strategy()) {
            let once = p.snapped(10.0);
            let twice = once.snapped(10.0);
            prop_assert_eq!(once, twice);
        }

        /// A snapped coordinate never moves more than half a grid step.
        #[test]
        fn snapped_moves_at_most_half_grid(p in point_strategy()) {
            let s = p.snapped(10.0);
            prop_assert!((s.x - p.x).abs() <= 5.0 + f32::EPSILON);
            prop_assert!((s.y - p.y).abs() <= 5.0 + f32::EPSILON);
        }

        /// Add and sub are inverses.
        #[test]
        fn add_sub_roundtrip(p1 in point_strategy(), p2 in point_strategy()) {
            let back = p1.add(p2).sub(p2);
            prop_assert!(approx_eq!(f32, back.x, p1.x, epsilon = 0.001));
            prop_assert!(approx_eq!(f32, back.y, p1.y, epsilon = 0.001));
        }

        /// Distance is symmetric.
        #[test]
        fn distance_is_symmetric(p1 in point_strategy(), p2 in point_strategy()) {
            prop_assert!(approx_eq!(
                f32,
                p1.distance_to(p2),
                p2.distance_to(p1),
                epsilon = 0.001
            ));
        }
    }
}
