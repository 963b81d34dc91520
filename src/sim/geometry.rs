//! Axis-aligned rectangles on the logical canvas
//!
//! Every entity has a visual box and a (smaller) hitbox; both are `Rect`s.
//! Y grows downward, matching the 960×540 canvas the renderer draws on.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle stored as its min/max corners
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    /// Rectangle from top-left corner and size
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            min: Vec2::new(x, y),
            max: Vec2::new(x + width, y + height),
        }
    }

    /// Rectangle of `size` centered on `center`
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Shrink by a fraction of each dimension, keeping the center fixed.
    ///
    /// `shrink(0.2)` removes 20% of the width and 20% of the height.
    pub fn shrink(&self, fraction: f32) -> Self {
        Self::from_center(self.center(), self.size() * (1.0 - fraction))
    }

    /// Scale only the width, keeping the center and full height.
    ///
    /// A non-positive result leaves the rectangle untouched.
    pub fn scale_width(&self, scale: f32) -> Self {
        let width = self.width() * scale;
        if width <= 0.0 {
            return *self;
        }
        Self::from_center(self.center(), Vec2::new(width, self.height()))
    }

    /// Closed-interval overlap test: rectangles that merely touch overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touching_edges_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 10.0, 10.0);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));

        // Corner contact counts too
        let c = Rect::new(10.0, 10.0, 5.0, 5.0);
        assert!(a.overlaps(&c));
    }

    #[test]
    fn test_one_unit_apart_does_not_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let right = Rect::new(11.0, 0.0, 10.0, 10.0);
        let below = Rect::new(0.0, 11.0, 10.0, 10.0);
        assert!(!a.overlaps(&right));
        assert!(!a.overlaps(&below));
    }

    #[test]
    fn test_shrink_keeps_center() {
        let r = Rect::new(100.0, 50.0, 100.0, 60.0);
        let s = r.shrink(0.2);
        assert!((s.width() - 80.0).abs() < 1e-4);
        assert!((s.height() - 48.0).abs() < 1e-4);
        assert_eq!(s.center(), r.center());
    }

    #[test]
    fn test_scale_width() {
        let r = Rect::new(0.0, 0.0, 120.0, 200.0);
        let s = r.scale_width(0.01);
        assert!((s.width() - 1.2).abs() < 1e-4);
        assert_eq!(s.height(), 200.0);
        assert_eq!(s.center(), r.center());

        // Degenerate scale falls back to the full box
        assert_eq!(r.scale_width(0.0), r);
    }
}
