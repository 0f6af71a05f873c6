//! Axis-aligned rectangles in world pixel space.
//!
//! The right/bottom edges are inclusive (`right = left + width - 1`), matching
//! the convention every intersection test in the engine is written against.

/// An axis-aligned rectangle with inclusive right/bottom edges.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }

    /// Inclusive right edge.
    pub fn right(&self) -> f64 {
        self.left + self.width - 1.0
    }

    /// Inclusive bottom edge.
    pub fn bottom(&self) -> f64 {
        self.top + self.height - 1.0
    }

    /// A new rectangle scaled around the origin.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            left: self.left * factor,
            top: self.top * factor,
            width: self.width * factor,
            height: self.height * factor,
        }
    }

    /// A new rectangle translated by (dx, dy).
    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self {
            left: self.left + dx,
            top: self.top + dy,
            width: self.width,
            height: self.height,
        }
    }

    /// Whether two rectangles overlap (inclusive edges).
    pub fn intersects(&self, other: &Rect) -> bool {
        !(other.left > self.right()
            || other.right() < self.left
            || other.top > self.bottom()
            || other.bottom() < self.top)
    }

    /// The smallest rectangle covering both `self` and `other`.
    pub fn union(&self, other: &Rect) -> Self {
        let left = self.left.min(other.left);
        let top = self.top.min(other.top);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Self {
            left,
            top,
            width: right - left + 1.0,
            height: bottom - top + 1.0,
        }
    }
}

/// The bounding box of a non-empty slice of rectangles.
pub fn bounding_box(rects: &[Rect]) -> Rect {
    let mut result = rects[0];
    for r in &rects[1..] {
        result = result.union(r);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edges_are_inclusive() {
        let r = Rect::new(0.0, 0.0, 10.0, 5.0);
        assert_eq!(r.right(), 9.0);
        assert_eq!(r.bottom(), 4.0);
    }

    #[test]
    fn test_intersection() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(9.0, 9.0, 10.0, 10.0);
        let c = Rect::new(10.0, 0.0, 5.0, 5.0);

        // b touches a at the shared inclusive corner
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));

        // c starts one pixel past a's right edge
        assert!(!a.intersects(&c));
        assert!(!c.intersects(&a));
    }

    #[test]
    fn test_scale_translate_roundtrip() {
        let r = Rect::new(4.0, -6.0, 20.0, 12.0);
        let back = r.scaled(2.0).scaled(0.5).translated(3.0, 3.0).translated(-3.0, -3.0);
        assert_eq!(back, r);
    }

    #[test]
    fn test_bounding_box() {
        let rects = [
            Rect::new(0.0, 0.0, 4.0, 4.0),
            Rect::new(-5.0, 2.0, 4.0, 4.0),
            Rect::new(3.0, -3.0, 4.0, 10.0),
        ];
        let bb = bounding_box(&rects);
        assert_eq!(bb.left, -5.0);
        assert_eq!(bb.top, -3.0);
        assert_eq!(bb.right(), 6.0);
        assert_eq!(bb.bottom(), 6.0);
    }
}
