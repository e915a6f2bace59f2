//! Rectangles in tile units

use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle measured in tiles
///
/// For layers, `x`/`y` is the layer offset within the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A rectangle anchored at the origin
    pub fn sized(width: i32, height: i32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Whether the tile coordinate lies inside this rectangle
    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && y >= self.y && x < self.x + self.width && y < self.y + self.height
    }

    /// Number of cells covered, zero for degenerate rectangles
    pub fn area(&self) -> usize {
        (self.width.max(0) as usize) * (self.height.max(0) as usize)
    }

    /// The overlapping part of two rectangles, if any
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = (self.x + self.width).min(other.x + other.width);
        let y1 = (self.y + self.height).min(other.y + other.height);
        if x1 > x0 && y1 > y0 {
            Some(Rect::new(x0, y0, x1 - x0, y1 - y0))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains() {
        let r = Rect::new(2, 3, 4, 5);
        assert!(r.contains(2, 3));
        assert!(r.contains(5, 7));
        assert!(!r.contains(6, 7));
        assert!(!r.contains(1, 3));
    }

    #[test]
    fn test_intersection() {
        let a = Rect::sized(10, 10);
        let b = Rect::new(8, -2, 5, 5);
        assert_eq!(a.intersection(&b), Some(Rect::new(8, 0, 2, 3)));
        assert_eq!(a.intersection(&Rect::new(10, 0, 2, 2)), None);
        assert_eq!(Rect::sized(-1, 4).area(), 0);
    }
}
