#![forbid(unsafe_code)]

//! Viewport-relative geometry as reported by the host layout engine.

/// A rectangle in CSS pixels, relative to the viewport's top-left corner.
///
/// Mirrors what a bounding-rect query returns: `y` is the top edge and may be
/// negative once the element has scrolled above the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle.
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Top edge.
    #[inline]
    pub const fn top(&self) -> f64 {
        self.y
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Whether the horizontal line at `y` crosses this rectangle.
    ///
    /// The top edge is inclusive and the bottom edge exclusive, so two
    /// rectangles stacked edge to edge never both straddle the same line.
    #[inline]
    pub fn straddles(&self, y: f64) -> bool {
        self.top() <= y && self.bottom() > y
    }

    /// Return a copy shifted by `(dx, dy)`.
    #[must_use]
    pub fn translate(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }
}

/// Window scroll metrics used by the bottom-of-page check.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewportMetrics {
    /// Vertical scroll offset of the window.
    pub scroll_y: f64,
    /// Height of the window's layout viewport.
    pub inner_height: f64,
    /// Full scrollable height of the document element.
    pub scroll_height: f64,
}

impl ViewportMetrics {
    /// Whether the viewport's bottom edge has reached the scrollable bottom,
    /// within `tolerance` pixels.
    pub fn at_bottom(&self, tolerance: f64) -> bool {
        self.inner_height + self.scroll_y >= self.scroll_height - tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn straddle_is_half_open() {
        let r = Rect::new(0.0, 100.0, 10.0, 50.0);
        assert!(r.straddles(100.0));
        assert!(r.straddles(149.5));
        assert!(!r.straddles(150.0));
        assert!(!r.straddles(99.9));
    }

    #[test]
    fn stacked_rects_never_share_a_line() {
        let a = Rect::new(0.0, 0.0, 10.0, 100.0);
        let b = Rect::new(0.0, 100.0, 10.0, 100.0);
        for y in [0.0, 50.0, 99.0, 100.0, 150.0] {
            assert!(!(a.straddles(y) && b.straddles(y)), "both straddle {y}");
        }
    }

    #[test]
    fn translate_keeps_size() {
        let r = Rect::new(1.0, 2.0, 3.0, 4.0).translate(0.0, -2.0);
        assert_eq!(r, Rect::new(1.0, 0.0, 3.0, 4.0));
    }

    #[test]
    fn bottom_check_uses_tolerance() {
        let m = ViewportMetrics {
            scroll_y: 1198.0,
            inner_height: 800.0,
            scroll_height: 2000.0,
        };
        assert!(m.at_bottom(2.0));
        assert!(!m.at_bottom(1.0));
    }
}
