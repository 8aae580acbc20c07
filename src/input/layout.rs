//! Button layout
//!
//! Screen rectangles of the virtual buttons, used to hit-test pointer
//! and touch coordinates.

use super::binder::ElementId;

/// Axis-aligned rectangle in screen pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// From a config `[x, y, w, h]` array. Empty rects are rejected.
    pub fn from_array(rect: [f64; 4]) -> Option<Self> {
        let [x, y, w, h] = rect;
        if w > 0.0 && h > 0.0 && rect.iter().all(|v| v.is_finite()) {
            Some(Self::new(x, y, w, h))
        } else {
            None
        }
    }

    /// Half-open containment: right and bottom edges are outside
    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px < self.x + self.w && py >= self.y && py < self.y + self.h
    }
}

#[derive(Debug, Default)]
pub struct ButtonLayout {
    areas: Vec<(ElementId, Rect)>,
}

impl ButtonLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn place(&mut self, id: ElementId, rect: Rect) {
        self.areas.push((id, rect));
    }

    #[cfg(test)]
    pub fn rect(&self, id: ElementId) -> Option<Rect> {
        self.areas.iter().find(|(i, _)| *i == id).map(|(_, r)| *r)
    }

    /// Topmost element under a point (later placements are on top)
    pub fn hit(&self, x: f64, y: f64) -> Option<ElementId> {
        self.areas
            .iter()
            .rev()
            .find(|(_, rect)| rect.contains(x, y))
            .map(|(id, _)| *id)
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_edges() {
        let r = Rect::new(10.0, 10.0, 20.0, 20.0);
        assert!(r.contains(10.0, 10.0));
        assert!(r.contains(29.9, 29.9));
        assert!(!r.contains(30.0, 15.0));
        assert!(!r.contains(15.0, 9.9));
    }

    #[test]
    fn test_from_array_rejects_empty() {
        assert!(Rect::from_array([0.0, 0.0, 0.0, 10.0]).is_none());
        assert!(Rect::from_array([0.0, 0.0, 10.0, -1.0]).is_none());
        assert!(Rect::from_array([f64::NAN, 0.0, 10.0, 10.0]).is_none());
        assert_eq!(
            Rect::from_array([1.0, 2.0, 3.0, 4.0]),
            Some(Rect::new(1.0, 2.0, 3.0, 4.0))
        );
    }

    #[test]
    fn test_hit_prefers_topmost() {
        let mut layout = ButtonLayout::new();
        layout.place(0, Rect::new(0.0, 0.0, 100.0, 100.0));
        layout.place(1, Rect::new(50.0, 50.0, 10.0, 10.0));
        assert_eq!(layout.hit(55.0, 55.0), Some(1));
        assert_eq!(layout.hit(5.0, 5.0), Some(0));
        assert_eq!(layout.hit(500.0, 5.0), None);
        assert_eq!(layout.rect(1), Some(Rect::new(50.0, 50.0, 10.0, 10.0)));
    }
}
