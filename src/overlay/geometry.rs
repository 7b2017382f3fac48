use serde::{Deserialize, Serialize};

/// Bounding box of the overlay surface in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Boundary points count as inside.
    pub fn contains(&self, point: Point) -> bool {
        !(point.x < self.left
            || point.x > self.right
            || point.y < self.top
            || point.y > self.bottom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickVerdict {
    Inside,
    Outside,
    /// The surface had no layout yet; treated as "stay open".
    NoGeometry,
}

impl ClickVerdict {
    pub fn dismisses(self) -> bool {
        matches!(self, ClickVerdict::Outside)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OutsideClickDetector;

impl OutsideClickDetector {
    pub fn classify(&self, bounds: Option<Rect>, pointer: Point) -> ClickVerdict {
        match bounds {
            None => ClickVerdict::NoGeometry,
            Some(rect) if rect.contains(pointer) => ClickVerdict::Inside,
            Some(_) => ClickVerdict::Outside,
        }
    }

    pub fn should_dismiss(&self, bounds: Option<Rect>, pointer: Point) -> bool {
        self.classify(bounds, pointer).dismisses()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> Option<Rect> {
        Some(Rect::new(10.0, 10.0, 100.0, 100.0))
    }

    #[test]
    fn interior_click_keeps_overlay_open() {
        let detector = OutsideClickDetector;
        assert!(!detector.should_dismiss(bounds(), Point::new(50.0, 50.0)));
    }

    #[test]
    fn clicks_past_each_edge_dismiss() {
        let detector = OutsideClickDetector;
        for (x, y) in [(5.0, 50.0), (150.0, 50.0), (50.0, 5.0), (50.0, 150.0)] {
            assert!(
                detector.should_dismiss(bounds(), Point::new(x, y)),
                "({x}, {y}) should dismiss"
            );
        }
    }

    #[test]
    fn boundary_clicks_never_dismiss() {
        let detector = OutsideClickDetector;
        for (x, y) in [(10.0, 50.0), (100.0, 50.0), (50.0, 10.0), (50.0, 100.0), (10.0, 10.0)] {
            assert_eq!(
                detector.classify(bounds(), Point::new(x, y)),
                ClickVerdict::Inside
            );
        }
    }

    #[test]
    fn missing_geometry_fails_safe() {
        let detector = OutsideClickDetector;
        assert_eq!(
            detector.classify(None, Point::new(-500.0, -500.0)),
            ClickVerdict::NoGeometry
        );
        assert!(!detector.should_dismiss(None, Point::new(-500.0, -500.0)));
    }
}
