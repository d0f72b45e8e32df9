//! Pointer gesture tracking: one down → up interaction at a time.

use da_core::Point;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Gesture {
    pub is_down: bool,
    pub down: Point,
    /// Release position; `None` while the pointer is held.
    pub up: Option<Point>,
    /// Per-axis absolute distance between down and up; `None` while held.
    pub movement: Option<(f64, f64)>,
}

impl Gesture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a gesture, forgetting the previous one.
    pub fn press(&mut self, point: Point) {
        self.is_down = true;
        self.down = point;
        self.up = None;
        self.movement = None;
    }

    pub fn release(&mut self, point: Point) {
        self.is_down = false;
        self.up = Some(point);
        self.movement = Some(((self.down.x - point.x).abs(), (self.down.y - point.y).abs()));
    }

    /// Release point, or the press point while the pointer is still down.
    pub fn end(&self) -> Point {
        self.up.unwrap_or(self.down)
    }

    /// Movement, zero while the pointer is still down.
    pub fn extent(&self) -> (f64, f64) {
        self.movement.unwrap_or((0.0, 0.0))
    }

    /// Per-axis minimum of the down and up points.
    pub fn top_left(&self) -> Point {
        let end = self.end();
        Point::new(self.down.x.min(end.x), self.down.y.min(end.y))
    }

    pub fn midpoint(&self) -> Point {
        self.down.midpoint(self.end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_measures_absolute_movement() {
        let mut g = Gesture::new();
        g.press(Point::new(60.0, 10.0));
        assert!(g.is_down);
        assert_eq!(g.movement, None);

        g.release(Point::new(10.0, 40.0));
        assert!(!g.is_down);
        assert_eq!(g.movement, Some((50.0, 30.0)));
        assert_eq!(g.top_left(), Point::new(10.0, 10.0));
        assert_eq!(g.midpoint(), Point::new(35.0, 25.0));
    }

    #[test]
    fn press_clears_previous_release() {
        let mut g = Gesture::new();
        g.press(Point::new(0.0, 0.0));
        g.release(Point::new(5.0, 5.0));
        g.press(Point::new(1.0, 1.0));
        assert_eq!(g.up, None);
        assert_eq!(g.movement, None);
        assert_eq!(g.extent(), (0.0, 0.0));
        assert_eq!(g.midpoint(), Point::new(1.0, 1.0));
    }
}
