//! Placement geometry and hit testing for canvas objects.
//!
//! `left`/`top` name the object's origin point; the box extends from there
//! according to `origin_x`/`origin_y`. Lines, paths and SVG parts carry
//! their own coordinates, which are shifted so their bounding box lands on
//! the placed box.

use crate::model::{DrawableObject, ObjectKind, OriginX, OriginY, points_bounds};
use kurbo::{BezPath, Circle, Ellipse, Line, ParamCurveNearest, Point, Rect, Shape, Vec2};

/// Minimum distance (canvas units) at which a thin stroke still counts as hit.
const STROKE_TOLERANCE: f64 = 3.0;

/// The object's placed bounding box.
pub fn object_bounds(obj: &DrawableObject) -> Rect {
    let (w, h) = obj.size();
    let x0 = match obj.origin_x {
        OriginX::Left => obj.left,
        OriginX::Center => obj.left - w / 2.0,
        OriginX::Right => obj.left - w,
    };
    let y0 = match obj.origin_y {
        OriginY::Top => obj.top,
        OriginY::Center => obj.top - h / 2.0,
        OriginY::Bottom => obj.top - h,
    };
    Rect::new(x0, y0, x0 + w, y0 + h)
}

/// Offset from an object's own coordinates to canvas coordinates.
/// Zero for kinds that are defined purely by their box.
pub fn placement_offset(obj: &DrawableObject) -> Vec2 {
    let native_origin = match &obj.kind {
        ObjectKind::Line { x1, y1, x2, y2 } => Point::new(x1.min(*x2), y1.min(*y2)),
        ObjectKind::Path { points } => {
            let (min_x, min_y, _, _) = points_bounds(points);
            Point::new(min_x, min_y)
        }
        ObjectKind::Svg { shape } => shape.bounds().origin(),
        _ => return Vec2::ZERO,
    };
    object_bounds(obj).origin() - native_origin
}

/// Whether `point` falls on the object.
pub fn contains(obj: &DrawableObject, point: Point) -> bool {
    let bounds = object_bounds(obj);
    let tolerance = obj
        .stroke_width
        .map_or(STROKE_TOLERANCE, |w| (w / 2.0).max(STROKE_TOLERANCE));
    let offset = placement_offset(obj);

    match &obj.kind {
        ObjectKind::Circle { radius } => Circle::new(bounds.center(), *radius).contains(point),
        ObjectKind::Ellipse { rx, ry } => {
            Ellipse::new(bounds.center(), Vec2::new(*rx, *ry), 0.0).contains(point)
        }
        ObjectKind::Triangle { .. } => {
            let mut path = BezPath::new();
            path.move_to((bounds.center().x, bounds.y0));
            path.line_to((bounds.x1, bounds.y1));
            path.line_to((bounds.x0, bounds.y1));
            path.close_path();
            path.contains(point)
        }
        ObjectKind::Line { x1, y1, x2, y2 } => {
            let line = Line::new(Point::new(*x1, *y1) + offset, Point::new(*x2, *y2) + offset);
            distance_to_line(line, point) <= tolerance
        }
        ObjectKind::Path { points } => match points.as_slice() {
            [] => false,
            [only] => (Point::new(only.0, only.1) + offset).distance(point) <= tolerance,
            _ => points.windows(2).any(|pair| {
                let a = Point::new(pair[0].0, pair[0].1) + offset;
                let b = Point::new(pair[1].0, pair[1].1) + offset;
                let line = Line::new(a, b);
                distance_to_line(line, point) <= tolerance
            }),
        },
        _ => bounds.contains(point),
    }
}

fn distance_to_line(line: Line, point: Point) -> f64 {
    line.nearest(point, 1e-6).distance_sq.sqrt()
}

/// The topmost selectable object under `point`.
pub fn hit_test(objects: &[DrawableObject], point: Point) -> Option<&DrawableObject> {
    objects
        .iter()
        .rev()
        .find(|obj| obj.selectable && contains(obj, point))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selectable(kind: ObjectKind, left: f64, top: f64) -> DrawableObject {
        let mut obj = DrawableObject::new(kind, left, top);
        obj.selectable = true;
        obj
    }

    #[test]
    fn centered_origin_shifts_bounds() {
        let mut obj = DrawableObject::new(
            ObjectKind::Rect {
                width: 40.0,
                height: 20.0,
            },
            100.0,
            50.0,
        );
        obj.origin_x = OriginX::Center;
        obj.origin_y = OriginY::Center;
        assert_eq!(object_bounds(&obj), Rect::new(80.0, 40.0, 120.0, 60.0));
    }

    #[test]
    fn circle_excludes_box_corners() {
        let circle = selectable(ObjectKind::Circle { radius: 10.0 }, 0.0, 0.0);
        assert!(contains(&circle, Point::new(10.0, 10.0)));
        assert!(!contains(&circle, Point::new(1.0, 1.0)));
    }

    #[test]
    fn line_hit_uses_stroke_tolerance() {
        let line = selectable(
            ObjectKind::Line {
                x1: 0.0,
                y1: 0.0,
                x2: 100.0,
                y2: 0.0,
            },
            0.0,
            0.0,
        );
        assert!(contains(&line, Point::new(50.0, 2.0)));
        assert!(!contains(&line, Point::new(50.0, 10.0)));
    }

    #[test]
    fn moved_path_is_hit_at_new_position() {
        let path = selectable(
            ObjectKind::Path {
                points: vec![(0.0, 0.0), (20.0, 0.0)],
            },
            100.0,
            100.0,
        );
        assert!(contains(&path, Point::new(110.0, 100.0)));
        assert!(!contains(&path, Point::new(10.0, 0.0)));
    }

    #[test]
    fn hit_test_prefers_topmost_selectable() {
        let bottom = selectable(
            ObjectKind::Rect {
                width: 50.0,
                height: 50.0,
            },
            0.0,
            0.0,
        );
        let top = selectable(
            ObjectKind::Rect {
                width: 10.0,
                height: 10.0,
            },
            5.0,
            5.0,
        );
        let mut locked = DrawableObject::new(
            ObjectKind::Rect {
                width: 50.0,
                height: 50.0,
            },
            0.0,
            0.0,
        );
        locked.selectable = false;
        let objects = vec![bottom.clone(), top.clone(), locked];

        assert_eq!(hit_test(&objects, Point::new(8.0, 8.0)).map(|o| o.id), Some(top.id));
        assert_eq!(hit_test(&objects, Point::new(30.0, 30.0)).map(|o| o.id), Some(bottom.id));
        assert!(hit_test(&objects, Point::new(80.0, 80.0)).is_none());
    }
}
