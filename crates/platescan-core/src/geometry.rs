//! Axis-aligned rectangle overlap arithmetic.

use crate::domain::Rectangle;

pub fn intersection_area(a: &Rectangle, b: &Rectangle) -> f64 {
    let overlap_width = a.right().min(b.right()) - a.left.max(b.left);
    let overlap_height = a.bottom().min(b.bottom()) - a.top.max(b.top);
    if overlap_width <= 0.0 || overlap_height <= 0.0 {
        return 0.0;
    }
    overlap_width * overlap_height
}

pub fn union_area(a: &Rectangle, b: &Rectangle) -> f64 {
    a.area() + b.area() - intersection_area(a, b)
}

/// Intersection over union. Degenerate boxes and an empty union give 0.
pub fn iou(a: &Rectangle, b: &Rectangle) -> f64 {
    if a.area() <= 0.0 || b.area() <= 0.0 {
        return 0.0;
    }
    let union = union_area(a, b);
    if union <= 0.0 {
        return 0.0;
    }
    intersection_area(a, b) / union
}
