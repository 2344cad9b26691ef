// Infinite line-line intersection in f64, used to join offset rails at
// interior strip vertices.

use super::tolerance::M_EPSILON;
use crate::model::Vec2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineIntersection {
    // Directions are (nearly) parallel; includes coincident lines
    Colinear,
    At(Vec2),
}

/// Intersects the line through `p1, p2` with the line through `p3, p4`.
pub fn intersect_lines(p1: Vec2, p2: Vec2, p3: Vec2, p4: Vec2) -> LineIntersection {
    // Implicit forms a*x + b*y + c = 0
    let a1 = p2.y - p1.y;
    let b1 = p1.x - p2.x;
    let c1 = p2.x * p1.y - p1.x * p2.y;
    let a2 = p4.y - p3.y;
    let b2 = p3.x - p4.x;
    let c2 = p4.x * p3.y - p3.x * p4.y;

    let denom = a1 * b2 - a2 * b1;
    if denom.abs() < M_EPSILON {
        return LineIntersection::Colinear;
    }
    let x = (b1 * c2 - b2 * c1) / denom;
    let y = (a2 * c1 - a1 * c2) / denom;
    LineIntersection::At(Vec2::new(x, y))
}
