// Functions evaluated on 0D cursors and 1D elements.

use crate::error::EvalError;
use crate::interface::{Interface0DIterator, Interface1D};
use crate::model::Vec2;

pub trait UnaryFunction0D<T> {
    fn evaluate(&mut self, it: &Interface0DIterator<'_>) -> Result<T, EvalError>;
}

impl<T, F> UnaryFunction0D<T> for F
where
    F: FnMut(&Interface0DIterator<'_>) -> Result<T, EvalError>,
{
    fn evaluate(&mut self, it: &Interface0DIterator<'_>) -> Result<T, EvalError> { self(it) }
}

/// Function on a 1D element evaluated for its side effect.
pub trait UnaryFunction1DVoid {
    fn evaluate(&mut self, inter: &dyn Interface1D) -> Result<(), EvalError>;
}

impl<F> UnaryFunction1DVoid for F
where
    F: FnMut(&dyn Interface1D) -> Result<(), EvalError>,
{
    fn evaluate(&mut self, inter: &dyn Interface1D) -> Result<(), EvalError> { self(inter) }
}

/// Unit tangent at the current point: the normalised sum of the unit
/// directions of the two adjacent segments.
#[derive(Clone, Copy, Debug, Default)]
pub struct VertexOrientation2DF0D;

impl UnaryFunction0D<Vec2> for VertexOrientation2DF0D {
    fn evaluate(&mut self, it: &Interface0DIterator<'_>) -> Result<Vec2, EvalError> {
        vertex_orientation_2d(it)
    }
}

pub fn vertex_orientation_2d(it: &Interface0DIterator<'_>) -> Result<Vec2, EvalError> {
    let b = it.current().ok_or(EvalError::Degenerate("cursor past the end"))?.point();
    let a = it.previous_point().unwrap_or(b);
    let c = it.next_point().unwrap_or(b);
    Ok(((b - a).normalized() + (c - b).normalized()).normalized())
}

/// Turning angle in radians between the normals of the two segments around
/// the current point. Elements with fewer than three points have none.
#[derive(Clone, Copy, Debug, Default)]
pub struct Curvature2DAngleF0D;

impl UnaryFunction0D<f64> for Curvature2DAngleF0D {
    fn evaluate(&mut self, it: &Interface0DIterator<'_>) -> Result<f64, EvalError> { curvature_2d_angle(it) }
}

pub fn curvature_2d_angle(it: &Interface0DIterator<'_>) -> Result<f64, EvalError> {
    let mut back = it.clone();
    let mut ahead = it.clone();
    ahead.increment();
    let mut count = 1;
    while !back.is_begin() && count < 3 {
        back.decrement();
        count += 1;
    }
    while !ahead.is_end() && count < 3 {
        ahead.increment();
        count += 1;
    }
    if count < 3 {
        return Ok(0.0);
    }

    let mut v = it.clone();
    if it.is_begin() {
        v.increment();
    }
    let mut next = v.clone();
    next.increment();
    if next.is_end() {
        next = v.clone();
        v.decrement();
    }
    let mut prev = v.clone();
    prev.decrement();

    let point = |c: &Interface0DIterator<'_>| c.current().map(|p| p.point()).ok_or(EvalError::Degenerate("cursor past the end"));
    let (a, b, c) = (point(&prev)?, point(&v)?, point(&next)?);
    let n1 = (b - a).perp().normalized();
    let n2 = (c - b).perp().normalized();
    if n1 == Vec2::ZERO && n2 == Vec2::ZERO {
        return Err(EvalError::Degenerate("both segments around the point have zero length"));
    }
    Ok(n1.dot(n2).clamp(-1.0, 1.0).acos())
}

/// Normalised abscissa `u` of the current point.
#[derive(Clone, Copy, Debug, Default)]
pub struct ParameterF0D;

impl UnaryFunction0D<f64> for ParameterF0D {
    fn evaluate(&mut self, it: &Interface0DIterator<'_>) -> Result<f64, EvalError> { Ok(it.u()) }
}

/// Stamps the element with a fixed time stamp.
#[derive(Clone, Copy, Debug)]
pub struct TimeStampF1D(pub u32);

impl UnaryFunction1DVoid for TimeStampF1D {
    fn evaluate(&mut self, inter: &dyn Interface1D) -> Result<(), EvalError> {
        inter.set_time_stamp(self.0);
        Ok(())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ChainingTimeStampF1D(pub u32);

impl UnaryFunction1DVoid for ChainingTimeStampF1D {
    fn evaluate(&mut self, inter: &dyn Interface1D) -> Result<(), EvalError> {
        inter.set_chaining_time_stamp(self.0);
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct IncrementChainingTimeStampF1D;

impl UnaryFunction1DVoid for IncrementChainingTimeStampF1D {
    fn evaluate(&mut self, inter: &dyn Interface1D) -> Result<(), EvalError> {
        inter.set_chaining_time_stamp(inter.chaining_time_stamp() + 1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Id;
    use crate::stroke::Stroke;
    use std::f64::consts::FRAC_PI_2;

    fn corner() -> Stroke {
        Stroke::from_points(Id::default(), &[Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0)])
    }

    #[test]
    fn right_angle_curvature() {
        let s = corner();
        let mut it = s.vertices_begin();
        assert!((curvature_2d_angle(&it).unwrap() - FRAC_PI_2).abs() < 1e-12);
        it.increment();
        assert!((curvature_2d_angle(&it).unwrap() - FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn two_points_have_no_curvature() {
        let s = Stroke::from_points(Id::default(), &[Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0)]);
        assert_eq!(curvature_2d_angle(&s.vertices_begin()).unwrap(), 0.0);
    }

    #[test]
    fn stacked_points_are_degenerate() {
        let p = Vec2::new(2.0, 2.0);
        let s = Stroke::from_points(Id::default(), &[p, p, p]);
        assert!(matches!(curvature_2d_angle(&s.vertices_begin()), Err(EvalError::Degenerate(_))));
    }

    #[test]
    fn orientation_at_ends_uses_single_segment() {
        let s = corner();
        let mut it = s.vertices_begin();
        assert_eq!(vertex_orientation_2d(&it).unwrap(), Vec2::new(1.0, 0.0));
        it.increment();
        let mid = vertex_orientation_2d(&it).unwrap();
        assert!((mid.x - mid.y).abs() < 1e-12 && (mid.norm() - 1.0).abs() < 1e-12);
        it.increment();
        assert_eq!(vertex_orientation_2d(&it).unwrap(), Vec2::new(0.0, 1.0));
    }
}
