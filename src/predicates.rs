// Predicates driving selection, chaining, splitting and stroke creation.

use crate::error::EvalError;
use crate::functions::curvature_2d_angle;
use crate::interface::{Interface0DIterator, Interface1D};
use crate::view_map::Nature;

pub trait UnaryPredicate0D {
    fn evaluate(&mut self, it: &Interface0DIterator<'_>) -> Result<bool, EvalError>;
}

impl<F> UnaryPredicate0D for F
where
    F: FnMut(&Interface0DIterator<'_>) -> Result<bool, EvalError>,
{
    fn evaluate(&mut self, it: &Interface0DIterator<'_>) -> Result<bool, EvalError> { self(it) }
}

pub trait UnaryPredicate1D {
    fn evaluate(&mut self, inter: &dyn Interface1D) -> Result<bool, EvalError>;
}

impl<F> UnaryPredicate1D for F
where
    F: FnMut(&dyn Interface1D) -> Result<bool, EvalError>,
{
    fn evaluate(&mut self, inter: &dyn Interface1D) -> Result<bool, EvalError> { self(inter) }
}

pub trait BinaryPredicate1D {
    fn evaluate(&mut self, a: &dyn Interface1D, b: &dyn Interface1D) -> Result<bool, EvalError>;
}

impl<F> BinaryPredicate1D for F
where
    F: FnMut(&dyn Interface1D, &dyn Interface1D) -> Result<bool, EvalError>,
{
    fn evaluate(&mut self, a: &dyn Interface1D, b: &dyn Interface1D) -> Result<bool, EvalError> { self(a, b) }
}

// 0D

#[derive(Clone, Copy, Debug, Default)]
pub struct TrueUP0D;

impl UnaryPredicate0D for TrueUP0D {
    fn evaluate(&mut self, _: &Interface0DIterator<'_>) -> Result<bool, EvalError> { Ok(true) }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct FalseUP0D;

impl UnaryPredicate0D for FalseUP0D {
    fn evaluate(&mut self, _: &Interface0DIterator<'_>) -> Result<bool, EvalError> { Ok(false) }
}

/// True while the normalised abscissa lies in `[min, max]`.
#[derive(Clone, Copy, Debug)]
pub struct ParameterRangeUP0D {
    pub min: f64,
    pub max: f64,
}

impl UnaryPredicate0D for ParameterRangeUP0D {
    fn evaluate(&mut self, it: &Interface0DIterator<'_>) -> Result<bool, EvalError> {
        let u = it.u();
        Ok(u >= self.min && u <= self.max)
    }
}

/// True at points turning by more than `threshold` radians.
#[derive(Clone, Copy, Debug)]
pub struct Curvature2DAngleAboveUP0D {
    pub threshold: f64,
}

impl UnaryPredicate0D for Curvature2DAngleAboveUP0D {
    fn evaluate(&mut self, it: &Interface0DIterator<'_>) -> Result<bool, EvalError> {
        Ok(curvature_2d_angle(it)? > self.threshold)
    }
}

// 1D

#[derive(Clone, Copy, Debug, Default)]
pub struct TrueUP1D;

impl UnaryPredicate1D for TrueUP1D {
    fn evaluate(&mut self, _: &dyn Interface1D) -> Result<bool, EvalError> { Ok(true) }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct FalseUP1D;

impl UnaryPredicate1D for FalseUP1D {
    fn evaluate(&mut self, _: &dyn Interface1D) -> Result<bool, EvalError> { Ok(false) }
}

/// Length within `[min, max]`; `max` unbounded when absent.
#[derive(Clone, Copy, Debug, Default)]
pub struct LengthThresholdUP1D {
    pub min: f64,
    pub max: Option<f64>,
}

impl UnaryPredicate1D for LengthThresholdUP1D {
    fn evaluate(&mut self, inter: &dyn Interface1D) -> Result<bool, EvalError> {
        let l = inter.length_2d();
        Ok(l >= self.min && self.max.map_or(true, |m| l <= m))
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct QuantitativeInvisibilityUP1D(pub u32);

impl UnaryPredicate1D for QuantitativeInvisibilityUP1D {
    fn evaluate(&mut self, inter: &dyn Interface1D) -> Result<bool, EvalError> {
        Ok(inter.quantitative_invisibility() == Some(self.0))
    }
}

#[derive(Clone, Copy, Debug)]
pub struct EqualToTimeStampUP1D(pub u32);

impl UnaryPredicate1D for EqualToTimeStampUP1D {
    fn evaluate(&mut self, inter: &dyn Interface1D) -> Result<bool, EvalError> { Ok(inter.time_stamp() == self.0) }
}

#[derive(Clone, Copy, Debug)]
pub struct EqualToChainingTimeStampUP1D(pub u32);

impl UnaryPredicate1D for EqualToChainingTimeStampUP1D {
    fn evaluate(&mut self, inter: &dyn Interface1D) -> Result<bool, EvalError> {
        Ok(inter.chaining_time_stamp() == self.0)
    }
}

/// True when the element carries any of the given natures.
#[derive(Clone, Copy, Debug)]
pub struct NatureUP1D(pub Nature);

impl UnaryPredicate1D for NatureUP1D {
    fn evaluate(&mut self, inter: &dyn Interface1D) -> Result<bool, EvalError> {
        Ok(inter.nature().intersects(self.0))
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ShapeUP1D(pub u32);

impl UnaryPredicate1D for ShapeUP1D {
    fn evaluate(&mut self, inter: &dyn Interface1D) -> Result<bool, EvalError> { Ok(inter.shape_id() == Some(self.0)) }
}

/// True when the bounding box of the element's vertices overlaps the image
/// rectangle.
#[derive(Clone, Copy, Debug)]
pub struct WithinImageBoundaryUP1D {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl UnaryPredicate1D for WithinImageBoundaryUP1D {
    fn evaluate(&mut self, inter: &dyn Interface1D) -> Result<bool, EvalError> {
        let mut it = inter.vertices();
        let (mut lo_x, mut lo_y, mut hi_x, mut hi_y) = (f64::MAX, f64::MAX, f64::MIN, f64::MIN);
        let mut any = false;
        while !it.is_end() {
            if let Some(p) = it.current() {
                let p = p.point();
                lo_x = lo_x.min(p.x);
                lo_y = lo_y.min(p.y);
                hi_x = hi_x.max(p.x);
                hi_y = hi_y.max(p.y);
                any = true;
            }
            it.increment();
        }
        Ok(any && lo_x <= self.xmax && hi_x >= self.xmin && lo_y <= self.ymax && hi_y >= self.ymin)
    }
}

// Binary

#[derive(Clone, Copy, Debug, Default)]
pub struct TrueBP1D;

impl BinaryPredicate1D for TrueBP1D {
    fn evaluate(&mut self, _: &dyn Interface1D, _: &dyn Interface1D) -> Result<bool, EvalError> { Ok(true) }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct FalseBP1D;

impl BinaryPredicate1D for FalseBP1D {
    fn evaluate(&mut self, _: &dyn Interface1D, _: &dyn Interface1D) -> Result<bool, EvalError> { Ok(false) }
}

/// Longer first: used as a sort order.
#[derive(Clone, Copy, Debug, Default)]
pub struct Length2DBP1D;

impl BinaryPredicate1D for Length2DBP1D {
    fn evaluate(&mut self, a: &dyn Interface1D, b: &dyn Interface1D) -> Result<bool, EvalError> {
        Ok(a.length_2d() > b.length_2d())
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SameShapeIdBP1D;

impl BinaryPredicate1D for SameShapeIdBP1D {
    fn evaluate(&mut self, a: &dyn Interface1D, b: &dyn Interface1D) -> Result<bool, EvalError> {
        Ok(a.shape_id().is_some() && a.shape_id() == b.shape_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view_map::ViewMap;

    #[test]
    fn edge_predicates() {
        let mut vm = ViewMap::new();
        let a = vm.add_vertex(0.0, 0.0);
        let b = vm.add_vertex(4.0, 3.0);
        let e = vm.add_edge(a, b, Nature::CREASE | Nature::RIDGE).unwrap();
        vm.set_edge_qi(e, 2);
        let edge = vm.edge(e).unwrap();

        assert!(LengthThresholdUP1D { min: 5.0, max: None }.evaluate(edge).unwrap());
        assert!(!LengthThresholdUP1D { min: 0.0, max: Some(4.9) }.evaluate(edge).unwrap());
        assert!(QuantitativeInvisibilityUP1D(2).evaluate(edge).unwrap());
        assert!(NatureUP1D(Nature::RIDGE).evaluate(edge).unwrap());
        assert!(!NatureUP1D(Nature::SILHOUETTE).evaluate(edge).unwrap());
        let mut inside = WithinImageBoundaryUP1D { xmin: 3.0, ymin: 2.0, xmax: 10.0, ymax: 10.0 };
        assert!(inside.evaluate(edge).unwrap());
        let mut outside = WithinImageBoundaryUP1D { xmin: 5.0, ymin: 0.0, xmax: 10.0, ymax: 10.0 };
        assert!(!outside.evaluate(edge).unwrap());
    }

    #[test]
    fn closures_are_predicates() {
        let mut vm = ViewMap::new();
        let a = vm.add_vertex(0.0, 0.0);
        let b = vm.add_vertex(1.0, 0.0);
        let e = vm.add_edge(a, b, Nature::BORDER).unwrap();
        let mut calls = 0;
        let mut pred = |i: &dyn Interface1D| {
            calls += 1;
            Ok::<bool, EvalError>(i.length_2d() > 0.5)
        };
        assert!(pred.evaluate(vm.edge(e).unwrap()).unwrap());
        assert_eq!(calls, 1);
    }
}
