// Uniform access to 0D elements (curve points, stroke vertices) and 1D
// elements (view edges, chains) for predicates, functions and operators.

use crate::chain::Chain;
use crate::curve::{CurvePoint, CurvePointIter};
use crate::model::{Id, Vec2, Vec3};
use crate::stroke::StrokeVertex;
use crate::view_map::{Nature, ViewEdge};

pub trait Interface0D {
    fn point_2d(&self) -> Vec3;
    fn point_3d(&self) -> Vec3;

    fn point(&self) -> Vec2 { self.point_2d().xy() }
    fn projected_x(&self) -> f64 { self.point_2d().x }
    fn projected_y(&self) -> f64 { self.point_2d().y }
    fn projected_z(&self) -> f64 { self.point_2d().z }
}

impl Interface0D for CurvePoint {
    fn point_2d(&self) -> Vec3 { CurvePoint::point_2d(self) }
    fn point_3d(&self) -> Vec3 { CurvePoint::point_3d(self) }
}

impl Interface0D for StrokeVertex {
    fn point_2d(&self) -> Vec3 { StrokeVertex::point_2d(self) }
    fn point_3d(&self) -> Vec3 { StrokeVertex::point_3d(self) }
}

/// Cursor over the vertices of a stroke.
#[derive(Clone, Debug)]
pub struct StrokeVertexIter<'a> {
    vertices: &'a [StrokeVertex],
    index: usize,
}

impl<'a> StrokeVertexIter<'a> {
    pub fn begin(vertices: &'a [StrokeVertex]) -> Self { StrokeVertexIter { vertices, index: 0 } }
    pub fn end(vertices: &'a [StrokeVertex]) -> Self { StrokeVertexIter { vertices, index: vertices.len() } }

    pub fn index(&self) -> usize { self.index }
    pub fn is_begin(&self) -> bool { self.index == 0 }
    pub fn is_end(&self) -> bool { self.index >= self.vertices.len() }
    pub fn current(&self) -> Option<&'a StrokeVertex> { self.vertices.get(self.index) }

    pub fn increment(&mut self) {
        if !self.is_end() {
            self.index += 1;
        }
    }

    pub fn decrement(&mut self) {
        if self.index > 0 {
            self.index -= 1;
        }
    }
}

/// Type-erased 0D cursor handed to predicates and functions.
#[derive(Clone, Debug)]
pub enum Interface0DIterator<'a> {
    Curve(CurvePointIter<'a>),
    Stroke(StrokeVertexIter<'a>),
}

impl<'a> Interface0DIterator<'a> {
    pub fn increment(&mut self) {
        match self {
            Interface0DIterator::Curve(it) => it.increment(),
            Interface0DIterator::Stroke(it) => it.increment(),
        }
    }

    pub fn decrement(&mut self) {
        match self {
            Interface0DIterator::Curve(it) => it.decrement(),
            Interface0DIterator::Stroke(it) => it.decrement(),
        }
    }

    pub fn is_begin(&self) -> bool {
        match self {
            Interface0DIterator::Curve(it) => it.is_begin(),
            Interface0DIterator::Stroke(it) => it.is_begin(),
        }
    }

    pub fn is_end(&self) -> bool {
        match self {
            Interface0DIterator::Curve(it) => it.is_end(),
            Interface0DIterator::Stroke(it) => it.is_end(),
        }
    }

    pub fn current(&self) -> Option<&dyn Interface0D> {
        match self {
            Interface0DIterator::Curve(it) => it.current().map(|p| p as &dyn Interface0D),
            Interface0DIterator::Stroke(it) => it.current().map(|v| v as &dyn Interface0D),
        }
    }

    /// Curve point under the cursor; a stroke vertex yields its own.
    pub fn curve_point(&self) -> Option<CurvePoint> {
        match self {
            Interface0DIterator::Curve(it) => it.current().copied(),
            Interface0DIterator::Stroke(it) => it.current().map(|v| *v.curve_point()),
        }
    }

    pub fn stroke_vertex(&self) -> Option<&'a StrokeVertex> {
        match self {
            Interface0DIterator::Curve(_) => None,
            Interface0DIterator::Stroke(it) => it.current(),
        }
    }

    /// Curvilinear abscissa of the current point.
    pub fn t(&self) -> f64 {
        match self {
            Interface0DIterator::Curve(it) => it.t(),
            Interface0DIterator::Stroke(it) => it.current().map_or(0.0, |v| v.curvilinear_abscissa()),
        }
    }

    pub fn u(&self) -> f64 {
        match self {
            Interface0DIterator::Curve(it) => it.u(),
            Interface0DIterator::Stroke(it) => it.current().map_or(0.0, |v| v.u()),
        }
    }

    // Neighbour positions, clamped at both ends.
    pub(crate) fn previous_point(&self) -> Option<Vec2> {
        if self.is_begin() {
            return self.current().map(|p| p.point());
        }
        let mut prev = self.clone();
        prev.decrement();
        prev.current().map(|p| p.point())
    }

    pub(crate) fn next_point(&self) -> Option<Vec2> {
        let mut next = self.clone();
        next.increment();
        if next.is_end() {
            return self.current().map(|p| p.point());
        }
        next.current().map(|p| p.point())
    }
}

impl PartialEq for Interface0DIterator<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Interface0DIterator::Curve(a), Interface0DIterator::Curve(b)) => a == b,
            (Interface0DIterator::Stroke(a), Interface0DIterator::Stroke(b)) => a.index == b.index,
            _ => false,
        }
    }
}

/// One-dimensional element of the pipeline: a view edge or a chain.
pub trait Interface1D {
    fn id(&self) -> Id;
    fn length_2d(&self) -> f64;
    fn time_stamp(&self) -> u32;
    fn set_time_stamp(&self, ts: u32);
    fn chaining_time_stamp(&self) -> u32;
    fn set_chaining_time_stamp(&self, ts: u32);
    fn nature(&self) -> Nature;
    fn quantitative_invisibility(&self) -> Option<u32>;
    fn shape_id(&self) -> Option<u32>;

    /// Cursor on the first point; `step == 0` visits the backbone vertices.
    fn points(&self, step: f32) -> Interface0DIterator<'_>;
    fn points_end(&self, step: f32) -> Interface0DIterator<'_>;

    fn vertices(&self) -> Interface0DIterator<'_> { self.points(0.0) }

    fn as_view_edge(&self) -> Option<&ViewEdge> { None }
    fn as_chain(&self) -> Option<&Chain> { None }
}

impl Interface1D for ViewEdge {
    fn id(&self) -> Id { self.id }
    fn length_2d(&self) -> f64 { ViewEdge::length_2d(self) }
    fn time_stamp(&self) -> u32 { ViewEdge::time_stamp(self) }
    fn set_time_stamp(&self, ts: u32) { ViewEdge::set_time_stamp(self, ts) }
    fn chaining_time_stamp(&self) -> u32 { ViewEdge::chaining_time_stamp(self) }
    fn set_chaining_time_stamp(&self, ts: u32) { ViewEdge::set_chaining_time_stamp(self, ts) }
    fn nature(&self) -> Nature { self.nature }
    fn quantitative_invisibility(&self) -> Option<u32> { Some(self.qi) }
    fn shape_id(&self) -> Option<u32> { Some(self.shape_id) }

    fn points(&self, step: f32) -> Interface0DIterator<'_> {
        Interface0DIterator::Curve(CurvePointIter::over_svertices(self.svertices(), step, ViewEdge::length_2d(self)))
    }

    fn points_end(&self, step: f32) -> Interface0DIterator<'_> {
        Interface0DIterator::Curve(CurvePointIter::over_svertices_end(self.svertices(), step, ViewEdge::length_2d(self)))
    }

    fn as_view_edge(&self) -> Option<&ViewEdge> { Some(self) }
}
