// Curves as backbone vertex sequences, and the bidirectional cursor that walks
// them either vertex by vertex or at a fixed arc-length step.

use crate::error::CurveError;
use crate::geometry::tolerance::{EPS_BEGIN, EPS_COINCIDENT, M_EPSILON};
use crate::model::{Id, Vec2, Vec3};
use crate::view_map::SVertex;
use std::collections::VecDeque;

/// Point at parameter `t2d` between two silhouette vertices. A point sitting
/// exactly on a vertex keeps only that vertex: `b` absent means `t2d == 0`,
/// `a` absent means `t2d == 1`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CurvePoint {
    a: Option<SVertex>,
    b: Option<SVertex>,
    t2d: f32,
    point_2d: Vec3,
    point_3d: Vec3,
}

impl CurvePoint {
    pub fn from_svertex(sv: SVertex) -> Self {
        CurvePoint { a: Some(sv), b: None, t2d: 0.0, point_2d: sv.point_2d, point_3d: sv.point_3d }
    }

    pub fn on_segment(a: SVertex, b: SVertex, t: f32) -> Self {
        let tt = t as f64;
        CurvePoint {
            a: Some(a),
            b: Some(b),
            t2d: t,
            point_2d: Vec3::lerp(a.point_2d, b.point_2d, tt),
            point_3d: Vec3::lerp(a.point_3d, b.point_3d, tt),
        }
    }

    pub fn new(a: Option<SVertex>, b: Option<SVertex>, t: f32) -> Result<Self, CurveError> {
        match (a, b) {
            (Some(a), None) if t == 0.0 => Ok(Self::from_svertex(a)),
            (None, Some(b)) if t == 1.0 => Ok(CurvePoint {
                a: None,
                b: Some(b),
                t2d: 1.0,
                point_2d: b.point_2d,
                point_3d: b.point_3d,
            }),
            (Some(a), Some(b)) if (0.0..=1.0).contains(&t) => Ok(Self::on_segment(a, b, t)),
            _ => Err(CurveError::MissingEndpoints { t }),
        }
    }

    /// Point at `t` of the way from `ia` to `ib`, expressed on the segment the
    /// two points share.
    pub fn between(ia: &CurvePoint, ib: &CurvePoint, t: f32) -> Result<Self, CurveError> {
        Ok(Span::resolve(ia, ib)?.at(t))
    }

    pub fn a(&self) -> Option<SVertex> { self.a }
    pub fn b(&self) -> Option<SVertex> { self.b }
    pub fn t2d(&self) -> f32 { self.t2d }
    pub fn point_2d(&self) -> Vec3 { self.point_2d }
    pub fn point_3d(&self) -> Vec3 { self.point_3d }
    #[inline]
    pub fn point(&self) -> Vec2 { self.point_2d.xy() }

    // Moves the projected position only; the parametrisation is kept.
    pub(crate) fn set_point(&mut self, p: Vec2) {
        self.point_2d.x = p.x;
        self.point_2d.y = p.y;
    }

    // Silhouette vertex this point coincides with, if any.
    pub fn on_vertex(&self) -> Option<SVertex> {
        match (self.a, self.b) {
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (Some(a), Some(_)) if self.t2d == 0.0 => Some(a),
            (Some(_), Some(b)) if self.t2d == 1.0 => Some(b),
            _ => None,
        }
    }
}

/// Resolved parametrisation between two consecutive curve vertices: the
/// segment `a -> b` they both lie on and their parameters `t0`, `t1` on it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Span {
    a: SVertex,
    b: SVertex,
    t0: f32,
    t1: f32,
}

fn same(x: Option<SVertex>, y: Option<SVertex>) -> bool {
    matches!((x, y), (Some(x), Some(y)) if x.same(&y))
}

fn near(x: Option<SVertex>, y: Option<SVertex>) -> bool {
    matches!((x, y), (Some(x), Some(y)) if (x.point_3d - y.point_3d).norm() < EPS_COINCIDENT)
}

fn segment(p: &CurvePoint) -> Result<(SVertex, SVertex), CurveError> {
    match (p.a, p.b) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(CurveError::MissingEndpoints { t: p.t2d }),
    }
}

impl Span {
    pub fn full(a: SVertex, b: SVertex) -> Self { Span { a, b, t0: 0.0, t1: 1.0 } }

    // Cases are tried in order and the first that matches decides, even
    // when its own rules cannot place the points.
    pub fn resolve(ia: &CurvePoint, ib: &CurvePoint) -> Result<Span, CurveError> {
        let (t1, t2) = (ia.t2d, ib.t2d);

        if let (Some(a1), Some(b1), Some(a2), Some(b2)) = (ia.a, ia.b, ib.a, ib.b) {
            if a1.same(&a2) && b1.same(&b2) {
                return Ok(Span { a: a1, b: b1, t0: t1, t1: t2 });
            }
        }
        if (ia.b.is_none() && ib.b.is_none()) || (t1 == 0.0 && t2 == 0.0) {
            return match (ia.a, ib.a) {
                (Some(a), Some(b)) => Ok(Span::full(a, b)),
                _ => Err(CurveError::MissingEndpoints { t: t1 }),
            };
        }
        if same(ia.a, ib.a) {
            return Self::shared_start(ia, ib);
        }
        if same(ia.b, ib.b) {
            return Self::shared_end(ia, ib);
        }
        if same(ia.b, ib.a) {
            return Self::end_to_start(ia, ib);
        }
        if near(ia.a, ib.a) {
            return Self::shared_start(ia, ib);
        }
        if near(ia.b, ib.b) {
            return Self::shared_end(ia, ib);
        }
        if near(ia.b, ib.a) {
            return Self::end_to_start(ia, ib);
        }
        Err(CurveError::NoSharedEndpoint)
    }

    fn shared_start(ia: &CurvePoint, ib: &CurvePoint) -> Result<Span, CurveError> {
        if ia.t2d == 0.0 {
            let (a, b) = segment(ib)?;
            Ok(Span { a, b, t0: 0.0, t1: ib.t2d })
        } else if ib.t2d == 0.0 {
            let (a, b) = segment(ia)?;
            Ok(Span { a, b, t0: ia.t2d, t1: 0.0 })
        } else {
            Err(CurveError::NoSharedEndpoint)
        }
    }

    fn shared_end(ia: &CurvePoint, ib: &CurvePoint) -> Result<Span, CurveError> {
        if ia.t2d == 1.0 {
            let (a, b) = segment(ib)?;
            Ok(Span { a, b, t0: 1.0, t1: ib.t2d })
        } else if ib.t2d == 1.0 {
            let (a, b) = segment(ia)?;
            Ok(Span { a, b, t0: ia.t2d, t1: 1.0 })
        } else {
            Err(CurveError::NoSharedEndpoint)
        }
    }

    fn end_to_start(ia: &CurvePoint, ib: &CurvePoint) -> Result<Span, CurveError> {
        let (t1, t2) = (ia.t2d, ib.t2d);
        if t1 != 1.0 && t2 == 0.0 {
            let (a, b) = segment(ia)?;
            Ok(Span { a, b, t0: t1, t1: 1.0 })
        } else if t1 == 1.0 && t2 != 0.0 {
            let (a, b) = segment(ib)?;
            Ok(Span { a, b, t0: 0.0, t1: t2 })
        } else if t1 == 1.0 && t2 == 0.0 {
            // Both points sit on the shared vertex
            let (a, b) = segment(ia)?;
            Ok(Span { a, b, t0: 1.0, t1: 1.0 })
        } else {
            Err(CurveError::NoSharedEndpoint)
        }
    }

    /// Point at fraction `t` of the way from the span start to its end.
    pub fn at(&self, t: f32) -> CurvePoint {
        let s = if t == 0.0 {
            self.t0
        } else if t == 1.0 {
            self.t1
        } else {
            self.t0 + (self.t1 - self.t0) * t
        };
        CurvePoint::on_segment(self.a, self.b, s)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Curve {
    id: Id,
    vertices: VecDeque<CurvePoint>,
    spans: VecDeque<Span>,    // spans[i] joins vertices[i] and vertices[i + 1]
    length: f64,
}

impl Curve {
    pub fn new(id: Id) -> Self { Curve { id, ..Default::default() } }

    pub fn id(&self) -> Id { self.id }
    pub fn set_id(&mut self, id: Id) { self.id = id; }

    pub fn push_vertex_back(&mut self, cp: CurvePoint) -> Result<(), CurveError> {
        if let Some(last) = self.vertices.back() {
            let span = Span::resolve(last, &cp)?;
            self.length += (cp.point() - last.point()).norm();
            self.spans.push_back(span);
        }
        self.vertices.push_back(cp);
        Ok(())
    }

    pub fn push_vertex_front(&mut self, cp: CurvePoint) -> Result<(), CurveError> {
        if let Some(first) = self.vertices.front() {
            let span = Span::resolve(&cp, first)?;
            self.length += (first.point() - cp.point()).norm();
            self.spans.push_front(span);
        }
        self.vertices.push_front(cp);
        Ok(())
    }

    pub fn push_svertex_back(&mut self, sv: SVertex) -> Result<(), CurveError> {
        self.push_vertex_back(CurvePoint::from_svertex(sv))
    }

    pub fn push_svertex_front(&mut self, sv: SVertex) -> Result<(), CurveError> {
        self.push_vertex_front(CurvePoint::from_svertex(sv))
    }

    pub(crate) fn pop_back(&mut self) -> Option<CurvePoint> {
        let last = self.vertices.pop_back()?;
        if let Some(prev) = self.vertices.back() {
            self.length -= (last.point() - prev.point()).norm();
            self.spans.pop_back();
        }
        if self.vertices.len() <= 1 {
            self.length = 0.0;
        }
        Some(last)
    }

    pub fn len(&self) -> usize { self.vertices.len() }
    pub fn is_empty(&self) -> bool { self.vertices.is_empty() }
    pub fn n_segments(&self) -> usize { self.spans.len() }
    pub fn length_2d(&self) -> f64 { self.length }
    pub fn vertices(&self) -> &VecDeque<CurvePoint> { &self.vertices }
    pub fn front(&self) -> Option<&CurvePoint> { self.vertices.front() }
    pub fn back(&self) -> Option<&CurvePoint> { self.vertices.back() }

    /// Cursor on the first point. `step == 0` visits the backbone vertices,
    /// `step > 0` walks at that arc-length spacing.
    pub fn points(&self, step: f32) -> CurvePointIter<'_> {
        CurvePointIter::begin(Backbone::Curve { vertices: &self.vertices, spans: &self.spans }, step, self.length)
    }

    pub fn points_end(&self, step: f32) -> CurvePointIter<'_> {
        CurvePointIter::end(Backbone::Curve { vertices: &self.vertices, spans: &self.spans }, step, self.length)
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) enum Backbone<'a> {
    Curve { vertices: &'a VecDeque<CurvePoint>, spans: &'a VecDeque<Span> },
    Edge(&'a [SVertex]),
}

impl<'a> Backbone<'a> {
    fn n_vertices(&self) -> usize {
        match self {
            Backbone::Curve { vertices, .. } => vertices.len(),
            Backbone::Edge(svs) => svs.len(),
        }
    }

    fn vertex(&self, i: usize) -> CurvePoint {
        match self {
            Backbone::Curve { vertices, .. } => vertices[i],
            Backbone::Edge(svs) => CurvePoint::from_svertex(svs[i]),
        }
    }

    fn span(&self, i: usize) -> Span {
        match self {
            Backbone::Curve { spans, .. } => spans[i],
            Backbone::Edge(svs) => Span::full(svs[i], svs[i + 1]),
        }
    }

    fn segment_length(&self, i: usize) -> f64 {
        match self {
            Backbone::Curve { vertices, .. } => (vertices[i + 1].point() - vertices[i].point()).norm(),
            Backbone::Edge(svs) => (svs[i + 1].point_2d.xy() - svs[i].point_2d.xy()).norm(),
        }
    }
}

/// Bidirectional cursor over the points of a curve. Moving past either end is
/// the caller's responsibility to avoid; check [`is_end`](Self::is_end) first.
#[derive(Clone, Debug)]
pub struct CurvePointIter<'a> {
    backbone: Backbone<'a>,
    a: usize,                  // current segment is (a, a + 1)
    t: f32,
    current_n: usize,
    n_segments: usize,
    step: f32,
    curvilinear_length: f64,
    curve_length: f64,
    point: Option<CurvePoint>,
}

impl<'a> CurvePointIter<'a> {
    pub(crate) fn begin(backbone: Backbone<'a>, step: f32, curve_length: f64) -> Self {
        let n_segments = backbone.n_vertices().saturating_sub(1);
        let mut it = CurvePointIter {
            backbone,
            a: 0,
            t: 0.0,
            current_n: 0,
            n_segments,
            step,
            curvilinear_length: 0.0,
            curve_length,
            point: None,
        };
        it.refresh();
        it
    }

    pub(crate) fn end(backbone: Backbone<'a>, step: f32, curve_length: f64) -> Self {
        let n_segments = backbone.n_vertices().saturating_sub(1);
        CurvePointIter {
            backbone,
            a: n_segments,
            t: 0.0,
            current_n: n_segments,
            n_segments,
            step,
            curvilinear_length: curve_length,
            curve_length,
            point: None,
        }
    }

    pub fn over_svertices(svertices: &'a [SVertex], step: f32, length: f64) -> Self {
        Self::begin(Backbone::Edge(svertices), step, length)
    }

    pub fn over_svertices_end(svertices: &'a [SVertex], step: f32, length: f64) -> Self {
        Self::end(Backbone::Edge(svertices), step, length)
    }

    fn refresh(&mut self) {
        self.point = if self.is_end() {
            None
        } else if self.t == 0.0 {
            Some(self.backbone.vertex(self.a))
        } else if self.t == 1.0 {
            Some(self.backbone.vertex(self.a + 1))
        } else {
            Some(self.backbone.span(self.a).at(self.t))
        };
    }

    pub fn is_begin(&self) -> bool { self.a == 0 && self.t < EPS_BEGIN }
    pub fn is_end(&self) -> bool { self.a + 1 >= self.backbone.n_vertices() }

    pub fn current(&self) -> Option<&CurvePoint> { self.point.as_ref() }

    /// Curvilinear abscissa of the current point.
    pub fn t(&self) -> f64 { self.curvilinear_length }

    pub fn u(&self) -> f64 {
        if self.curve_length > 0.0 { self.curvilinear_length / self.curve_length } else { 0.0 }
    }

    pub fn increment(&mut self) {
        if self.is_end() {
            return;
        }
        self.advance();
        self.refresh();
    }

    fn advance(&mut self) {
        let last = self.n_segments - 1;
        if self.current_n == last && self.t == 1.0 {
            self.a += 1;
            self.current_n += 1;
            self.t = 0.0;
            return;
        }
        if self.step == 0.0 {
            self.curvilinear_length += self.backbone.segment_length(self.a);
            if self.current_n == last {
                self.t = 1.0;
                return;
            }
            self.a += 1;
            self.current_n += 1;
            return;
        }

        let norm_ab = self.backbone.segment_length(self.a);
        if norm_ab > M_EPSILON {
            self.curvilinear_length += self.step as f64;
            self.t += (self.step as f64 / norm_ab) as f32;
        } else {
            self.t = 1.0;
        }
        if self.t >= 1.0 {
            self.curvilinear_length -= norm_ab * (self.t as f64 - 1.0);
            if self.current_n == last {
                self.t = 1.0;
            } else {
                self.t = 0.0;
                self.current_n += 1;
                self.a += 1;
            }
        }
    }

    pub fn decrement(&mut self) {
        if self.is_begin() && !self.is_end() {
            return;
        }
        if self.n_segments == 0 {
            return;
        }
        if self.t == 0.0 {
            self.t = 1.0;
            self.current_n -= 1;
            self.a -= 1;
            if self.current_n == self.n_segments - 1 {
                self.refresh();
                return;
            }
        }
        if self.step == 0.0 {
            self.curvilinear_length -= self.backbone.segment_length(self.a);
            self.t = 0.0;
            self.refresh();
            return;
        }

        let norm_ab = self.backbone.segment_length(self.a);
        if norm_ab > M_EPSILON {
            self.curvilinear_length -= self.step as f64;
            self.t -= (self.step as f64 / norm_ab) as f32;
        } else {
            self.t = -1.0;
        }
        if self.t.abs() < M_EPSILON as f32 {
            self.t = 0.0;
        }
        if self.t < 0.0 {
            if self.current_n == 0 {
                self.curvilinear_length = 0.0;
            } else {
                self.curvilinear_length += norm_ab * (-self.t as f64);
            }
            self.t = 0.0;
        }
        self.refresh();
    }
}

impl PartialEq for CurvePointIter<'_> {
    fn eq(&self, other: &Self) -> bool { self.a == other.a && self.t == other.t }
}

impl Iterator for CurvePointIter<'_> {
    type Item = CurvePoint;

    fn next(&mut self) -> Option<CurvePoint> {
        let p = self.point?;
        self.increment();
        Some(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sv(id: u32, x: f64, y: f64) -> SVertex {
        let p = Vec3::new(x, y, 0.0);
        SVertex::new(id, p, p)
    }

    fn l_curve() -> Curve {
        let mut c = Curve::new(Id::new(1, 0));
        for (i, (x, y)) in [(0.0, 0.0), (3.0, 0.0), (3.0, 4.0)].iter().enumerate() {
            c.push_svertex_back(sv(i as u32, *x, *y)).unwrap();
        }
        c
    }

    #[test]
    fn vertex_walk_round_trips() {
        let c = l_curve();
        let pts: Vec<Vec2> = c.points(0.0).map(|p| p.point()).collect();
        assert_eq!(pts, vec![Vec2::new(0.0, 0.0), Vec2::new(3.0, 0.0), Vec2::new(3.0, 4.0)]);
        assert_eq!(c.length_2d(), 7.0);
        assert_eq!(c.n_segments(), 2);
    }

    #[test]
    fn stepped_walk_hits_every_vertex_and_sums_length() {
        let c = l_curve();
        let mut it = c.points(0.7);
        let mut pts = Vec::new();
        while !it.is_end() {
            pts.push(it.current().unwrap().point());
            if pts.len() > 1 {
                assert!(it.t() <= c.length_2d() + 1e-4);
            }
            it.increment();
        }
        assert!(pts.contains(&Vec2::new(3.0, 0.0)));
        assert_eq!(*pts.last().unwrap(), Vec2::new(3.0, 4.0));
        let sum: f64 = pts.windows(2).map(|w| (w[1] - w[0]).norm()).sum();
        assert!((sum - 7.0).abs() < 1e-5);
    }

    #[test]
    fn decrement_mirrors_increment() {
        let c = l_curve();
        let mut it = c.points_end(0.0);
        let mut back = Vec::new();
        loop {
            it.decrement();
            back.push(it.current().unwrap().point());
            if it.is_begin() {
                break;
            }
        }
        assert_eq!(back, vec![Vec2::new(3.0, 4.0), Vec2::new(3.0, 0.0), Vec2::new(0.0, 0.0)]);
        assert_eq!(it.t(), 0.0);
    }

    #[test]
    fn degenerate_segment_jumps_to_end() {
        let mut c = Curve::new(Id::default());
        c.push_svertex_back(sv(0, 0.0, 0.0)).unwrap();
        c.push_svertex_back(sv(1, 0.0, 0.0)).unwrap();
        c.push_svertex_back(sv(2, 1.0, 0.0)).unwrap();
        let n = c.points(0.25).count();
        // v0, v1 and then four steps to v2
        assert_eq!(n, 6);
    }

    #[test]
    fn merge_on_same_segment() {
        let a = sv(0, 0.0, 0.0);
        let b = sv(1, 10.0, 0.0);
        let p = CurvePoint::on_segment(a, b, 0.2);
        let q = CurvePoint::on_segment(a, b, 0.6);
        let m = CurvePoint::between(&p, &q, 0.5).unwrap();
        assert!((m.t2d() - 0.4).abs() < 1e-6);
        assert!((m.point().x - 4.0).abs() < 1e-5);
    }

    #[test]
    fn merge_across_shared_vertex() {
        let a = sv(0, 0.0, 0.0);
        let b = sv(1, 10.0, 0.0);
        let c = sv(2, 10.0, 10.0);
        let p = CurvePoint::on_segment(a, b, 0.5);
        let q = CurvePoint::from_svertex(b);
        let m = CurvePoint::between(&p, &q, 0.5).unwrap();
        assert_eq!(m.point(), Vec2::new(7.5, 0.0));
        let r = CurvePoint::on_segment(b, c, 0.5);
        let m2 = CurvePoint::between(&q, &r, 0.5).unwrap();
        assert_eq!(m2.point(), Vec2::new(10.0, 2.5));
    }

    #[test]
    fn unrelated_points_are_rejected() {
        let p = CurvePoint::on_segment(sv(0, 0.0, 0.0), sv(1, 1.0, 0.0), 0.5);
        let q = CurvePoint::on_segment(sv(2, 5.0, 5.0), sv(3, 6.0, 5.0), 0.5);
        assert_eq!(CurvePoint::between(&p, &q, 0.5), Err(CurveError::NoSharedEndpoint));
        let mut c = Curve::default();
        c.push_vertex_back(p).unwrap();
        assert!(c.push_vertex_back(q).is_err());
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn first_matching_case_decides() {
        // Same start by identity, same end only by position. The start rules
        // cannot place the points and the end rules are never consulted.
        let p0 = sv(0, 0.0, 0.0);
        let q = sv(1, 4.0, 0.0);
        let q_twin = sv(9, 4.0, 0.0);
        let ia = CurvePoint::on_segment(p0, q, 0.3);
        let ib = CurvePoint::on_segment(p0, q_twin, 1.0);
        assert_eq!(CurvePoint::between(&ia, &ib, 0.5), Err(CurveError::NoSharedEndpoint));

        // Without the shared start the near-equal end resolves.
        let r = sv(5, -1.0, 0.0);
        let ib2 = CurvePoint::on_segment(r, q_twin, 1.0);
        assert!(CurvePoint::between(&ia, &ib2, 0.5).is_ok());
    }

    #[test]
    fn boundary_constructor() {
        let a = sv(0, 1.0, 2.0);
        assert!(CurvePoint::new(None, Some(a), 1.0).is_ok());
        assert!(CurvePoint::new(Some(a), None, 0.5).is_err());
        assert!(CurvePoint::new(None, None, 0.0).is_err());
    }
}
