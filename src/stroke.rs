// Strokes: curve-shaped vertex sequences carrying rendering attributes, with
// the resampling, insertion and removal operations shaders rely on.

use crate::curve::CurvePoint;
use crate::error::{CurveError, StrokeError};
use crate::interface::{Interface0DIterator, StrokeVertexIter};
use crate::model::{lerp_f32, Id, MediumType, Rgb, Vec2, Vec3};
use crate::view_map::SVertex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum UserAttribute {
    Real(f32),
    Vec2(Vec2),
    Vec3(Vec3),
}

impl UserAttribute {
    // Same-kind interpolation; None when the kinds differ.
    fn lerp(a: &UserAttribute, b: &UserAttribute, t: f32) -> Option<UserAttribute> {
        let tt = t as f64;
        match (a, b) {
            (UserAttribute::Real(x), UserAttribute::Real(y)) => Some(UserAttribute::Real(lerp_f32(*x, *y, t))),
            (UserAttribute::Vec2(x), UserAttribute::Vec2(y)) => Some(UserAttribute::Vec2(*x * (1.0 - tt) + *y * tt)),
            (UserAttribute::Vec3(x), UserAttribute::Vec3(y)) => Some(UserAttribute::Vec3(*x * (1.0 - tt) + *y * tt)),
            _ => None,
        }
    }
}

/// Per-vertex rendering attributes. Thickness is stored as `[right, left]`
/// of the backbone.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StrokeAttribute {
    color: Rgb,
    alpha: f32,
    thickness: [f32; 2],
    visible: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    user: BTreeMap<String, UserAttribute>,
}

impl Default for StrokeAttribute {
    fn default() -> Self {
        StrokeAttribute { color: Rgb::BLACK, alpha: 1.0, thickness: [1.0, 1.0], visible: true, user: BTreeMap::new() }
    }
}

impl StrokeAttribute {
    pub fn new(color: Rgb, alpha: f32, right: f32, left: f32) -> Self {
        StrokeAttribute { color, alpha, thickness: [right, left], ..Default::default() }
    }

    /// Component-wise blend of `a` and `b`. Visibility comes from `a`; a user
    /// attribute survives only when both sides define it with the same kind.
    pub fn interpolate(a: &StrokeAttribute, b: &StrokeAttribute, t: f32) -> StrokeAttribute {
        let mut user = BTreeMap::new();
        for (name, va) in &a.user {
            if let Some(v) = b.user.get(name).and_then(|vb| UserAttribute::lerp(va, vb, t)) {
                user.insert(name.clone(), v);
            }
        }
        StrokeAttribute {
            color: Rgb::lerp(a.color, b.color, t),
            alpha: lerp_f32(a.alpha, b.alpha, t),
            thickness: [lerp_f32(a.thickness[0], b.thickness[0], t), lerp_f32(a.thickness[1], b.thickness[1], t)],
            visible: a.visible,
            user,
        }
    }

    pub fn color(&self) -> Rgb { self.color }
    pub fn set_color(&mut self, color: Rgb) { self.color = color; }
    pub fn alpha(&self) -> f32 { self.alpha }
    pub fn set_alpha(&mut self, alpha: f32) { self.alpha = alpha; }
    pub fn thickness(&self) -> [f32; 2] { self.thickness }
    pub fn thickness_right(&self) -> f32 { self.thickness[0] }
    pub fn thickness_left(&self) -> f32 { self.thickness[1] }
    pub fn set_thickness(&mut self, right: f32, left: f32) { self.thickness = [right, left]; }
    pub fn visible(&self) -> bool { self.visible }
    pub fn set_visible(&mut self, visible: bool) { self.visible = visible; }

    pub fn user_attributes(&self) -> &BTreeMap<String, UserAttribute> { &self.user }
    pub fn has_attribute(&self, name: &str) -> bool { self.user.contains_key(name) }
    pub fn set_attribute(&mut self, name: impl Into<String>, value: UserAttribute) {
        self.user.insert(name.into(), value);
    }

    pub fn attribute_real(&self, name: &str) -> Option<f32> {
        match self.user.get(name) {
            Some(UserAttribute::Real(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn attribute_vec2(&self, name: &str) -> Option<Vec2> {
        match self.user.get(name) {
            Some(UserAttribute::Vec2(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn attribute_vec3(&self, name: &str) -> Option<Vec3> {
        match self.user.get(name) {
            Some(UserAttribute::Vec3(v)) => Some(*v),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StrokeVertex {
    curve_point: CurvePoint,
    attribute: StrokeAttribute,
    curvilinear_abscissa: f64,
    stroke_length: f64,
}

impl StrokeVertex {
    pub fn from_curve_point(cp: CurvePoint) -> Self {
        StrokeVertex { curve_point: cp, attribute: StrokeAttribute::default(), curvilinear_abscissa: 0.0, stroke_length: 0.0 }
    }

    pub fn from_svertex(sv: SVertex) -> Self { Self::from_curve_point(CurvePoint::from_svertex(sv)) }

    /// Vertex at `t` between `a` and `b`. The position blends the two current
    /// (possibly displaced) positions; the parametrisation follows the
    /// underlying curve points.
    pub fn interpolate(a: &StrokeVertex, b: &StrokeVertex, t: f32) -> Result<Self, CurveError> {
        let mut cp = CurvePoint::between(&a.curve_point, &b.curve_point, t)?;
        cp.set_point(Vec2::lerp(a.point(), b.point(), t as f64));
        let tt = t as f64;
        Ok(StrokeVertex {
            curve_point: cp,
            attribute: StrokeAttribute::interpolate(&a.attribute, &b.attribute, t),
            curvilinear_abscissa: (1.0 - tt) * a.curvilinear_abscissa + tt * b.curvilinear_abscissa,
            stroke_length: a.stroke_length,
        })
    }

    pub fn curve_point(&self) -> &CurvePoint { &self.curve_point }
    pub fn point(&self) -> Vec2 { self.curve_point.point() }
    pub fn x(&self) -> f64 { self.curve_point.point_2d().x }
    pub fn y(&self) -> f64 { self.curve_point.point_2d().y }
    pub fn set_point(&mut self, p: Vec2) { self.curve_point.set_point(p); }
    pub fn point_2d(&self) -> Vec3 { self.curve_point.point_2d() }
    pub fn point_3d(&self) -> Vec3 { self.curve_point.point_3d() }

    pub fn attribute(&self) -> &StrokeAttribute { &self.attribute }
    pub fn attribute_mut(&mut self) -> &mut StrokeAttribute { &mut self.attribute }
    pub fn set_attribute(&mut self, attribute: StrokeAttribute) { self.attribute = attribute; }

    pub fn curvilinear_abscissa(&self) -> f64 { self.curvilinear_abscissa }
    pub fn set_curvilinear_abscissa(&mut self, s: f64) { self.curvilinear_abscissa = s; }
    pub fn stroke_length(&self) -> f64 { self.stroke_length }
    pub fn set_stroke_length(&mut self, l: f64) { self.stroke_length = l; }

    /// Normalised abscissa in [0, 1].
    pub fn u(&self) -> f64 {
        if self.stroke_length > 0.0 { self.curvilinear_abscissa / self.stroke_length } else { 0.0 }
    }
}

// Resampling plan for one segment of the stroke.
#[derive(Clone, Copy, Debug)]
struct SegmentPlan {
    length: f64,
    n: usize,
    sampling: f64,
    resampled: bool,
}

pub const MAX_TEXTURE_SLOTS: usize = 18;

#[derive(Clone, Debug)]
pub struct Stroke {
    id: Id,
    vertices: Vec<StrokeVertex>,
    length: f64,
    sampling: f32,
    medium_type: MediumType,
    texture_id: u32,
    texture_step: f32,
    texture_slots: Vec<u32>,
    tips: bool,
    beginning_orientation: Vec2,
    end_orientation: Vec2,
}

impl Default for Stroke {
    fn default() -> Self {
        Stroke {
            id: Id::default(),
            vertices: Vec::new(),
            length: 0.0,
            sampling: f32::MAX,
            medium_type: MediumType::Opaque,
            texture_id: 0,
            texture_step: 1.0,
            texture_slots: Vec::new(),
            tips: false,
            beginning_orientation: Vec2::ZERO,
            end_orientation: Vec2::ZERO,
        }
    }
}

impl Stroke {
    pub fn new(id: Id) -> Self { Stroke { id, ..Default::default() } }

    /// Builds a stroke through the given picture-plane points, with
    /// consistent abscissae and length.
    pub fn from_points(id: Id, points: &[Vec2]) -> Self {
        let mut stroke = Stroke::new(id);
        for (i, p) in points.iter().enumerate() {
            let pos = Vec3::new(p.x, p.y, 0.0);
            stroke.push_back(StrokeVertex::from_svertex(SVertex::new(i as u32, pos, pos)));
        }
        stroke.update_length();
        stroke
    }

    pub fn id(&self) -> Id { self.id }
    pub fn set_id(&mut self, id: Id) { self.id = id; }

    // Does not touch the cached length.
    pub fn push_back(&mut self, v: StrokeVertex) { self.vertices.push(v); }

    pub fn len(&self) -> usize { self.vertices.len() }
    pub fn is_empty(&self) -> bool { self.vertices.is_empty() }
    pub fn vertices(&self) -> &[StrokeVertex] { &self.vertices }
    pub fn vertices_mut(&mut self) -> &mut [StrokeVertex] { &mut self.vertices }
    pub fn vertex(&self, i: usize) -> Option<&StrokeVertex> { self.vertices.get(i) }
    pub fn vertex_mut(&mut self, i: usize) -> Option<&mut StrokeVertex> { self.vertices.get_mut(i) }

    pub fn vertices_begin(&self) -> Interface0DIterator<'_> {
        Interface0DIterator::Stroke(StrokeVertexIter::begin(&self.vertices))
    }

    pub fn vertices_end(&self) -> Interface0DIterator<'_> {
        Interface0DIterator::Stroke(StrokeVertexIter::end(&self.vertices))
    }

    pub fn length_2d(&self) -> f64 { self.length }

    /// Sets the cached length on the stroke and on every vertex.
    pub fn set_length(&mut self, length: f64) {
        self.length = length;
        for v in &mut self.vertices {
            v.stroke_length = length;
        }
    }

    /// Recomputes abscissae and length from the current positions. Required
    /// after any direct vertex displacement.
    pub fn update_length(&mut self) {
        let mut abscissa = 0.0;
        let mut previous = self.vertices.first().map(|v| v.point()).unwrap_or_default();
        for v in &mut self.vertices {
            let current = v.point();
            abscissa += (current - previous).norm();
            v.curvilinear_abscissa = abscissa;
            previous = current;
        }
        self.set_length(abscissa);
    }

    pub fn sampling(&self) -> f32 { self.sampling }

    /// Spacing that would give `n_vertices` vertices, or the current sampling
    /// when the stroke already has that many.
    pub fn compute_sampling(&self, n_vertices: usize) -> f32 {
        if n_vertices <= self.vertices.len() {
            return self.sampling;
        }
        (self.length / (n_vertices - self.vertices.len() + 1) as f64) as f32
    }

    /// Inserts vertices until the stroke has exactly `n` of them, spread over
    /// the segments in proportion to their length. On error the stroke is
    /// left untouched.
    pub fn resample_to_count(&mut self, n: usize) -> Result<usize, StrokeError> {
        let count = self.vertices.len();
        if n <= count {
            return Ok(0);
        }
        // Nothing to insert into
        if count < 2 {
            return Err(StrokeError::ResampleMismatch { target: n, planned: count });
        }
        let to_add = n - count;

        let mut plans: Vec<SegmentPlan> = self
            .vertices
            .windows(2)
            .map(|w| {
                let length = (w[1].point() - w[0].point()).norm();
                let n = if self.length > 0.0 {
                    (to_add as f64 * length / self.length).floor() as usize
                } else {
                    0
                };
                SegmentPlan { length, n, sampling: length / (n + 1) as f64, resampled: false }
            })
            .collect();
        let mut planned: usize = plans.iter().map(|p| p.n).sum();

        // Rounding can overshoot by a few; take them back from the densest segments.
        while planned > to_add {
            let Some(p) = plans.iter_mut().filter(|p| p.n > 0).max_by(|a, b| a.n.cmp(&b.n)) else { break };
            p.n -= 1;
            p.sampling = p.length / (p.n + 1) as f64;
            planned -= 1;
        }
        while planned < to_add {
            let candidate = plans
                .iter_mut()
                .filter(|p| !p.resampled && p.sampling > 0.0)
                .max_by(|a, b| a.length.total_cmp(&b.length));
            let Some(p) = candidate else { break };
            p.n += 1;
            p.sampling = p.length / (p.n + 1) as f64;
            p.resampled = true;
            planned += 1;
        }
        if planned != to_add {
            return Err(StrokeError::ResampleMismatch { target: n, planned: count + planned });
        }

        let mut out = Vec::with_capacity(n);
        let mut sampling = self.sampling as f64;
        for (i, plan) in plans.iter().enumerate() {
            let (a, b) = (&self.vertices[i], &self.vertices[i + 1]);
            out.push(a.clone());
            if plan.sampling > 0.0 && plan.sampling < sampling {
                sampling = plan.sampling;
            }
            let dt = if plan.length > 0.0 { plan.sampling / plan.length } else { 0.0 };
            let mut t = dt;
            for _ in 0..plan.n {
                out.push(StrokeVertex::interpolate(a, b, t as f32)?);
                t += dt;
            }
        }
        if let Some(last) = self.vertices.last() {
            out.push(last.clone());
        }
        self.vertices = out;
        self.sampling = sampling as f32;
        self.update_length();
        Ok(to_add)
    }

    /// Inserts vertices so that no two consecutive ones are further apart
    /// than `sampling`. Never coarsens: a spacing at or above the current
    /// sampling is ignored.
    pub fn resample(&mut self, sampling: f32) -> Result<(), StrokeError> {
        const LIMIT: f64 = 0.99;
        if sampling == 0.0 || sampling >= self.sampling {
            return Ok(());
        }
        let step = sampling as f64;
        let mut out = Vec::with_capacity(self.vertices.len());
        for w in self.vertices.windows(2) {
            out.push(w[0].clone());
            let norm = (w[1].point() - w[0].point()).norm();
            if norm <= step {
                continue;
            }
            let mut t = step / norm;
            while t < LIMIT {
                out.push(StrokeVertex::interpolate(&w[0], &w[1], t as f32)?);
                t += step / norm;
            }
        }
        if let Some(last) = self.vertices.last() {
            out.push(last.clone());
        }
        self.vertices = out;
        self.sampling = sampling;
        self.update_length();
        Ok(())
    }

    pub fn insert_vertex(&mut self, index: usize, v: StrokeVertex) {
        let index = index.min(self.vertices.len());
        self.vertices.insert(index, v);
        self.update_length();
    }

    pub fn remove_vertex(&mut self, index: usize) -> Option<StrokeVertex> {
        if index >= self.vertices.len() {
            return None;
        }
        let v = self.vertices.remove(index);
        self.update_length();
        Some(v)
    }

    pub fn remove_all_vertices(&mut self) {
        self.vertices.clear();
        self.length = 0.0;
    }

    pub fn scale_thickness(&mut self, factor: f32) {
        for v in &mut self.vertices {
            let [r, l] = v.attribute.thickness;
            v.attribute.set_thickness(r * factor, l * factor);
        }
    }

    pub fn medium_type(&self) -> MediumType { self.medium_type }
    pub fn set_medium_type(&mut self, m: MediumType) { self.medium_type = m; }
    pub fn texture_id(&self) -> u32 { self.texture_id }
    pub fn set_texture_id(&mut self, id: u32) { self.texture_id = id; }
    pub fn texture_step(&self) -> f32 { self.texture_step }
    pub fn set_texture_step(&mut self, step: f32) { self.texture_step = step; }
    pub fn texture_slots(&self) -> &[u32] { &self.texture_slots }
    pub fn tips(&self) -> bool { self.tips }
    pub fn set_tips(&mut self, tips: bool) { self.tips = tips; }
    pub fn beginning_orientation(&self) -> Vec2 { self.beginning_orientation }
    pub fn set_beginning_orientation(&mut self, o: Vec2) { self.beginning_orientation = o; }
    pub fn end_orientation(&self) -> Vec2 { self.end_orientation }
    pub fn set_end_orientation(&mut self, o: Vec2) { self.end_orientation = o; }

    /// Assigns a texture to the next free slot; false when all slots are taken.
    pub fn push_texture_slot(&mut self, texture_id: u32) -> bool {
        if self.texture_slots.len() >= MAX_TEXTURE_SLOTS {
            return false;
        }
        self.texture_slots.push(texture_id);
        true
    }

    pub fn has_tex(&self) -> bool { self.texture_id != 0 || !self.texture_slots.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight(n: usize, spacing: f64) -> Stroke {
        let pts: Vec<Vec2> = (0..n).map(|i| Vec2::new(i as f64 * spacing, 0.0)).collect();
        Stroke::from_points(Id::new(0, 0), &pts)
    }

    #[test]
    fn interpolation_is_exact_at_bounds() {
        let mut a = StrokeAttribute::new(Rgb::new(0.1, 0.7, 0.3), 0.35, 1.7, 0.3);
        let mut b = StrokeAttribute::new(Rgb::new(0.9, 0.2, 0.6), 0.8, 4.1, 2.9);
        a.set_attribute("w", UserAttribute::Real(0.3));
        b.set_attribute("w", UserAttribute::Real(0.9));
        let at0 = StrokeAttribute::interpolate(&a, &b, 0.0);
        let at1 = StrokeAttribute::interpolate(&a, &b, 1.0);
        assert_eq!(at0.color(), a.color());
        assert_eq!(at0.alpha(), a.alpha());
        assert_eq!(at0.thickness(), a.thickness());
        assert_eq!(at1.color(), b.color());
        assert_eq!(at1.alpha(), b.alpha());
        assert_eq!(at1.thickness(), b.thickness());
        assert_eq!(at1.attribute_real("w"), Some(0.9));
    }

    #[test]
    fn mismatched_user_attributes_are_dropped() {
        let mut a = StrokeAttribute::default();
        let mut b = StrokeAttribute::default();
        a.set_attribute("x", UserAttribute::Real(1.0));
        a.set_attribute("dir", UserAttribute::Vec2(Vec2::new(1.0, 0.0)));
        b.set_attribute("y", UserAttribute::Real(2.0));
        b.set_attribute("dir", UserAttribute::Real(3.0));
        let m = StrokeAttribute::interpolate(&a, &b, 0.5);
        assert!(m.user_attributes().is_empty());
        b.set_attribute("x", UserAttribute::Real(3.0));
        let m = StrokeAttribute::interpolate(&a, &b, 0.5);
        assert_eq!(m.attribute_real("x"), Some(2.0));
        assert_eq!(m.user_attributes().len(), 1);
    }

    #[test]
    fn resample_count_hits_target_and_is_idempotent() {
        let mut s = straight(3, 5.0);
        assert_eq!(s.resample_to_count(11), Ok(8));
        assert_eq!(s.len(), 11);
        assert_eq!(s.resample_to_count(11), Ok(0));
        assert_eq!(s.resample_to_count(4), Ok(0));
        assert_eq!(s.len(), 11);
        assert!((s.length_2d() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn resample_count_fails_on_stale_length() {
        let mut s = straight(3, 1.0);
        s.set_length(1e9);
        let before = s.vertices().to_vec();
        assert!(matches!(s.resample_to_count(10), Err(StrokeError::ResampleMismatch { .. })));
        assert_eq!(s.vertices(), &before[..]);
    }

    #[test]
    fn resample_count_needs_a_segment() {
        let mut s = straight(1, 1.0);
        assert_eq!(s.resample_to_count(5), Err(StrokeError::ResampleMismatch { target: 5, planned: 1 }));
        assert_eq!(s.len(), 1);
        assert_eq!(s.resample_to_count(1), Ok(0));

        let mut empty = straight(0, 1.0);
        assert_eq!(empty.resample_to_count(3), Err(StrokeError::ResampleMismatch { target: 3, planned: 0 }));
        assert!(empty.vertices().is_empty());
    }

    #[test]
    fn resample_by_spacing() {
        let mut s = straight(2, 10.0);
        s.resample(3.0).unwrap();
        // 0, 3, 6, 9, 10
        assert_eq!(s.len(), 5);
        assert_eq!(s.sampling(), 3.0);
        let n = s.len();
        s.resample(5.0).unwrap();
        assert_eq!(s.len(), n);
        // The 0.99 margin keeps a near-duplicate off the far end
        let mut s = straight(2, 10.0);
        s.resample(2.0).unwrap();
        let xs: Vec<f64> = s.vertices().iter().map(|v| v.x()).collect();
        assert_eq!(xs.len(), 6);
        assert_eq!(*xs.last().unwrap(), 10.0);
    }

    #[test]
    fn update_length_after_edits() {
        let mut s = straight(4, 1.0);
        s.vertices_mut()[3].set_point(Vec2::new(2.0, 2.0));
        s.update_length();
        assert_eq!(s.length_2d(), 4.0);
        assert_eq!(s.vertices()[3].u(), 1.0);
        let removed = s.remove_vertex(1).unwrap();
        assert_eq!(removed.x(), 1.0);
        assert_eq!(s.length_2d(), 4.0);
        assert!(s.remove_vertex(9).is_none());
    }

    #[test]
    fn compute_sampling_spreads_length() {
        let s = straight(3, 2.0);
        assert_eq!(s.compute_sampling(2), f32::MAX);
        assert_eq!(s.compute_sampling(5), 4.0 / 3.0);
    }
}
