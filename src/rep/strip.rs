// Stripification: a run of stroke vertices turned into a textured ribbon of
// rail point pairs, two per backbone vertex.

use crate::geometry::intersect::{intersect_lines, LineIntersection};
use crate::geometry::tolerance::{
    is_sane_coord, EPS_ORIENTATION, EPS_SINGULARITY_RENDERER, MAX_RATIO_LENGTH_SINGU, ZERO,
};
use crate::model::{lerp_f32, Rgb, Vec2};
use crate::stroke::StrokeVertex;
use serde::Serialize;

/// User attribute overriding the rail direction of a vertex.
pub const ORIENTATION_ATTRIBUTE: &str = "orientation";

// Texture rows of the tip-aware layout, as [upper, lower] v coordinates
const BODY_ROW: [f64; 2] = [0.0, 0.5];
const TIP_ROW: [f64; 2] = [0.5, 1.0];
const TIP_EXTENT: f64 = 0.25;

/// One rail point of a strip.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StrokeVertexRep {
    point: Vec2,
    tex_coord: Vec2,
    tex_coord_tips: Vec2,
    color: Rgb,
    alpha: f32,
}

impl StrokeVertexRep {
    pub fn new(point: Vec2) -> Self {
        StrokeVertexRep { point, tex_coord: Vec2::ZERO, tex_coord_tips: Vec2::ZERO, color: Rgb::BLACK, alpha: 1.0 }
    }

    pub fn point(&self) -> Vec2 { self.point }
    pub fn set_point(&mut self, p: Vec2) { self.point = p; }
    /// Coordinate stretching the texture along the whole stroke.
    pub fn tex_coord(&self) -> Vec2 { self.tex_coord }
    /// Coordinate in the tiled layout with begin and end caps.
    pub fn tex_coord_tips(&self) -> Vec2 { self.tex_coord_tips }
    pub fn color(&self) -> Rgb { self.color }
    pub fn alpha(&self) -> f32 { self.alpha }

    fn lerp(a: &StrokeVertexRep, b: &StrokeVertexRep, t: f64) -> StrokeVertexRep {
        StrokeVertexRep {
            point: Vec2::lerp(a.point, b.point, t),
            tex_coord: Vec2::lerp(a.tex_coord, b.tex_coord, t),
            tex_coord_tips: Vec2::lerp(a.tex_coord_tips, b.tex_coord_tips, t),
            color: Rgb::lerp(a.color, b.color, t as f32),
            alpha: lerp_f32(a.alpha, b.alpha, t as f32),
        }
    }
}

/// Ribbon geometry of consecutive stroke vertices. Vertex `2i` lies on the
/// upper rail and `2i + 1` on the lower rail of backbone vertex `i`; with
/// tips, four extra vertices are inserted at each cap boundary.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Strip {
    vertices: Vec<StrokeVertexRep>,
    average_thickness: f64,
}

impl Strip {
    /// Builds the strip of `vertices`. `begin_tip` and `end_tip` reserve the
    /// cap regions of the tip-aware texture layout; `tex_step` scales the
    /// texture along the stroke.
    pub fn new(vertices: &[StrokeVertex], begin_tip: bool, end_tip: bool, tex_step: f32) -> Self {
        if vertices.len() < 2 {
            log::debug!("strip has less than 2 vertices");
            return Strip::default();
        }
        let (mut reps, average_thickness) = create_rails(vertices);
        clean_up_singularities(&mut reps, vertices);
        let spaced = average_thickness * tex_step as f64;
        compute_tex_coords(&mut reps, vertices, spaced);
        let reps = compute_tex_coords_with_tips(reps, vertices, spaced, begin_tip, end_tip);
        Strip { vertices: reps, average_thickness }
    }

    pub fn vertices(&self) -> &[StrokeVertexRep] { &self.vertices }
    pub fn len(&self) -> usize { self.vertices.len() }
    pub fn is_empty(&self) -> bool { self.vertices.is_empty() }
    pub fn average_thickness(&self) -> f64 { self.average_thickness }
}

#[inline]
fn is_valid(p: Vec2) -> bool { is_sane_coord(p.x) && is_sane_coord(p.y) }

#[inline]
fn unit_if_long(v: Vec2) -> Vec2 {
    if v.norm() > ZERO { v.normalized() } else { v }
}

// Rail direction at `v`: the user orientation when set, flipped to agree
// with `orth`; otherwise `orth` itself.
fn strip_direction(v: &StrokeVertex, orth: Vec2, errors: &mut usize) -> Vec2 {
    match v.attribute().attribute_vec2(ORIENTATION_ATTRIBUTE) {
        Some(user) if user.norm() > EPS_ORIENTATION => {
            let user = user.normalized();
            if user.dot(orth) < 0.0 { -user } else { user }
        }
        Some(_) => {
            *errors += 1;
            orth
        }
        None => orth,
    }
}

fn thickness(v: &StrokeVertex) -> (f64, f64) {
    let [right, left] = v.attribute().thickness();
    (right as f64, left as f64)
}

fn push_rails(reps: &mut Vec<StrokeVertexRep>, p: Vec2, right: f64, left: f64, dir: Vec2) {
    reps.push(StrokeVertexRep::new(p + dir * left));
    reps.push(StrokeVertexRep::new(p - dir * right));
}

// Corner of the rails offset by `off_prev` along the incoming segment and by
// `off` along the outgoing one; the plain offset when they are parallel.
fn rail_corner(p_prev: Vec2, p: Vec2, p_next: Vec2, off_prev: Vec2, off: Vec2) -> Vec2 {
    match intersect_lines(p_prev + off_prev, p + off_prev, p + off, p_next + off) {
        LineIntersection::At(x) => x,
        LineIntersection::Colinear => p + off,
    }
}

fn create_rails(vertices: &[StrokeVertex]) -> (Vec<StrokeVertexRep>, f64) {
    let n = vertices.len();
    let mut reps = Vec::with_capacity(2 * n);
    let mut orientation_errors = 0;

    let first = &vertices[0];
    let orth = unit_if_long((vertices[1].point() - first.point()).perp());
    let dir = strip_direction(first, orth, &mut orientation_errors);
    let (right_first, left_first) = thickness(first);
    push_rails(&mut reps, first.point(), right_first, left_first, dir);

    let mut thickness_sum = 0.0;
    for w in vertices.windows(3) {
        let (prev, v, next) = (&w[0], &w[1], &w[2]);
        let (p_prev, p, p_next) = (prev.point(), v.point(), next.point());

        let seg = p_next - p;
        let seg_norm = seg.norm();
        let seg_dir = seg.normalized();
        let strip_dir = strip_direction(v, seg_dir.perp(), &mut orientation_errors);

        let seg_prev = p - p_prev;
        let seg_prev_norm = seg_prev.norm();
        let strip_dir_prev = strip_direction(prev, seg_prev.normalized().perp(), &mut orientation_errors);

        let (right, left) = thickness(v);
        thickness_sum += right + left;
        let mut upper = rail_corner(p_prev, p, p_next, strip_dir_prev * left, strip_dir * left);
        let mut lower = rail_corner(p_prev, p, p_next, strip_dir_prev * -right, strip_dir * -right);

        // Bisecting direction, the fallback at degenerate corners
        let sum = strip_dir + strip_dir_prev;
        let degenerate = seg_norm < ZERO || seg_prev_norm < ZERO;
        let bisector = if degenerate || sum.norm() < ZERO { Vec2::ZERO } else { sum.normalized() };
        let singular = degenerate || bisector.dot(seg_dir).abs() < EPS_SINGULARITY_RENDERER;

        if singular || !is_valid(upper) || (upper - p).norm() > left * MAX_RATIO_LENGTH_SINGU {
            upper = p + bisector * left;
        }
        if singular || !is_valid(lower) || (lower - p).norm() > right * MAX_RATIO_LENGTH_SINGU {
            lower = p - bisector * right;
        }
        reps.push(StrokeVertexRep::new(upper));
        reps.push(StrokeVertexRep::new(lower));
    }

    let last = &vertices[n - 1];
    let orth = unit_if_long((last.point() - vertices[n - 2].point()).perp());
    let dir = strip_direction(last, orth, &mut orientation_errors);
    let (right_last, left_last) = thickness(last);
    push_rails(&mut reps, last.point(), right_last, left_last, dir);

    // The ends do not count toward the average
    let average = if n < 3 {
        0.5 * (right_first + left_first + right_last + left_last)
    } else {
        thickness_sum / (n - 2) as f64
    };

    if orientation_errors > 0 {
        log::debug!("{} vertices have a null user orientation", orientation_errors);
    }
    (reps, average)
}

/// Collapses runs of rail points that move against the backbone onto their
/// mean. A run still open at the last segment is averaged without the rail
/// point of the last vertex.
pub fn clean_up_singularities(reps: &mut [StrokeVertexRep], vertices: &[StrokeVertex]) {
    if let Some(k) = reps.iter().position(|r| !is_valid(r.point)) {
        log::debug!("strip vertex {} is not valid", k);
        return;
    }
    let n = vertices.len();
    if n < 2 || reps.len() != 2 * n {
        log::debug!("strip has {} vertices for {} stroke vertices", reps.len(), n);
        return;
    }

    // Consecutive reversed segments seen so far, per rail
    let mut since = [0usize; 2];
    for i in 0..n - 1 {
        let dir = unit_if_long(vertices[i + 1].point() - vertices[i].point());
        for side in 0..2 {
            let step = reps[2 * i + 2 + side].point - reps[2 * i + side].point;
            if step.dot(dir) < -ZERO {
                since[side] += 1;
            } else if since[side] > 0 {
                average_rail(reps, side, i - since[side]..i + 1);
                since[side] = 0;
            }
        }
    }
    let i = n - 1;
    for side in 0..2 {
        if since[side] > 0 {
            average_rail(reps, side, i - since[side]..i);
        }
    }
}

fn average_rail(reps: &mut [StrokeVertexRep], side: usize, range: std::ops::Range<usize>) {
    let count = range.len();
    if count == 0 {
        return;
    }
    let mut sum = Vec2::ZERO;
    for j in range.clone() {
        sum += reps[2 * j + side].point;
    }
    let mean = sum / count as f64;
    for j in range {
        reps[2 * j + side].point = mean;
    }
}

fn compute_tex_coords(reps: &mut [StrokeVertexRep], vertices: &[StrokeVertex], spaced: f64) {
    for (pair, v) in reps.chunks_exact_mut(2).zip(vertices) {
        let u = if spaced > 0.0 { v.curvilinear_abscissa() / spaced } else { 0.0 };
        for (k, rep) in pair.iter_mut().enumerate() {
            rep.tex_coord = Vec2::new(u, k as f64);
            rep.color = v.attribute().color();
            rep.alpha = v.attribute().alpha();
        }
    }
}

// Splits the stroke into a whole number of tiles. With a begin tip, the
// first quarter tile maps to the cap row; with an end tip, so does the last.
// Each cap boundary crossed between two vertices gets two interpolated pairs
// sharing a position: one on each side of the boundary.
fn compute_tex_coords_with_tips(
    reps: Vec<StrokeVertexRep>,
    vertices: &[StrokeVertex],
    spaced: f64,
    begin_tip: bool,
    end_tip: bool,
) -> Vec<StrokeVertexRep> {
    let length = vertices[0].stroke_length();
    let tiles = if spaced > 0.0 { (length / spaced).round().max(1.0) } else { 1.0 };
    let scale = if length > 0.0 { tiles / length } else { 0.0 };
    let begin_edge = TIP_EXTENT;
    let end_edge = tiles - TIP_EXTENT;

    let mut out = Vec::with_capacity(reps.len() + 8);
    let mut previous: Option<f64> = None;
    for (i, v) in vertices.iter().enumerate() {
        let u = v.curvilinear_abscissa() * scale;
        if let Some(pu) = previous {
            let (a, b) = (&reps[2 * i - 2..2 * i], &reps[2 * i..2 * i + 2]);
            if begin_tip && pu <= begin_edge && u > begin_edge {
                push_transition(&mut out, a, b, pu, u, begin_edge, [(TIP_EXTENT, TIP_ROW), (begin_edge, BODY_ROW)]);
            }
            if end_tip && pu <= end_edge && u > end_edge {
                push_transition(&mut out, a, b, pu, u, end_edge, [(end_edge, BODY_ROW), (1.0 - TIP_EXTENT, TIP_ROW)]);
            }
        }
        let (tu, row) = if begin_tip && u <= begin_edge {
            (u, TIP_ROW)
        } else if end_tip && u > end_edge {
            (u - tiles + 1.0, TIP_ROW)
        } else {
            (u, BODY_ROW)
        };
        for k in 0..2 {
            let mut rep = reps[2 * i + k].clone();
            rep.tex_coord_tips = Vec2::new(tu, row[k]);
            out.push(rep);
        }
        previous = Some(u);
    }
    out
}

fn push_transition(
    out: &mut Vec<StrokeVertexRep>,
    a: &[StrokeVertexRep],
    b: &[StrokeVertexRep],
    ua: f64,
    ub: f64,
    edge: f64,
    sides: [(f64, [f64; 2]); 2],
) {
    let t = if (ub - ua).abs() > ZERO { (edge - ua) / (ub - ua) } else { 0.0 };
    for (tu, row) in sides {
        for k in 0..2 {
            let mut rep = StrokeVertexRep::lerp(&a[k], &b[k], t);
            rep.tex_coord_tips = Vec2::new(tu, row[k]);
            out.push(rep);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Id;
    use crate::stroke::{Stroke, UserAttribute};

    fn stroke(points: &[(f64, f64)], right: f32, left: f32) -> Stroke {
        let pts: Vec<Vec2> = points.iter().map(|&(x, y)| Vec2::new(x, y)).collect();
        let mut s = Stroke::from_points(Id::default(), &pts);
        for v in s.vertices_mut() {
            v.attribute_mut().set_thickness(right, left);
        }
        s
    }

    fn close(a: Vec2, b: Vec2) -> bool { (a - b).norm() < 1e-9 }

    #[test]
    fn two_vertices_give_plain_offsets() {
        let s = stroke(&[(0.0, 0.0), (4.0, 0.0)], 1.0, 3.0);
        let strip = Strip::new(s.vertices(), false, false, 1.0);
        assert_eq!(strip.len(), 4);
        let pts: Vec<Vec2> = strip.vertices().iter().map(|r| r.point()).collect();
        assert_eq!(pts, vec![Vec2::new(0.0, 3.0), Vec2::new(0.0, -1.0), Vec2::new(4.0, 3.0), Vec2::new(4.0, -1.0)]);
        assert_eq!(strip.average_thickness(), 4.0);
    }

    #[test]
    fn straight_line_rails_are_exact() {
        let s = stroke(&[(0.0, 0.0), (1.0, 0.0), (2.5, 0.0), (4.0, 0.0)], 2.0, 2.0);
        let strip = Strip::new(s.vertices(), false, false, 1.0);
        assert_eq!(strip.len(), 8);
        for (pair, v) in strip.vertices().chunks(2).zip(s.vertices()) {
            assert_eq!(pair[0].point(), Vec2::new(v.x(), 2.0));
            assert_eq!(pair[1].point(), Vec2::new(v.x(), -2.0));
        }
    }

    #[test]
    fn corner_rails_meet_at_the_offset_intersection() {
        let s = stroke(&[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0)], 0.5, 0.5);
        let strip = Strip::new(s.vertices(), false, false, 1.0);
        let v = strip.vertices();
        assert!(close(v[2].point(), Vec2::new(1.5, 0.5)));
        assert!(close(v[3].point(), Vec2::new(2.5, -0.5)));
        assert!(close(v[4].point(), Vec2::new(1.5, 2.0)));
    }

    #[test]
    fn average_thickness_skips_the_ends() {
        let mut s = stroke(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)], 5.0, 5.0);
        s.vertices_mut()[1].attribute_mut().set_thickness(1.0, 3.0);
        let strip = Strip::new(s.vertices(), false, false, 1.0);
        assert_eq!(strip.average_thickness(), 4.0);
    }

    #[test]
    fn stretch_coordinates_follow_abscissa() {
        let s = stroke(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0)], 1.0, 1.0);
        let strip = Strip::new(s.vertices(), false, false, 1.0);
        let us: Vec<f64> = strip.vertices().iter().step_by(2).map(|r| r.tex_coord().x).collect();
        assert_eq!(us, vec![0.0, 0.5, 1.0, 1.5]);
        assert_eq!(strip.vertices()[0].tex_coord().y, 0.0);
        assert_eq!(strip.vertices()[1].tex_coord().y, 1.0);
    }

    #[test]
    fn user_orientation_replaces_the_normal() {
        let mut s = stroke(&[(0.0, 0.0), (4.0, 0.0)], 1.0, 1.0);
        s.vertices_mut()[0].attribute_mut().set_attribute(ORIENTATION_ATTRIBUTE, UserAttribute::Vec2(Vec2::new(-1.0, -1.0)));
        let strip = Strip::new(s.vertices(), false, false, 1.0);
        let h = std::f64::consts::FRAC_1_SQRT_2;
        // Flipped to agree with the upward normal
        assert!(close(strip.vertices()[0].point(), Vec2::new(h, h)));
        assert!(close(strip.vertices()[1].point(), Vec2::new(-h, -h)));
    }

    #[test]
    fn reversed_rail_run_collapses_to_its_mean() {
        let s = stroke(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)], 1.0, 1.0);
        let mut reps: Vec<StrokeVertexRep> = [(0.0, 1.0), (0.0, -1.0), (-0.5, 1.0), (1.0, -1.0), (2.0, 1.0), (2.0, -1.0)]
            .iter()
            .map(|&(x, y)| StrokeVertexRep::new(Vec2::new(x, y)))
            .collect();
        clean_up_singularities(&mut reps, s.vertices());
        assert_eq!(reps[0].point(), Vec2::new(-0.25, 1.0));
        assert_eq!(reps[2].point(), Vec2::new(-0.25, 1.0));
        assert_eq!(reps[4].point(), Vec2::new(2.0, 1.0));
        assert_eq!(reps[3].point(), Vec2::new(1.0, -1.0));
    }

    #[test]
    fn trailing_reversal_excludes_the_last_vertex() {
        let s = stroke(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)], 1.0, 1.0);
        let mut reps: Vec<StrokeVertexRep> = [(0.0, 1.0), (0.0, -1.0), (1.0, 1.0), (1.0, -1.0), (0.5, 1.0), (2.0, -1.0)]
            .iter()
            .map(|&(x, y)| StrokeVertexRep::new(Vec2::new(x, y)))
            .collect();
        clean_up_singularities(&mut reps, s.vertices());
        assert_eq!(reps[2].point(), Vec2::new(1.0, 1.0));
        assert_eq!(reps[4].point(), Vec2::new(0.5, 1.0));
    }

    #[test]
    fn tips_insert_transition_vertices() {
        let s = stroke(&[(0.0, 0.0), (10.0, 0.0)], 1.0, 1.0);
        let strip = Strip::new(s.vertices(), true, true, 1.0);
        // Average thickness 2 gives five tiles over a length of 10
        assert_eq!(strip.len(), 12);
        let v = strip.vertices();
        assert_eq!(v[0].tex_coord_tips(), Vec2::new(0.0, 0.5));
        assert_eq!(v[1].tex_coord_tips(), Vec2::new(0.0, 1.0));
        assert_eq!(v[2].tex_coord_tips(), Vec2::new(0.25, 0.5));
        assert_eq!(v[4].tex_coord_tips(), Vec2::new(0.25, 0.0));
        assert!(close(v[2].point(), Vec2::new(0.5, 1.0)));
        assert_eq!(v[2].point(), v[4].point());
        assert_eq!(v[6].tex_coord_tips(), Vec2::new(4.75, 0.0));
        assert_eq!(v[8].tex_coord_tips(), Vec2::new(0.75, 0.5));
        assert!(close(v[8].point(), Vec2::new(9.5, 1.0)));
        assert_eq!(v[10].tex_coord_tips(), Vec2::new(1.0, 0.5));
        assert_eq!(v[11].tex_coord_tips(), Vec2::new(1.0, 1.0));
    }

    #[test]
    fn single_vertex_gives_an_empty_strip() {
        let s = stroke(&[(0.0, 0.0)], 1.0, 1.0);
        assert!(Strip::new(s.vertices(), false, false, 1.0).is_empty());
    }
}
