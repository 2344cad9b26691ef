// Curvature-diffusion smoothing of a stroke backbone.

use crate::geometry::tolerance::{edge_stopping, M_EPSILON};
use crate::model::Vec2;
use crate::stroke::Stroke;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingParams {
    pub iterations: u32,
    pub factor_point: f64,
    pub factor_curvature: f64,
    pub factor_curvature_difference: f64,
    pub aniso_point: f64,
    pub aniso_normal: f64,
    pub aniso_curvature: f64,
    pub caricature_factor: f64,
}

impl Default for SmoothingParams {
    fn default() -> Self {
        SmoothingParams {
            iterations: 100,
            factor_point: 0.1,
            factor_curvature: 0.0,
            factor_curvature_difference: 0.2,
            aniso_point: 0.0,
            aniso_normal: 0.0,
            aniso_curvature: 0.0,
            caricature_factor: 1.0,
        }
    }
}

/// Working copy of a stroke's positions with per-vertex curvature and normal.
pub struct Smoother {
    vertex: Vec<Vec2>,
    curvature: Vec<f64>,
    normal: Vec<Vec2>,
    closed: bool,
    // Motion along the normal only on strokes with more than four vertices
    safe: bool,
}

impl Smoother {
    pub fn new(stroke: &Stroke) -> Self {
        let vertex: Vec<Vec2> = stroke.vertices().iter().map(|v| v.point()).collect();
        let n = vertex.len();
        let closed = match (vertex.first(), vertex.last()) {
            (Some(&a), Some(&b)) if n > 1 => (a - b).norm() < M_EPSILON,
            _ => false,
        };
        Smoother { vertex, curvature: vec![0.0; n], normal: vec![Vec2::ZERO; n], closed, safe: n > 4 }
    }

    pub fn is_closed(&self) -> bool { self.closed }

    /// Runs the iterations and writes the blended result back to `stroke`.
    pub fn smooth(&mut self, stroke: &mut Stroke, params: &SmoothingParams) {
        if self.vertex.len() < 3 {
            return;
        }
        for _ in 0..params.iterations {
            self.iteration(params);
        }
        if params.iterations > 0 {
            self.copy_vertices(stroke, params.caricature_factor);
        }
    }

    // Signed curvature at `b` with neighbours `a` and `c`, and the unit normal
    // it is measured along.
    fn local_curvature(a: Vec2, b: Vec2, c: Vec2) -> (f64, Vec2) {
        let ba = a - b;
        let bc = c - b;
        let (lba, lbc) = (ba.norm(), bc.norm());
        let (ba, bc) = (ba.normalized(), bc.normalized());
        let normal = (bc - ba).perp().normalized();
        let mut k = (ba + bc).dot(normal);
        if lba + lbc > M_EPSILON {
            k /= 0.5 * (lba + lbc);
        }
        (k, normal)
    }

    fn compute_curvature(&mut self) {
        let n = self.vertex.len();
        for i in 1..n - 1 {
            let (k, normal) = Self::local_curvature(self.vertex[i - 1], self.vertex[i], self.vertex[i + 1]);
            self.curvature[i] = k;
            self.normal[i] = normal;
        }
        self.curvature[0] = self.curvature[1];
        self.curvature[n - 1] = self.curvature[n - 2];
        self.normal[0] = (self.vertex[1] - self.vertex[0]).perp().normalized();
        self.normal[n - 1] = (self.vertex[n - 1] - self.vertex[n - 2]).perp().normalized();

        if self.closed {
            let (k, normal) = Self::local_curvature(self.vertex[n - 2], self.vertex[0], self.vertex[1]);
            self.curvature[0] = k;
            self.normal[0] = normal;
            self.curvature[n - 1] = k;
            self.normal[n - 1] = normal;
        }
    }

    fn motion(&self, params: &SmoothingParams, i: usize, prev: usize, next: usize) -> f64 {
        let k = self.curvature[i];
        let motion_normal = params.factor_curvature * k * edge_stopping(k, params.aniso_normal);
        let d1 = k - self.curvature[prev];
        let d2 = k - self.curvature[next];
        let motion_curvature = edge_stopping(d1, params.aniso_curvature)
            * edge_stopping(d2, params.aniso_curvature)
            * params.factor_curvature_difference
            * 0.5
            * (d1 + d2);
        motion_normal + motion_curvature
    }

    // Moves vertex `i` toward its neighbours, each pull damped by the
    // length of the opposite segment.
    fn attract(&self, params: &SmoothingParams, i: usize, prev: usize, next: usize) -> Vec2 {
        let v = self.vertex[i];
        let d1 = (self.vertex[prev] - v).norm();
        let d2 = (self.vertex[next] - v).norm();
        v + params.factor_point * edge_stopping(d2, params.aniso_point) * (self.vertex[prev] - v)
            + params.factor_point * edge_stopping(d1, params.aniso_point) * (self.vertex[next] - v)
    }

    fn iteration(&mut self, params: &SmoothingParams) {
        self.compute_curvature();
        let n = self.vertex.len();
        for i in 1..n - 1 {
            let motion = self.motion(params, i, i - 1, i + 1);
            self.vertex[i] = self.attract(params, i, i - 1, i + 1);
            if self.safe {
                self.vertex[i] += motion * self.normal[i];
            }
        }
        if self.closed {
            let motion = self.motion(params, 0, n - 2, 1);
            self.vertex[0] = self.attract(params, 0, n - 2, 1);
            if self.safe {
                self.vertex[0] += motion * self.normal[0];
            }
            self.vertex[n - 1] = self.vertex[0];
        }
    }

    fn copy_vertices(&self, stroke: &mut Stroke, caricature: f64) {
        for (v, &p1) in stroke.vertices_mut().iter_mut().zip(&self.vertex) {
            let p0 = v.point();
            v.set_point(p0 + caricature * (p1 - p0));
        }
        stroke.update_length();
    }
}
