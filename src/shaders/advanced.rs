// Shaders with parameter sets: calligraphic thickness, spatial noise and
// curvature smoothing.

use super::basic::StrokeShader;
use crate::algorithms::smoother::{Smoother, SmoothingParams};
use crate::error::EvalError;
use crate::functions::vertex_orientation_2d;
use crate::geometry::pseudo_noise::{PseudoNoise, NB_VALUE_NOISE};
use crate::geometry::random;
use crate::model::{Rgb, Vec2};
use crate::stroke::Stroke;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalligraphicParams {
    pub min_thickness: f64,
    pub max_thickness: f64,
    pub orientation: Vec2,
    pub clamp: bool,
}

impl Default for CalligraphicParams {
    fn default() -> Self {
        CalligraphicParams { min_thickness: 1.0, max_thickness: 8.0, orientation: Vec2::new(1.0, 1.0), clamp: true }
    }
}

/// Thickness following the angle between the stroke normal and a fixed pen
/// orientation, like a broad nib. With `clamp`, vertices facing away from
/// the pen get the minimum thickness and turn white.
#[derive(Clone, Copy, Debug)]
pub struct CalligraphicShader {
    params: CalligraphicParams,
}

impl CalligraphicShader {
    pub fn new(mut params: CalligraphicParams) -> Self {
        params.orientation = params.orientation.normalized();
        CalligraphicShader { params }
    }
}

impl StrokeShader for CalligraphicShader {
    fn name(&self) -> &str { "CalligraphicShader" }

    fn shade(&mut self, stroke: &mut Stroke) -> Result<(), EvalError> {
        let p = &self.params;
        let mut facing = Vec::with_capacity(stroke.len());
        let mut it = stroke.vertices_begin();
        while !it.is_end() {
            let normal = vertex_orientation_2d(&it)?.perp().normalized();
            facing.push(normal.dot(p.orientation));
            it.increment();
        }
        for (v, scal) in stroke.vertices_mut().iter_mut().zip(facing) {
            let scal = if p.clamp && scal < 0.0 {
                v.attribute_mut().set_color(Rgb::new(1.0, 1.0, 1.0));
                0.0
            } else {
                scal.abs()
            };
            let thickness = (p.min_thickness + scal * (p.max_thickness - p.min_thickness)).max(0.0) as f32;
            v.attribute_mut().set_thickness(thickness / 2.0, thickness / 2.0);
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialNoiseParams {
    pub amount: f64,
    pub scale: f64,
    pub octaves: u32,
    pub smooth: bool,
    pub pure_random: bool,
    pub seed: u64,
}

impl Default for SpatialNoiseParams {
    fn default() -> Self {
        SpatialNoiseParams { amount: 1.0, scale: 1.0, octaves: 2, smooth: true, pure_random: false, seed: random::DEFAULT_SEED }
    }
}

/// Moves each vertex sideways by pseudo-noise of its curvilinear abscissa.
/// The side is the normal of the direction from the previous original
/// position.
#[derive(Clone, Debug)]
pub struct SpatialNoiseShader {
    params: SpatialNoiseParams,
    noise: PseudoNoise,
    rng: Pcg32,
}

impl SpatialNoiseShader {
    pub fn new(params: SpatialNoiseParams) -> Self {
        SpatialNoiseShader { params, noise: PseudoNoise::new(params.seed), rng: random::seeded(params.seed) }
    }
}

impl StrokeShader for SpatialNoiseShader {
    fn name(&self) -> &str { "SpatialNoiseShader" }

    fn shade(&mut self, stroke: &mut Stroke) -> Result<(), EvalError> {
        if stroke.len() < 2 {
            return Ok(());
        }
        let p = self.params;
        let vs = stroke.vertices();
        let first = vs[0].point();
        // Virtual predecessor mirrored ahead of the first vertex
        let mut previous = first + 2.0 * (first - vs[1].point());
        let mut init = stroke.length_2d() * NB_VALUE_NOISE as f64;
        if p.pure_random {
            init += random::unit(&mut self.rng) * NB_VALUE_NOISE as f64;
        }

        for v in stroke.vertices_mut() {
            let point = v.point();
            let dir = (point - previous).normalized();
            let s = p.scale * v.curvilinear_abscissa() + init;
            let n = if p.smooth {
                self.noise.turbulence_smooth(s, p.octaves)
            } else {
                self.noise.turbulence_linear(s, p.octaves)
            };
            v.set_point(point + dir.perp() * (p.amount * n));
            previous = point;
        }
        stroke.update_length();
        Ok(())
    }
}

/// Curvature-diffusion smoothing of the stroke backbone.
#[derive(Clone, Copy, Debug, Default)]
pub struct SmoothingShader {
    pub params: SmoothingParams,
}

impl StrokeShader for SmoothingShader {
    fn name(&self) -> &str { "SmoothingShader" }

    fn shade(&mut self, stroke: &mut Stroke) -> Result<(), EvalError> {
        Smoother::new(stroke).smooth(stroke, &self.params);
        Ok(())
    }
}
