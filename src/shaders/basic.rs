// Stroke shaders setting thickness, colour, sampling and geometry.

use crate::error::EvalError;
use crate::functions::vertex_orientation_2d;
use crate::geometry::noise::Noise;
use crate::geometry::pseudo_noise::{PseudoNoise, NB_VALUE_NOISE};
use crate::geometry::random;
use crate::model::{Rgb, Vec2};
use crate::stroke::Stroke;
use rand_pcg::Pcg32;

/// One stage of the stroke pipeline run by `create`.
pub trait StrokeShader {
    fn name(&self) -> &str;
    fn shade(&mut self, stroke: &mut Stroke) -> Result<(), EvalError>;
}

/// Same total thickness everywhere, split evenly between both sides.
#[derive(Clone, Copy, Debug)]
pub struct ConstantThicknessShader {
    pub thickness: f32,
}

impl StrokeShader for ConstantThicknessShader {
    fn name(&self) -> &str { "ConstantThicknessShader" }

    fn shade(&mut self, stroke: &mut Stroke) -> Result<(), EvalError> {
        let half = self.thickness / 2.0;
        for v in stroke.vertices_mut() {
            v.attribute_mut().set_thickness(half, half);
        }
        Ok(())
    }
}

/// Thickness growing from `min` at both ends to `max` in the middle.
#[derive(Clone, Copy, Debug)]
pub struct IncreasingThicknessShader {
    pub min: f32,
    pub max: f32,
}

impl StrokeShader for IncreasingThicknessShader {
    fn name(&self) -> &str { "IncreasingThicknessShader" }

    fn shade(&mut self, stroke: &mut Stroke) -> Result<(), EvalError> {
        let n = stroke.len().saturating_sub(1).max(1) as f32;
        for (i, v) in stroke.vertices_mut().iter_mut().enumerate() {
            let u = i as f32 / n;
            let t = if (i as f32) < n / 2.0 {
                (1.0 - u) * self.min + u * self.max
            } else {
                (1.0 - u) * self.max + u * self.min
            };
            v.attribute_mut().set_thickness(t / 2.0, t / 2.0);
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ConstantColorShader {
    pub color: Rgb,
    pub alpha: f32,
}

impl StrokeShader for ConstantColorShader {
    fn name(&self) -> &str { "ConstantColorShader" }

    fn shade(&mut self, stroke: &mut Stroke) -> Result<(), EvalError> {
        for v in stroke.vertices_mut() {
            v.attribute_mut().set_color(self.color);
            v.attribute_mut().set_alpha(self.alpha);
        }
        Ok(())
    }
}

/// Colour and alpha ramped linearly from the first vertex to the last.
#[derive(Clone, Copy, Debug)]
pub struct IncreasingColorShader {
    pub from: (Rgb, f32),
    pub to: (Rgb, f32),
}

impl StrokeShader for IncreasingColorShader {
    fn name(&self) -> &str { "IncreasingColorShader" }

    fn shade(&mut self, stroke: &mut Stroke) -> Result<(), EvalError> {
        let n = stroke.len().saturating_sub(1).max(1) as f32;
        for (i, v) in stroke.vertices_mut().iter_mut().enumerate() {
            let t = i as f32 / n;
            v.attribute_mut().set_color(Rgb::lerp(self.from.0, self.to.0, t));
            v.attribute_mut().set_alpha((1.0 - t) * self.from.1 + t * self.to.1);
        }
        Ok(())
    }
}

/// Resamples to at most `sampling` between consecutive vertices.
#[derive(Clone, Copy, Debug)]
pub struct SamplingShader {
    pub sampling: f32,
}

impl StrokeShader for SamplingShader {
    fn name(&self) -> &str { "SamplingShader" }

    fn shade(&mut self, stroke: &mut Stroke) -> Result<(), EvalError> {
        stroke.resample(self.sampling)?;
        Ok(())
    }
}

/// Resamples to exactly `count` vertices.
#[derive(Clone, Copy, Debug)]
pub struct ResampleCountShader {
    pub count: usize,
}

impl StrokeShader for ResampleCountShader {
    fn name(&self) -> &str { "ResampleCountShader" }

    fn shade(&mut self, stroke: &mut Stroke) -> Result<(), EvalError> {
        stroke.resample_to_count(self.count)?;
        Ok(())
    }
}

// Noise phase for one stroke: proportional to its length, plus a random
// offset inside the noise table.
fn noise_phase(stroke_length: f64, rng: &mut Pcg32) -> f64 {
    let n = NB_VALUE_NOISE as f64;
    stroke_length * n + random::unit(rng) * n
}

/// Adds pseudo-noise of amplitude `amplitude` and period `period` to both
/// sides of the thickness, independently.
#[derive(Clone, Debug)]
pub struct ThicknessNoiseShader {
    amplitude: f32,
    scale: f64,
    noise: PseudoNoise,
    rng: Pcg32,
}

impl ThicknessNoiseShader {
    pub fn new(amplitude: f32, period: f32, seed: u64) -> Self {
        ThicknessNoiseShader {
            amplitude,
            scale: 1.0 / period as f64 / NB_VALUE_NOISE as f64,
            noise: PseudoNoise::new(seed),
            rng: random::seeded(seed),
        }
    }
}

impl StrokeShader for ThicknessNoiseShader {
    fn name(&self) -> &str { "ThicknessNoiseShader" }

    fn shade(&mut self, stroke: &mut Stroke) -> Result<(), EvalError> {
        let length = stroke.length_2d();
        let init_r = noise_phase(length, &mut self.rng);
        let init_l = noise_phase(length, &mut self.rng);
        for v in stroke.vertices_mut() {
            let s = self.scale * v.curvilinear_abscissa();
            let noise_r = self.noise.turbulence_smooth(s + init_r, 2) as f32;
            let noise_l = self.noise.turbulence_smooth(s + init_l, 2) as f32;
            let [r, l] = v.attribute().thickness();
            v.attribute_mut().set_thickness(noise_r * self.amplitude + r, noise_l * self.amplitude + l);
        }
        Ok(())
    }
}

/// Adds the same pseudo-noise value to all three colour channels.
#[derive(Clone, Debug)]
pub struct ColorNoiseShader {
    amplitude: f32,
    scale: f64,
    noise: PseudoNoise,
    rng: Pcg32,
}

impl ColorNoiseShader {
    pub fn new(amplitude: f32, period: f32, seed: u64) -> Self {
        ColorNoiseShader {
            amplitude,
            scale: 1.0 / period as f64 / NB_VALUE_NOISE as f64,
            noise: PseudoNoise::new(seed),
            rng: random::seeded(seed),
        }
    }
}

impl StrokeShader for ColorNoiseShader {
    fn name(&self) -> &str { "ColorNoiseShader" }

    fn shade(&mut self, stroke: &mut Stroke) -> Result<(), EvalError> {
        let init = noise_phase(stroke.length_2d(), &mut self.rng);
        for v in stroke.vertices_mut() {
            let n = self.noise.turbulence_smooth(self.scale * v.curvilinear_abscissa() + init, 2) as f32 * self.amplitude;
            let c = v.attribute().color();
            v.attribute_mut().set_color(Rgb::new(c.r + n, c.g + n, c.b + n));
        }
        Ok(())
    }
}

/// Extends both ends of the stroke by `amount` along the end segments.
#[derive(Clone, Copy, Debug)]
pub struct BackboneStretcherShader {
    pub amount: f64,
}

impl StrokeShader for BackboneStretcherShader {
    fn name(&self) -> &str { "BackboneStretcherShader" }

    fn shade(&mut self, stroke: &mut Stroke) -> Result<(), EvalError> {
        let n = stroke.len();
        if n < 2 || stroke.length_2d() <= 1e-6 {
            return Ok(());
        }
        let vs = stroke.vertices_mut();
        let (first, second) = (vs[0].point(), vs[1].point());
        let (last, before_last) = (vs[n - 1].point(), vs[n - 2].point());
        vs[0].set_point(first + (first - second).normalized() * self.amount);
        vs[n - 1].set_point(last + (last - before_last).normalized() * self.amount);
        stroke.update_length();
        Ok(())
    }
}

/// Cuts `tip_length` off both ends, then resamples back to the original
/// vertex count and restores the original attributes in order.
#[derive(Clone, Copy, Debug)]
pub struct TipRemoverShader {
    pub tip_length: f64,
}

impl StrokeShader for TipRemoverShader {
    fn name(&self) -> &str { "TipRemoverShader" }

    fn shade(&mut self, stroke: &mut Stroke) -> Result<(), EvalError> {
        let original = stroke.len();
        if original < 4 {
            return Ok(());
        }
        let length = stroke.length_2d();
        let in_tip = |s: f64| s < self.tip_length || length - s < self.tip_length;
        let attributes: Vec<_> = stroke.vertices().iter().map(|v| v.attribute().clone()).collect();
        let removed = stroke.vertices().iter().filter(|v| in_tip(v.curvilinear_abscissa())).count();
        if original - removed < 2 {
            return Ok(());
        }

        let mut kept = stroke.clone();
        kept.remove_all_vertices();
        for v in stroke.vertices().iter().filter(|v| !in_tip(v.curvilinear_abscissa())) {
            kept.push_back(v.clone());
        }
        kept.update_length();
        kept.resample_to_count(original)?;
        if kept.len() != original {
            log::warn!("tip removal resampled stroke {} to {} vertices, expected {}", kept.id(), kept.len(), original);
        }
        for (v, a) in kept.vertices_mut().iter_mut().zip(attributes) {
            v.set_attribute(a);
        }
        kept.update_length();
        *stroke = kept;
        Ok(())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct TextureStepShader {
    pub step: f32,
}

impl StrokeShader for TextureStepShader {
    fn name(&self) -> &str { "TextureStepShader" }

    fn shade(&mut self, stroke: &mut Stroke) -> Result<(), EvalError> {
        stroke.set_texture_step(self.step);
        Ok(())
    }
}

// Unit normals of the stroke at each vertex, taken before any displacement.
pub(crate) fn vertex_normals(stroke: &Stroke) -> Result<Vec<Vec2>, EvalError> {
    let mut normals = Vec::with_capacity(stroke.len());
    let mut it = stroke.vertices_begin();
    while !it.is_end() {
        normals.push(vertex_orientation_2d(&it)?.perp());
        it.increment();
    }
    Ok(normals)
}

/// Displaces vertices along their normal by Perlin turbulence of the
/// curvilinear abscissa.
#[derive(Clone, Debug)]
pub struct PerlinNoise1DShader {
    freq: f64,
    amp: f64,
    octaves: u32,
    noise: Noise,
}

impl PerlinNoise1DShader {
    pub fn new(freq: f64, amp: f64, octaves: u32, seed: u64) -> Self {
        PerlinNoise1DShader { freq, amp, octaves, noise: Noise::new(seed) }
    }
}

impl StrokeShader for PerlinNoise1DShader {
    fn name(&self) -> &str { "PerlinNoise1DShader" }

    fn shade(&mut self, stroke: &mut Stroke) -> Result<(), EvalError> {
        let normals = vertex_normals(stroke)?;
        for (v, n) in stroke.vertices_mut().iter_mut().zip(normals) {
            let d = self.noise.turbulence1(v.curvilinear_abscissa(), self.freq, self.amp, self.octaves);
            let p = v.point();
            v.set_point(p + n * d);
        }
        stroke.update_length();
        Ok(())
    }
}

/// Displaces vertices along their normal by Perlin turbulence of their
/// position.
#[derive(Clone, Debug)]
pub struct PerlinNoise2DShader {
    freq: f64,
    amp: f64,
    octaves: u32,
    noise: Noise,
}

impl PerlinNoise2DShader {
    pub fn new(freq: f64, amp: f64, octaves: u32, seed: u64) -> Self {
        PerlinNoise2DShader { freq, amp, octaves, noise: Noise::new(seed) }
    }
}

impl StrokeShader for PerlinNoise2DShader {
    fn name(&self) -> &str { "PerlinNoise2DShader" }

    fn shade(&mut self, stroke: &mut Stroke) -> Result<(), EvalError> {
        let normals = vertex_normals(stroke)?;
        for (v, n) in stroke.vertices_mut().iter_mut().zip(normals) {
            let p = v.point();
            let d = self.noise.turbulence2(p, self.freq, self.amp, self.octaves);
            v.set_point(p + n * d);
        }
        stroke.update_length();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Id;

    fn straight(n: usize) -> Stroke {
        let pts: Vec<Vec2> = (0..n).map(|i| Vec2::new(i as f64, 0.0)).collect();
        Stroke::from_points(Id::default(), &pts)
    }

    #[test]
    fn increasing_thickness_peaks_in_the_middle() {
        let mut s = straight(5);
        IncreasingThicknessShader { min: 2.0, max: 6.0 }.shade(&mut s).unwrap();
        let t: Vec<f32> = s.vertices().iter().map(|v| v.attribute().thickness_right() * 2.0).collect();
        assert_eq!(t[0], 2.0);
        assert_eq!(t[2], 4.0);
        assert_eq!(t[4], 2.0);
        assert!(t[1] > t[0] && t[2] > t[1]);
    }

    #[test]
    fn increasing_color_ramps_alpha() {
        let mut s = straight(3);
        let mut shader = IncreasingColorShader { from: (Rgb::BLACK, 0.0), to: (Rgb::new(1.0, 1.0, 1.0), 1.0) };
        shader.shade(&mut s).unwrap();
        let alpha: Vec<f32> = s.vertices().iter().map(|v| v.attribute().alpha()).collect();
        assert_eq!(alpha, vec![0.0, 0.5, 1.0]);
        assert_eq!(s.vertices()[2].attribute().color(), Rgb::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn stretcher_moves_ends_outward() {
        let mut s = straight(3);
        BackboneStretcherShader { amount: 0.5 }.shade(&mut s).unwrap();
        assert_eq!(s.vertices()[0].x(), -0.5);
        assert_eq!(s.vertices()[2].x(), 2.5);
        assert_eq!(s.length_2d(), 3.0);
    }

    #[test]
    fn tip_remover_keeps_vertex_count() {
        let mut s = straight(6);
        ConstantColorShader { color: Rgb::new(0.2, 0.4, 0.6), alpha: 0.5 }.shade(&mut s).unwrap();
        TipRemoverShader { tip_length: 1.5 }.shade(&mut s).unwrap();
        assert_eq!(s.len(), 6);
        assert_eq!(s.vertices()[0].x(), 2.0);
        assert_eq!(s.vertices()[5].x(), 3.0);
        assert_eq!(s.vertices()[3].attribute().alpha(), 0.5);
    }

    #[test]
    fn noise_shaders_are_reproducible() {
        let mut a = straight(8);
        let mut b = straight(8);
        ThicknessNoiseShader::new(1.0, 4.0, 9).shade(&mut a).unwrap();
        ThicknessNoiseShader::new(1.0, 4.0, 9).shade(&mut b).unwrap();
        assert_eq!(a.vertices(), b.vertices());

        let mut c = straight(8);
        PerlinNoise1DShader::new(0.3, 2.0, 3, 1).shade(&mut c).unwrap();
        // Displacement is along the normal only
        assert!(c.vertices().iter().enumerate().all(|(i, v)| v.x() == i as f64));
    }
}
