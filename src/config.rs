// Shader pipelines described as JSON: one tagged object per stage, checked
// against `geometry::limits` before anything is built.

use crate::algorithms::smoother::SmoothingParams;
use crate::error::ConfigError;
use crate::geometry::limits;
use crate::geometry::random::DEFAULT_SEED;
use crate::model::Rgb;
use crate::shaders::advanced::{
    CalligraphicParams, CalligraphicShader, SmoothingShader, SpatialNoiseParams, SpatialNoiseShader,
};
use crate::shaders::basic::{
    BackboneStretcherShader, ColorNoiseShader, ConstantColorShader, ConstantThicknessShader, IncreasingColorShader,
    IncreasingThicknessShader, PerlinNoise1DShader, PerlinNoise2DShader, ResampleCountShader, SamplingShader,
    TextureStepShader, ThicknessNoiseShader, TipRemoverShader,
};
use crate::shaders::StrokeShader;
use serde::{Deserialize, Serialize};
use serde_json::Value;

fn default_seed() -> u64 { DEFAULT_SEED }
fn default_alpha() -> f32 { 1.0 }

/// One stage of a shader pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShaderSpec {
    ConstantThickness {
        thickness: f32,
    },
    IncreasingThickness {
        min: f32,
        max: f32,
    },
    ConstantColor {
        color: Rgb,
        #[serde(default = "default_alpha")]
        alpha: f32,
    },
    IncreasingColor {
        from: Rgb,
        #[serde(default = "default_alpha")]
        from_alpha: f32,
        to: Rgb,
        #[serde(default = "default_alpha")]
        to_alpha: f32,
    },
    Sampling {
        sampling: f32,
    },
    ResampleCount {
        count: usize,
    },
    ThicknessNoise {
        amplitude: f32,
        period: f32,
        #[serde(default = "default_seed")]
        seed: u64,
    },
    ColorNoise {
        amplitude: f32,
        period: f32,
        #[serde(default = "default_seed")]
        seed: u64,
    },
    BackboneStretcher {
        amount: f64,
    },
    TipRemover {
        tip_length: f64,
    },
    TextureStep {
        step: f32,
    },
    #[serde(rename = "perlin_noise_1d")]
    PerlinNoise1D {
        frequency: f64,
        amplitude: f64,
        octaves: u32,
        #[serde(default = "default_seed")]
        seed: u64,
    },
    #[serde(rename = "perlin_noise_2d")]
    PerlinNoise2D {
        frequency: f64,
        amplitude: f64,
        octaves: u32,
        #[serde(default = "default_seed")]
        seed: u64,
    },
    Calligraphic(CalligraphicParams),
    SpatialNoise(SpatialNoiseParams),
    Smoothing(SmoothingParams),
}

fn check(ok: bool, name: &'static str, value: f64) -> Result<(), ConfigError> {
    if ok {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { name, value })
    }
}

fn check_thickness(name: &'static str, t: f32) -> Result<(), ConfigError> {
    check(limits::in_thickness_bounds(t), name, t as f64)
}

fn check_amplitude(name: &'static str, a: f64) -> Result<(), ConfigError> {
    check(limits::in_amplitude_bounds(a as f32), name, a)
}

fn check_octaves(octaves: u32) -> Result<(), ConfigError> {
    check(octaves <= limits::MAX_NOISE_OCTAVES, "octaves", octaves as f64)
}

fn check_alpha(name: &'static str, a: f32) -> Result<(), ConfigError> {
    check(limits::in_unit_range(a), name, a as f64)
}

impl ShaderSpec {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            ShaderSpec::ConstantThickness { thickness } => check_thickness("thickness", thickness),
            ShaderSpec::IncreasingThickness { min, max } => {
                check_thickness("min", min)?;
                check_thickness("max", max)
            }
            ShaderSpec::ConstantColor { alpha, .. } => check_alpha("alpha", alpha),
            ShaderSpec::IncreasingColor { from_alpha, to_alpha, .. } => {
                check_alpha("from_alpha", from_alpha)?;
                check_alpha("to_alpha", to_alpha)
            }
            ShaderSpec::Sampling { sampling } => check(limits::in_sampling_bounds(sampling), "sampling", sampling as f64),
            ShaderSpec::ResampleCount { count } => check(count <= limits::MAX_RESAMPLE_COUNT, "count", count as f64),
            ShaderSpec::ThicknessNoise { amplitude, period, .. } | ShaderSpec::ColorNoise { amplitude, period, .. } => {
                check_amplitude("amplitude", amplitude as f64)?;
                check(limits::in_sampling_bounds(period), "period", period as f64)
            }
            ShaderSpec::BackboneStretcher { amount } => check_amplitude("amount", amount),
            ShaderSpec::TipRemover { tip_length } => {
                check(tip_length >= 0.0 && limits::in_amplitude_bounds(tip_length as f32), "tip_length", tip_length)
            }
            ShaderSpec::TextureStep { step } => check(limits::in_sampling_bounds(step), "step", step as f64),
            ShaderSpec::PerlinNoise1D { frequency, amplitude, octaves, .. }
            | ShaderSpec::PerlinNoise2D { frequency, amplitude, octaves, .. } => {
                check(frequency.is_finite(), "frequency", frequency)?;
                check_amplitude("amplitude", amplitude)?;
                check_octaves(octaves)
            }
            ShaderSpec::Calligraphic(p) => {
                check_thickness("min_thickness", p.min_thickness as f32)?;
                check_thickness("max_thickness", p.max_thickness as f32)?;
                check(p.orientation.is_finite(), "orientation", p.orientation.norm())
            }
            ShaderSpec::SpatialNoise(p) => {
                check_amplitude("amount", p.amount)?;
                check(p.scale.is_finite(), "scale", p.scale)?;
                check_octaves(p.octaves)
            }
            ShaderSpec::Smoothing(p) => {
                check(p.iterations <= limits::MAX_SMOOTHING_ITERATIONS, "iterations", p.iterations as f64)
            }
        }
    }

    pub fn build(&self) -> Box<dyn StrokeShader> {
        match *self {
            ShaderSpec::ConstantThickness { thickness } => Box::new(ConstantThicknessShader { thickness }),
            ShaderSpec::IncreasingThickness { min, max } => Box::new(IncreasingThicknessShader { min, max }),
            ShaderSpec::ConstantColor { color, alpha } => Box::new(ConstantColorShader { color, alpha }),
            ShaderSpec::IncreasingColor { from, from_alpha, to, to_alpha } => {
                Box::new(IncreasingColorShader { from: (from, from_alpha), to: (to, to_alpha) })
            }
            ShaderSpec::Sampling { sampling } => Box::new(SamplingShader { sampling }),
            ShaderSpec::ResampleCount { count } => Box::new(ResampleCountShader { count }),
            ShaderSpec::ThicknessNoise { amplitude, period, seed } => {
                Box::new(ThicknessNoiseShader::new(amplitude, period, seed))
            }
            ShaderSpec::ColorNoise { amplitude, period, seed } => Box::new(ColorNoiseShader::new(amplitude, period, seed)),
            ShaderSpec::BackboneStretcher { amount } => Box::new(BackboneStretcherShader { amount }),
            ShaderSpec::TipRemover { tip_length } => Box::new(TipRemoverShader { tip_length }),
            ShaderSpec::TextureStep { step } => Box::new(TextureStepShader { step }),
            ShaderSpec::PerlinNoise1D { frequency, amplitude, octaves, seed } => {
                Box::new(PerlinNoise1DShader::new(frequency, amplitude, octaves, seed))
            }
            ShaderSpec::PerlinNoise2D { frequency, amplitude, octaves, seed } => {
                Box::new(PerlinNoise2DShader::new(frequency, amplitude, octaves, seed))
            }
            ShaderSpec::Calligraphic(p) => Box::new(CalligraphicShader::new(p)),
            ShaderSpec::SpatialNoise(p) => Box::new(SpatialNoiseShader::new(p)),
            ShaderSpec::Smoothing(params) => Box::new(SmoothingShader { params }),
        }
    }
}

/// Parses a JSON array of stages. Every stage is validated before any
/// shader is built, so an invalid stage yields no pipeline at all.
pub fn pipeline_from_json(v: &Value) -> Result<Vec<ShaderSpec>, ConfigError> {
    let specs = Vec::<ShaderSpec>::deserialize(v)?;
    check(specs.len() <= limits::MAX_PIPELINE_STAGES, "stages", specs.len() as f64)?;
    for spec in &specs {
        spec.validate()?;
    }
    Ok(specs)
}

pub fn shaders_from_json(v: &Value) -> Result<Vec<Box<dyn StrokeShader>>, ConfigError> {
    let specs = pipeline_from_json(v)?;
    log::debug!("built a pipeline of {} shaders", specs.len());
    Ok(specs.iter().map(ShaderSpec::build).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_tagged_stages_with_defaults() {
        let specs = pipeline_from_json(&json!([
            { "type": "constant_thickness", "thickness": 4.0 },
            { "type": "constant_color", "color": { "r": 1.0, "g": 0.0, "b": 0.0 } },
            { "type": "perlin_noise_1d", "frequency": 0.1, "amplitude": 2.0, "octaves": 3 },
            { "type": "smoothing", "iterations": 10 },
        ]))
        .unwrap();
        assert_eq!(specs[0], ShaderSpec::ConstantThickness { thickness: 4.0 });
        assert_eq!(specs[1], ShaderSpec::ConstantColor { color: Rgb::new(1.0, 0.0, 0.0), alpha: 1.0 });
        assert_eq!(
            specs[2],
            ShaderSpec::PerlinNoise1D { frequency: 0.1, amplitude: 2.0, octaves: 3, seed: DEFAULT_SEED }
        );
        match specs[3] {
            ShaderSpec::Smoothing(p) => {
                assert_eq!(p.iterations, 10);
                assert_eq!(p.factor_point, SmoothingParams::default().factor_point);
            }
            ref other => panic!("unexpected stage {:?}", other),
        }
    }

    #[test]
    fn out_of_range_parameters_are_rejected() {
        let err = shaders_from_json(&json!([
            { "type": "texture_step", "step": 2.0 },
            { "type": "spatial_noise", "octaves": 1000 },
        ]))
        .err();
        assert!(matches!(err, Some(ConfigError::OutOfRange { name: "octaves", .. })));

        let err = shaders_from_json(&json!([{ "type": "constant_thickness", "thickness": -1.0 }])).err();
        assert!(matches!(err, Some(ConfigError::OutOfRange { name: "thickness", .. })));
    }

    #[test]
    fn unknown_stage_is_a_json_error() {
        let err = shaders_from_json(&json!([{ "type": "watercolor" }])).err();
        assert!(matches!(err, Some(ConfigError::Json(_))));
    }

    #[test]
    fn built_shaders_keep_their_names() {
        let shaders = shaders_from_json(&json!([
            { "type": "calligraphic", "min_thickness": 2.0 },
            { "type": "tip_remover", "tip_length": 3.0 },
        ]))
        .unwrap();
        let names: Vec<&str> = shaders.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["CalligraphicShader", "TipRemoverShader"]);
    }
}
