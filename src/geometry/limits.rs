// Centralized parameter limits for shader configuration loaded from JSON

// Pipeline size cap
pub const MAX_PIPELINE_STAGES: usize = 256;

pub const MAX_SMOOTHING_ITERATIONS: u32 = 10_000;
pub const MAX_NOISE_OCTAVES: u32 = 32;
pub const MAX_RESAMPLE_COUNT: usize = 1_000_000;

// Numeric bounds
pub const THICKNESS_MAX: f32 = 10_000.0;
pub const AMPLITUDE_MAX: f32 = 10_000.0;
pub const SAMPLING_MIN: f32 = 1e-4;

#[inline]
pub fn in_thickness_bounds(t: f32) -> bool { t.is_finite() && t >= 0.0 && t <= THICKNESS_MAX }

#[inline]
pub fn in_amplitude_bounds(a: f32) -> bool { a.is_finite() && a.abs() <= AMPLITUDE_MAX }

#[inline]
pub fn in_sampling_bounds(s: f32) -> bool { s.is_finite() && s >= SAMPLING_MIN }

#[inline]
pub fn in_unit_range(x: f32) -> bool { x.is_finite() && (0.0..=1.0).contains(&x) }
