// Value noise over a 512-entry table of uniform values in [-1, 1), with
// linear and Lanczos-windowed interpolation.

use super::random;
use super::tolerance::M_EPSILON;
use std::f64::consts::PI;

pub const NB_VALUE_NOISE: usize = 512;

fn lanczos_windowed(t: f64) -> f64 {
    if t.abs() > 2.0 {
        return 0.0;
    }
    if t.abs() < M_EPSILON {
        return 1.0;
    }
    (PI * t).sin() / (PI * t) * (PI * t / 2.0).sin() / (PI * t / 2.0)
}

#[derive(Clone, Debug)]
pub struct PseudoNoise {
    values: Vec<f64>,
}

impl PseudoNoise {
    pub fn new(seed: u64) -> Self {
        let mut rng = random::seeded(seed);
        let values = (0..NB_VALUE_NOISE).map(|_| random::signed_unit(&mut rng)).collect();
        PseudoNoise { values }
    }

    // Table cell of x and the fractional position inside it. Negative input
    // wraps like positive input one period later.
    #[inline]
    fn cell(x: f64) -> (usize, f64) {
        let n = NB_VALUE_NOISE as f64;
        let i = (x.rem_euclid(1.0) * n) as usize % NB_VALUE_NOISE;
        let t = (x * n).rem_euclid(1.0);
        (i, t)
    }

    pub fn linear_noise(&self, x: f64) -> f64 {
        let (i, t) = Self::cell(x);
        let x1 = self.values[i];
        let x2 = self.values[(i + 1) % NB_VALUE_NOISE];
        x1 * (1.0 - t) + x2 * t
    }

    pub fn smooth_noise(&self, x: f64) -> f64 {
        let (i, t) = Self::cell(x);
        let h = (i + NB_VALUE_NOISE - 1) % NB_VALUE_NOISE;
        let x0 = self.values[h];
        let x1 = self.values[i];
        let x2 = self.values[(i + 1) % NB_VALUE_NOISE];
        let x3 = self.values[(i + 2) % NB_VALUE_NOISE];

        let y0 = lanczos_windowed(-1.0 - t);
        let y1 = lanczos_windowed(-t);
        let y2 = lanczos_windowed(1.0 - t);
        let y3 = lanczos_windowed(2.0 - t);
        (x0 * y0 + x1 * y1 + x2 * y2 + x3 * y3) / (y0 + y1 + y2 + y3)
    }

    pub fn turbulence_linear(&self, x: f64, octaves: u32) -> f64 {
        let mut y = 0.0;
        let mut k = 1.0;
        for _ in 0..octaves {
            y += k * self.linear_noise(x / k);
            k /= 2.0;
        }
        y
    }

    pub fn turbulence_smooth(&self, x: f64, octaves: u32) -> f64 {
        let mut y = 0.0;
        let mut k = 1.0;
        for _ in 0..octaves {
            y += k * self.smooth_noise(x / k);
            k /= 2.0;
        }
        y
    }
}

impl Default for PseudoNoise {
    fn default() -> Self { PseudoNoise::new(random::DEFAULT_SEED) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_hits_table_values() {
        let pn = PseudoNoise::new(11);
        for i in 0..8 {
            let x = i as f64 / NB_VALUE_NOISE as f64;
            assert!((pn.linear_noise(x) - pn.values[i]).abs() < 1e-12);
        }
    }

    #[test]
    fn negative_inputs_wrap() {
        let pn = PseudoNoise::new(11);
        for i in 1..20 {
            let x = i as f64 * 0.0173;
            assert!((pn.smooth_noise(-x) - pn.smooth_noise(1.0 - x)).abs() < 1e-9);
            assert!(pn.linear_noise(-x).is_finite());
        }
    }

    #[test]
    fn smooth_is_bounded() {
        let pn = PseudoNoise::default();
        for i in 0..200 {
            let v = pn.smooth_noise(i as f64 * 0.0031);
            assert!(v.abs() <= 1.5, "value {}", v);
        }
        assert_eq!(pn.turbulence_smooth(0.4, 0), 0.0);
    }
}
