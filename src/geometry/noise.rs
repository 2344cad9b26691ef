// Perlin gradient noise with seeded permutation tables, plus octave
// turbulence in one, two and three dimensions.

use super::random;
use crate::model::{Vec2, Vec3};
use rand::Rng;

const B: usize = 0x100;
const BM: i64 = 0xff;
const N: f64 = 4096.0;

#[inline]
fn s_curve(t: f64) -> f64 { t * t * (3.0 - 2.0 * t) }

#[inline]
fn lerp(t: f64, a: f64, b: f64) -> f64 { a + t * (b - a) }

// Lattice cell of one coordinate: (b0, b1, r0, r1).
#[inline]
fn setup(x: f64) -> (usize, usize, f64, f64) {
    let t = x + N;
    let it = t.floor();
    let b0 = (it as i64 & BM) as usize;
    let b1 = (b0 + 1) & BM as usize;
    let r0 = t - it;
    (b0, b1, r0, r0 - 1.0)
}

fn normalize2(v: [f64; 2]) -> [f64; 2] {
    let s = (v[0] * v[0] + v[1] * v[1]).sqrt();
    if s == 0.0 { [1.0, 0.0] } else { [v[0] / s, v[1] / s] }
}

fn normalize3(v: [f64; 3]) -> [f64; 3] {
    let s = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if s == 0.0 { [1.0, 0.0, 0.0] } else { [v[0] / s, v[1] / s, v[2] / s] }
}

#[derive(Clone, Debug)]
pub struct Noise {
    perm: Vec<usize>,
    g1: Vec<f64>,
    g2: Vec<[f64; 2]>,
    g3: Vec<[f64; 3]>,
}

impl Noise {
    pub fn new(seed: u64) -> Self {
        let mut rng = random::seeded(seed);
        let gradient = |rng: &mut rand_pcg::Pcg32| -> f64 {
            (rng.gen_range(0..2 * B) as f64 - B as f64) / B as f64
        };

        let mut perm = vec![0usize; 2 * B + 2];
        let mut g1 = vec![0.0; 2 * B + 2];
        let mut g2 = vec![[0.0; 2]; 2 * B + 2];
        let mut g3 = vec![[0.0; 3]; 2 * B + 2];
        for i in 0..B {
            perm[i] = i;
            g1[i] = gradient(&mut rng);
            g2[i] = normalize2([gradient(&mut rng), gradient(&mut rng)]);
            g3[i] = normalize3([gradient(&mut rng), gradient(&mut rng), gradient(&mut rng)]);
        }
        for i in (1..B).rev() {
            let j = rng.gen_range(0..B);
            perm.swap(i, j);
        }
        for i in 0..B + 2 {
            perm[B + i] = perm[i];
            g1[B + i] = g1[i];
            g2[B + i] = g2[i];
            g3[B + i] = g3[i];
        }
        Noise { perm, g1, g2, g3 }
    }

    pub fn from_entropy() -> Self { Noise::new(random::entropy_seed()) }

    pub fn smooth_noise1(&self, arg: f64) -> f64 {
        let (bx0, bx1, rx0, rx1) = setup(arg);
        let sx = s_curve(rx0);
        let u = rx0 * self.g1[self.perm[bx0]];
        let v = rx1 * self.g1[self.perm[bx1]];
        lerp(sx, u, v)
    }

    pub fn smooth_noise2(&self, vec: Vec2) -> f64 {
        let (bx0, bx1, rx0, rx1) = setup(vec.x);
        let (by0, by1, ry0, ry1) = setup(vec.y);
        let p = &self.perm;
        let i = p[bx0];
        let j = p[bx1];
        let b00 = p[i + by0];
        let b10 = p[j + by0];
        let b01 = p[i + by1];
        let b11 = p[j + by1];

        let sx = s_curve(rx0);
        let sy = s_curve(ry0);
        let at = |q: [f64; 2], rx: f64, ry: f64| rx * q[0] + ry * q[1];

        let a = lerp(sx, at(self.g2[b00], rx0, ry0), at(self.g2[b10], rx1, ry0));
        let b = lerp(sx, at(self.g2[b01], rx0, ry1), at(self.g2[b11], rx1, ry1));
        lerp(sy, a, b)
    }

    pub fn smooth_noise3(&self, vec: Vec3) -> f64 {
        let (bx0, bx1, rx0, rx1) = setup(vec.x);
        let (by0, by1, ry0, ry1) = setup(vec.y);
        let (bz0, bz1, rz0, rz1) = setup(vec.z);
        let p = &self.perm;
        let i = p[bx0];
        let j = p[bx1];
        let b00 = p[i + by0];
        let b10 = p[j + by0];
        let b01 = p[i + by1];
        let b11 = p[j + by1];

        let t = s_curve(rx0);
        let sy = s_curve(ry0);
        let sz = s_curve(rz0);
        let at = |q: [f64; 3], rx: f64, ry: f64, rz: f64| rx * q[0] + ry * q[1] + rz * q[2];
        let g = &self.g3;

        let u = at(g[b00 + bz0], rx0, ry0, rz0);
        let v = at(g[b10 + bz0], rx1, ry0, rz0);
        let a = lerp(t, u, v);
        let u = at(g[b01 + bz0], rx0, ry1, rz0);
        let v = at(g[b11 + bz0], rx1, ry1, rz0);
        let b = lerp(t, u, v);
        let c = lerp(sy, a, b);

        let u = at(g[b00 + bz1], rx0, ry0, rz1);
        let v = at(g[b10 + bz1], rx1, ry0, rz1);
        let a = lerp(t, u, v);
        let u = at(g[b01 + bz1], rx0, ry1, rz1);
        let v = at(g[b11 + bz1], rx1, ry1, rz1);
        let b = lerp(t, u, v);
        let d = lerp(sy, a, b);

        lerp(sz, c, d)
    }

    pub fn turbulence1(&self, arg: f64, freq: f64, amp: f64, octaves: u32) -> f64 {
        let (mut f, mut a, mut sum) = (freq, amp, 0.0);
        for _ in 0..octaves {
            sum += self.smooth_noise1(arg * f) * a;
            f *= 2.0;
            a *= 0.5;
        }
        sum
    }

    pub fn turbulence2(&self, point: Vec2, freq: f64, amp: f64, octaves: u32) -> f64 {
        let (mut f, mut a, mut sum) = (freq, amp, 0.0);
        for _ in 0..octaves {
            sum += self.smooth_noise2(point * f) * a;
            f *= 2.0;
            a *= 0.5;
        }
        sum
    }

    pub fn turbulence3(&self, point: Vec3, freq: f64, amp: f64, octaves: u32) -> f64 {
        let (mut f, mut a, mut sum) = (freq, amp, 0.0);
        for _ in 0..octaves {
            sum += self.smooth_noise3(point * f) * a;
            f *= 2.0;
            a *= 0.5;
        }
        sum
    }
}

impl Default for Noise {
    fn default() -> Self { Noise::new(random::DEFAULT_SEED) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_at_lattice_points() {
        let n = Noise::new(7);
        for k in -3..4 {
            assert!(n.smooth_noise1(k as f64).abs() < 1e-12);
            assert!(n.smooth_noise2(Vec2::new(k as f64, 2.0)).abs() < 1e-12);
        }
    }

    #[test]
    fn deterministic_for_seed_and_bounded() {
        let a = Noise::new(3);
        let b = Noise::new(3);
        for i in 0..50 {
            let x = i as f64 * 0.37 - 9.0;
            assert_eq!(a.smooth_noise1(x), b.smooth_noise1(x));
            let v = a.turbulence2(Vec2::new(x, -x), 1.0, 1.0, 4);
            assert!(v.is_finite() && v.abs() < 4.0);
        }
    }

    #[test]
    fn no_octaves_is_zero() {
        let n = Noise::default();
        assert_eq!(n.turbulence3(Vec3::new(0.3, 0.2, 0.1), 2.0, 5.0, 0), 0.0);
    }
}
