use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    #[inline]
    pub const fn new(x: f64, y: f64) -> Self { Vec2 { x, y } }
    #[inline]
    pub fn dot(self, o: Vec2) -> f64 { self.x * o.x + self.y * o.y }
    #[inline]
    pub fn cross(self, o: Vec2) -> f64 { self.x * o.y - self.y * o.x }
    #[inline]
    pub fn norm_sq(self) -> f64 { self.dot(self) }
    #[inline]
    pub fn norm(self) -> f64 { self.norm_sq().sqrt() }
    // Counter-clockwise perpendicular.
    #[inline]
    pub fn perp(self) -> Vec2 { Vec2::new(-self.y, self.x) }
    #[inline]
    pub fn is_finite(self) -> bool { self.x.is_finite() && self.y.is_finite() }

    /// Unit vector in the same direction; a zero vector stays zero.
    #[inline]
    pub fn normalized(self) -> Vec2 {
        let n = self.norm();
        if n > 0.0 { self / n } else { self }
    }

    /// Linear interpolation, exact at both ends.
    #[inline]
    pub fn lerp(a: Vec2, b: Vec2, t: f64) -> Vec2 {
        if t == 0.0 {
            a
        } else if t == 1.0 {
            b
        } else {
            a + (b - a) * t
        }
    }

    #[inline]
    pub fn distance(self, o: Vec2) -> f64 { (o - self).norm() }
}

impl Add for Vec2 { type Output = Vec2; #[inline] fn add(self, o: Vec2) -> Vec2 { Vec2::new(self.x + o.x, self.y + o.y) } }
impl Sub for Vec2 { type Output = Vec2; #[inline] fn sub(self, o: Vec2) -> Vec2 { Vec2::new(self.x - o.x, self.y - o.y) } }
impl Mul<f64> for Vec2 { type Output = Vec2; #[inline] fn mul(self, s: f64) -> Vec2 { Vec2::new(self.x * s, self.y * s) } }
impl Mul<Vec2> for f64 { type Output = Vec2; #[inline] fn mul(self, v: Vec2) -> Vec2 { Vec2::new(self * v.x, self * v.y) } }
impl Div<f64> for Vec2 { type Output = Vec2; #[inline] fn div(self, s: f64) -> Vec2 { Vec2::new(self.x / s, self.y / s) } }
impl Neg for Vec2 { type Output = Vec2; #[inline] fn neg(self) -> Vec2 { Vec2::new(-self.x, -self.y) } }
impl AddAssign for Vec2 { #[inline] fn add_assign(&mut self, o: Vec2) { self.x += o.x; self.y += o.y; } }
impl SubAssign for Vec2 { #[inline] fn sub_assign(&mut self, o: Vec2) { self.x -= o.x; self.y -= o.y; } }

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };

    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self { Vec3 { x, y, z } }
    #[inline]
    pub fn xy(self) -> Vec2 { Vec2::new(self.x, self.y) }
    #[inline]
    pub fn dot(self, o: Vec3) -> f64 { self.x * o.x + self.y * o.y + self.z * o.z }
    #[inline]
    pub fn norm(self) -> f64 { self.dot(self).sqrt() }

    #[inline]
    pub fn lerp(a: Vec3, b: Vec3, t: f64) -> Vec3 {
        if t == 0.0 {
            a
        } else if t == 1.0 {
            b
        } else {
            a + (b - a) * t
        }
    }
}

impl From<Vec2> for Vec3 {
    fn from(v: Vec2) -> Self { Vec3::new(v.x, v.y, 0.0) }
}

impl Add for Vec3 { type Output = Vec3; #[inline] fn add(self, o: Vec3) -> Vec3 { Vec3::new(self.x + o.x, self.y + o.y, self.z + o.z) } }
impl Sub for Vec3 { type Output = Vec3; #[inline] fn sub(self, o: Vec3) -> Vec3 { Vec3::new(self.x - o.x, self.y - o.y, self.z - o.z) } }
impl Mul<f64> for Vec3 { type Output = Vec3; #[inline] fn mul(self, s: f64) -> Vec3 { Vec3::new(self.x * s, self.y * s, self.z * s) } }
impl Div<f64> for Vec3 { type Output = Vec3; #[inline] fn div(self, s: f64) -> Vec3 { Vec3::new(self.x / s, self.y / s, self.z / s) } }

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0.0, g: 0.0, b: 0.0 };

    pub const fn new(r: f32, g: f32, b: f32) -> Self { Rgb { r, g, b } }

    pub fn lerp(a: Rgb, b: Rgb, t: f32) -> Rgb {
        Rgb::new(lerp_f32(a.r, b.r, t), lerp_f32(a.g, b.g, t), lerp_f32(a.b, b.b, t))
    }

    pub fn clamped(self) -> Rgb {
        Rgb::new(self.r.clamp(0.0, 1.0), self.g.clamp(0.0, 1.0), self.b.clamp(0.0, 1.0))
    }
}

impl Default for Rgb {
    fn default() -> Self { Rgb::BLACK }
}

// (1 - t) * a + t * b reproduces a at t = 0 and b at t = 1 exactly.
#[inline]
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 { (1.0 - t) * a + t * b }

/// Two-part identifier: the first part names the originating element, the
/// second counts fragments produced by splitting it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Id {
    pub first: u32,
    pub second: u32,
}

impl Id {
    pub const fn new(first: u32, second: u32) -> Self { Id { first, second } }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.first, self.second)
    }
}

/// Blend mode simulating the drawing medium.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediumType {
    Dry,
    Humid,
    #[default]
    Opaque,
}
