//! Three-component vector algebra.
//!
//! [`Vec3`] is the numeric foundation for planes, the sampling grid and the
//! containment engine. It is a plain `Copy` value type: every operation
//! returns a new vector, and the in-place helpers (`normalize_mut` and the
//! assignment operators) exist only for call sites that mutate a local.
//!
//! Equality between vectors is approximate. The derived `PartialEq` compares
//! bits exactly and is only useful for tests on values produced without
//! arithmetic; geometry code uses [`Vec3::approx_eq`] instead.

use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

use approx::AbsDiffEq;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Tolerance shared by every geometric comparison in the crate.
pub const EPSILON: f32 = 1e-5;


/// A vector (or point) in 3D space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);
    pub const ONE: Vec3 = Vec3::new(1.0, 1.0, 1.0);
    pub const FORWARD: Vec3 = Vec3::new(0.0, 0.0, 1.0);
    pub const BACK: Vec3 = Vec3::new(0.0, 0.0, -1.0);
    pub const RIGHT: Vec3 = Vec3::new(1.0, 0.0, 0.0);
    pub const LEFT: Vec3 = Vec3::new(-1.0, 0.0, 0.0);
    pub const UP: Vec3 = Vec3::new(0.0, 1.0, 0.0);
    pub const DOWN: Vec3 = Vec3::new(0.0, -1.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Right-handed cross product.
    pub fn cross(self, other: Vec3) -> Vec3 {
        Vec3::new(
            self.y * other.z - self.z * other.y,
            -(self.x * other.z - self.z * other.x),
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn magnitude(self) -> f32 {
        self.sqr_magnitude().sqrt()
    }

    pub fn sqr_magnitude(self) -> f32 {
        self.dot(self)
    }

    pub fn distance(a: Vec3, b: Vec3) -> f32 {
        (a - b).magnitude()
    }

    /// Returns the unit vector in the direction of `self`.
    ///
    /// A zero vector has no direction; the result is then NaN in every
    /// component. Use [`Vec3::try_normalize`] when the input may be zero.
    pub fn normalize(self) -> Vec3 {
        self / self.magnitude()
    }

    /// Like [`Vec3::normalize`], but `None` when the magnitude is within
    /// [`EPSILON`] of zero.
    pub fn try_normalize(self) -> Option<Vec3> {
        let sqr = self.sqr_magnitude();
        if sqr <= EPSILON * EPSILON {
            None
        } else {
            Some(self / sqr.sqrt())
        }
    }

    pub fn normalize_mut(&mut self) {
        *self = self.normalize();
    }

    /// Linear interpolation with `t` clamped to `[0, 1]`.
    pub fn lerp(a: Vec3, b: Vec3, t: f32) -> Vec3 {
        Vec3::lerp_unclamped(a, b, t.clamp(0.0, 1.0))
    }

    /// Linear interpolation that extrapolates for `t` outside `[0, 1]`.
    pub fn lerp_unclamped(a: Vec3, b: Vec3, t: f32) -> Vec3 {
        a + (b - a) * t
    }

    pub fn max(a: Vec3, b: Vec3) -> Vec3 {
        Vec3::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z))
    }

    pub fn min(a: Vec3, b: Vec3) -> Vec3 {
        Vec3::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z))
    }

    /// Componentwise product.
    pub fn scale(self, other: Vec3) -> Vec3 {
        Vec3::new(self.x * other.x, self.y * other.y, self.z * other.z)
    }

    /// Shortens the vector to `max_length` if it is longer, keeping its direction.
    pub fn clamp_magnitude(self, max_length: f32) -> Vec3 {
        let magnitude = self.magnitude();
        if magnitude <= max_length {
            self
        } else {
            self / magnitude * max_length
        }
    }

    /// Angle in radians between two vectors. NaN if either is zero.
    pub fn angle(from: Vec3, to: Vec3) -> f32 {
        let cos = from.dot(to) / (from.magnitude() * to.magnitude());
        // rounding can push |cos| just past 1 for (anti)parallel inputs
        cos.clamp(-1.0, 1.0).acos()
    }

    /// Projection of `self` onto `on`. NaN if `on` is zero.
    pub fn project(self, on: Vec3) -> Vec3 {
        on * (self.dot(on) / on.dot(on))
    }

    /// Reflects a direction off a surface with unit normal `normal`.
    pub fn reflect(self, normal: Vec3) -> Vec3 {
        self - normal * (2.0 * self.dot(normal))
    }

    /// Approximate equality: squared distance below `epsilon²`.
    pub fn approx_eq(self, other: Vec3, epsilon: f32) -> bool {
        (self - other).sqr_magnitude() < epsilon * epsilon
    }

    /// Index of the component with the largest magnitude (0 = x, 1 = y, 2 = z).
    pub fn dominant_axis(self) -> usize {
        let (ax, ay, az) = (self.x.abs(), self.y.abs(), self.z.abs());
        if ax >= ay && ax >= az {
            0
        } else if ay >= az {
            1
        } else {
            2
        }
    }

    pub fn component(self, axis: usize) -> f32 {
        match axis {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;
    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;
    fn mul(self, scalar: f32) -> Vec3 {
        Vec3::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

impl Mul<Vec3> for f32 {
    type Output = Vec3;
    fn mul(self, v: Vec3) -> Vec3 {
        v * self
    }
}

impl Div<f32> for Vec3 {
    type Output = Vec3;
    fn div(self, scalar: f32) -> Vec3 {
        Vec3::new(self.x / scalar, self.y / scalar, self.z / scalar)
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Vec3) {
        *self = *self + rhs;
    }
}

impl SubAssign for Vec3 {
    fn sub_assign(&mut self, rhs: Vec3) {
        *self = *self - rhs;
    }
}

impl MulAssign<f32> for Vec3 {
    fn mul_assign(&mut self, scalar: f32) {
        *self = *self * scalar;
    }
}

impl AbsDiffEq for Vec3 {
    type Epsilon = f32;

    fn default_epsilon() -> f32 {
        EPSILON
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.x.abs_diff_eq(&other.x, epsilon)
            && self.y.abs_diff_eq(&other.y, epsilon)
            && self.z.abs_diff_eq(&other.z, epsilon)
    }
}

impl From<Vector3<f32>> for Vec3 {
    fn from(v: Vector3<f32>) -> Self {
        Vec3::new(v.x, v.y, v.z)
    }
}

impl From<Point3<f32>> for Vec3 {
    fn from(p: Point3<f32>) -> Self {
        Vec3::new(p.x, p.y, p.z)
    }
}

impl From<[f32; 3]> for Vec3 {
    fn from(a: [f32; 3]) -> Self {
        Vec3::new(a[0], a[1], a[2])
    }
}

impl From<Vec3> for Vector3<f32> {
    fn from(v: Vec3) -> Self {
        Vector3::new(v.x, v.y, v.z)
    }
}

impl From<Vec3> for Point3<f32> {
    fn from(v: Vec3) -> Self {
        Point3::new(v.x, v.y, v.z)
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X = {}   Y = {}   Z = {}", self.x, self.y, self.z)
    }
}
