use crate::error::{CollisionError, Result};
use crate::vector::{Vec3, EPSILON};


/// Represents a plane, defined by a unit normal and a signed distance.
/// A point `p` lies on the plane when `normal · p + distance = 0`.
///
/// The plane keeps the three points it was built from so that ray hits can
/// be bounded to the source triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub distance: f32,
    pub points: [Vec3; 3], // construction points A, B, C
}

impl Plane {
    /// Builds the plane through a triangle.
    ///
    /// `normal = normalize((b - a) × (c - a))` and `distance = -(normal · a)`,
    /// so the points go around counter-clockwise seen from the normal side.
    /// A zero-area triangle has no normal and is rejected. The test is
    /// relative to the edge lengths, so small triangles still build a plane.
    pub fn from_points(a: Vec3, b: Vec3, c: Vec3) -> Result<Self> {
        let (ab, ac) = (b - a, c - a);
        let cross = ab.cross(ac);
        let scale = ab.magnitude() * ac.magnitude();
        let normal = cross / cross.magnitude();
        if cross.sqr_magnitude() <= (EPSILON * scale).powi(2) || !normal.is_finite() {
            return Err(CollisionError::DegenerateGeometry(format!(
                "zero-area triangle ({:?}, {:?}, {:?})",
                a, b, c
            )));
        }

        Ok(Self {
            normal,
            distance: -normal.dot(a),
            points: [a, b, c],
        })
    }

    /// Builds a plane from a normal and a point.
    ///
    /// Note the sign: `distance = n · p` using the raw (unnormalized) `n`, the
    /// opposite of [`Plane::from_points`]. The point therefore lies on the
    /// plane only when it is also on the plane through the origin. Use
    /// [`Plane::set_normal_and_position`] for a plane that contains `p`.
    pub fn from_normal_and_point(normal: Vec3, point: Vec3) -> Result<Self> {
        let unit = Self::unit_normal(normal)?;
        Ok(Self {
            normal: unit,
            distance: normal.dot(point),
            points: [point; 3],
        })
    }

    /// Builds a plane directly from its implicit form.
    pub fn from_normal_and_distance(normal: Vec3, distance: f32) -> Result<Self> {
        let unit = Self::unit_normal(normal)?;
        Ok(Self {
            normal: unit,
            distance,
            points: [unit; 3],
        })
    }

    /// Re-orients the plane so it contains `point` with normal `normal`.
    pub fn set_normal_and_position(&mut self, normal: Vec3, point: Vec3) -> Result<()> {
        self.normal = Self::unit_normal(normal)?;
        self.distance = -self.normal.dot(point);
        Ok(())
    }

    fn unit_normal(normal: Vec3) -> Result<Vec3> {
        normal.try_normalize().ok_or_else(|| {
            CollisionError::DegenerateGeometry(format!("zero-length plane normal {:?}", normal))
        })
    }

    /// Makes the plane face the opposite direction.
    pub fn flip(&mut self) {
        self.normal = -self.normal;
        self.distance = -self.distance;
    }

    pub fn flipped(&self) -> Self {
        let mut plane = *self;
        plane.flip();
        plane
    }

    /// Adds `normal · translation` to the distance.
    pub fn translate(&mut self, translation: Vec3) {
        self.distance += self.normal.dot(translation);
    }

    pub fn translated(&self, translation: Vec3) -> Self {
        let mut plane = *self;
        plane.translate(translation);
        plane
    }

    /// Signed distance from the plane to `point`, positive on the normal side.
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.distance
    }

    /// Is `point` strictly on the positive side of the plane?
    pub fn side(&self, point: Vec3) -> bool {
        self.distance_to_point(point) > 0.0
    }

    /// Are both points on the same side? A point on the plane counts as negative.
    pub fn same_side(&self, p0: Vec3, p1: Vec3) -> bool {
        let d0 = self.distance_to_point(p0);
        let d1 = self.distance_to_point(p1);
        (d0 > 0.0 && d1 > 0.0) || (d0 <= 0.0 && d1 <= 0.0)
    }

    /// Point on the plane closest to `point`.
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        point - self.normal * self.distance_to_point(point)
    }

    /// Foot of the perpendicular from the origin.
    pub fn point_on_plane(&self) -> Vec3 {
        -self.normal * self.distance
    }
}
