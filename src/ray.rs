use serde::Serialize;

use crate::plane::Plane;
use crate::vector::{Vec3, EPSILON};

#[cfg(test)]
mod tests {

    use super::*;
    use approx::assert_abs_diff_eq;

    fn square_top(z: f32) -> [Plane; 2] {
        // unit square at height z, split along its main diagonal
        let a = Vec3::new(0.0, 0.0, z);
        let b = Vec3::new(1.0, 0.0, z);
        let c = Vec3::new(1.0, 1.0, z);
        let d = Vec3::new(0.0, 1.0, z);
        [
            Plane::from_points(a, b, c).unwrap(),
            Plane::from_points(a, c, d).unwrap(),
        ]
    }

    #[test]
    fn hits_plane_ahead_of_origin() {
        let [plane, _] = square_top(2.0);
        let ray = Ray::new(Vec3::new(0.75, 0.25, 0.0), Vec3::FORWARD, 10.0);
        let hit = ray.intersect_plane(&plane).unwrap();
        assert_abs_diff_eq!(hit.t, 0.2, epsilon = 1e-6);
        assert_abs_diff_eq!(hit.point, Vec3::new(0.75, 0.25, 2.0));
        assert!(hit.facing > 0.0);
    }

    #[test]
    fn ignores_planes_behind_or_parallel() {
        let [plane, _] = square_top(-1.0);
        let ray = Ray::new(Vec3::new(0.5, 0.5, 0.0), Vec3::FORWARD, 10.0);
        assert!(ray.intersect_plane(&plane).is_none());

        let wall = Plane::from_points(Vec3::ZERO, Vec3::UP, Vec3::FORWARD).unwrap();
        assert!(ray.intersect_plane(&wall).is_none());
    }

    #[test]
    fn ignores_planes_beyond_ray_length() {
        let [plane, _] = square_top(12.0);
        let ray = Ray::new(Vec3::new(0.5, 0.5, 0.0), Vec3::FORWARD, 10.0);
        assert!(ray.intersect_plane(&plane).is_none());
    }

    #[test]
    fn bounded_triangle_test() {
        let [plane, _] = square_top(0.0);
        // triangle (0,0) (1,0) (1,1)
        assert!(triangle_contains(&plane, Vec3::new(0.75, 0.25, 0.0), 2));
        assert!(triangle_contains(&plane, Vec3::new(1.0, 0.5, 0.0), 2));
        assert!(!triangle_contains(&plane, Vec3::new(0.25, 0.75, 0.0), 2));
        assert!(!triangle_contains(&plane, Vec3::new(1.5, 0.5, 0.0), 2));
    }

    #[test]
    fn bounded_triangle_test_scales_with_triangle_size() {
        let a = Vec3::new(0.0, 0.0, 0.0065);
        let (b, c) = (a + Vec3::RIGHT * 0.003, a + Vec3::new(0.003, 0.003, 0.0));
        let plane = Plane::from_points(a, b, c).unwrap();
        assert!(triangle_contains(&plane, Vec3::new(0.002, 0.001, 0.0065), 2));
        assert!(triangle_contains(&plane, Vec3::new(0.0015, 0.0015, 0.0065), 2));
        assert!(!triangle_contains(&plane, Vec3::new(0.001, 0.002, 0.0065), 2));
    }

    #[test]
    fn shared_edge_is_counted_once() {
        let planes: Vec<Option<Plane>> = square_top(3.0).into_iter().map(Some).collect();
        let ray = Ray::new(Vec3::new(0.5, 0.5, 0.0), Vec3::FORWARD, 10.0);

        let merged = ray.cast(&planes, true);
        assert_eq!(merged.crossings, 1);
        assert_eq!(merged.raw_hits, 2);

        let raw = ray.cast(&planes, false);
        assert_eq!(raw.crossings, 2);
    }

    #[test]
    fn opposite_facing_hits_are_kept_apart() {
        // an edge grazed by the ray: one face looks along it, one against it
        let a = Vec3::new(0.0, 0.0, 1.0);
        let b = Vec3::new(1.0, 0.0, 1.0);
        let up = Plane::from_points(a, b, Vec3::new(0.5, 1.0, 2.0)).unwrap();
        let down = Plane::from_points(b, a, Vec3::new(0.5, 1.0, 0.0)).unwrap();
        assert!(up.normal.z * down.normal.z < 0.0);

        let planes = vec![Some(up), Some(down)];
        let ray = Ray::new(Vec3::new(0.5, 0.0, 0.0), Vec3::FORWARD, 10.0);
        let tally = ray.cast(&planes, true);
        assert_eq!(tally.crossings, 2);
    }

    #[test]
    fn degenerate_planes_are_skipped() {
        let [plane, _] = square_top(1.0);
        let planes = vec![None, Some(plane), None];
        let ray = Ray::new(Vec3::new(0.75, 0.25, 0.0), Vec3::FORWARD, 10.0);
        let tally = ray.cast(&planes, true);
        assert_eq!(tally.degenerate, 2);
        assert_eq!(tally.crossings, 1);
        assert!(tally.is_odd());
    }
}

/// A ray segment from `origin` along `direction`.
/// The length of `direction` is the reach of the ray: hits are accepted for
/// parameters `t` in `[EPSILON, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

/// Where a ray meets a plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub t: f32,       // parameter along the ray direction
    pub point: Vec3,  // intersection point
    pub facing: f32,  // normal · direction, sign tells entering from leaving
}

/// Outcome of casting one ray against a set of planes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CrossingTally {
    pub crossings: usize,  // distinct surface crossings
    pub raw_hits: usize,   // bounded hits before merging coincident ones
    pub parallel: usize,   // planes the ray runs parallel to
    pub degenerate: usize, // planes skipped because their triangle had no normal
}

impl CrossingTally {
    /// Parity rule: an odd number of crossings means the origin is enclosed.
    pub fn is_odd(&self) -> bool {
        self.crossings % 2 == 1
    }
}

impl Ray {
    /// Creates a ray whose direction is `direction` rescaled to `length`.
    pub fn new(origin: Vec3, direction: Vec3, length: f32) -> Self {
        Self {
            origin,
            direction: direction.normalize() * length,
        }
    }

    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Intersects the ray with an unbounded plane.
    /// Returns `None` when the ray is parallel to the plane, when the plane is
    /// behind (or at) the origin, or when it lies beyond the ray's reach.
    pub fn intersect_plane(&self, plane: &Plane) -> Option<RayHit> {
        let denom = plane.normal.dot(self.direction);
        if denom.abs() <= EPSILON {
            return None;
        }

        let t = (plane.point_on_plane() - self.origin).dot(plane.normal) / denom;
        if t < EPSILON || t > 1.0 {
            return None;
        }

        Some(RayHit {
            t,
            point: self.point_at(t),
            facing: denom,
        })
    }

    /// Casts the ray against every plane and counts bounded crossings.
    ///
    /// `None` entries stand for triangles that could not produce a plane and
    /// never contribute a crossing. With `merge_coincident` set, hits at the
    /// same point through planes facing the same way relative to the ray
    /// (a shared edge or vertex) are counted once.
    pub fn cast(&self, planes: &[Option<Plane>], merge_coincident: bool) -> CrossingTally {
        let mut tally = CrossingTally::default();
        let axis = self.direction.dominant_axis();
        let mut hits: Vec<RayHit> = Vec::new();

        for plane in planes {
            let Some(plane) = plane else {
                tally.degenerate += 1;
                continue;
            };
            if plane.normal.dot(self.direction).abs() <= EPSILON {
                tally.parallel += 1;
                continue;
            }
            if let Some(hit) = self.intersect_plane(plane) {
                if triangle_contains(plane, hit.point, axis) {
                    hits.push(hit);
                }
            }
        }

        tally.raw_hits = hits.len();
        tally.crossings = if merge_coincident {
            count_distinct(hits)
        } else {
            hits.len()
        };
        tally
    }
}

fn count_distinct(mut hits: Vec<RayHit>) -> usize {
    hits.sort_by(|a, b| a.t.total_cmp(&b.t));
    let mut kept: Vec<RayHit> = Vec::with_capacity(hits.len());
    for hit in hits {
        let duplicate = kept
            .iter()
            .rev()
            .take_while(|k| k.point.approx_eq(hit.point, EPSILON))
            .any(|k| k.facing.signum() == hit.facing.signum());
        if !duplicate {
            kept.push(hit);
        }
    }
    kept.len()
}

/// Does `point` fall inside the plane's construction triangle?
///
/// Both are projected by dropping the `drop_axis` coordinate (z for a ray
/// cast along z). The point is inside when the three sub-triangle areas it
/// forms with the edges add up to the full triangle area. The tolerance scales
/// with the projected edge lengths, as in [`Plane::from_points`].
pub fn triangle_contains(plane: &Plane, point: Vec3, drop_axis: usize) -> bool {
    let (u, v) = match drop_axis {
        0 => (1, 2),
        1 => (2, 0),
        _ => (0, 1),
    };
    let project = |p: Vec3| (p.component(u), p.component(v));

    let [a, b, c] = plane.points;
    let (x1, y1) = project(a);
    let (x2, y2) = project(b);
    let (x3, y3) = project(c);
    let (px, py) = project(point);

    let full = ((x2 - x1) * (y3 - y1) - (x3 - x1) * (y2 - y1)).abs();

    let first = ((x1 - px) * (y2 - py) - (x2 - px) * (y1 - py)).abs();
    let second = ((x2 - px) * (y3 - py) - (x3 - px) * (y2 - py)).abs();
    let third = ((x3 - px) * (y1 - py) - (x1 - px) * (y3 - py)).abs();

    let edges = (x2 - x1).hypot(y2 - y1) * (x3 - x1).hypot(y3 - y1);
    (first + second + third - full).abs() <= EPSILON * edges
}
