//! Pairwise collision queries over inside-point sets.
//!
//! Two meshes collide when they share at least one inside grid sample. The
//! checks here are read-only set intersections; neither input is modified.

use std::collections::HashMap;

use serde::Serialize;

use crate::containment::ContainmentEngine;
use crate::grid::{SpatialGrid, VoxelIndex};
use crate::vector::{Vec3, EPSILON};

#[cfg(test)]
mod tests {

    use super::*;
    use crate::containment::ContainmentParams;
    use crate::geom::{Body, Mesh, Pose};

    fn evaluated(grid: &SpatialGrid, center: Vec3, scale: f32) -> ContainmentEngine {
        let body = Body::new(
            "cube",
            Mesh::cube(0.5),
            Pose::at(center).with_scale(Vec3::ONE * scale),
        );
        let mut engine = ContainmentEngine::new(ContainmentParams::default());
        engine.attach();
        engine.update(grid, &body.snapshot()).unwrap();
        engine
    }

    #[test]
    fn contains_point_uses_tolerance() {
        let points = [Vec3::new(1.0, 2.0, 3.0), Vec3::new(4.0, 4.0, 4.0)];
        assert!(contains_point(&points, Vec3::new(1.0, 2.0, 3.000001)));
        assert!(!contains_point(&points, Vec3::new(1.0, 2.0, 3.1)));
        assert!(!contains_point(&[], Vec3::ZERO));
    }

    #[test]
    fn separated_cubes_do_not_collide() {
        let grid = SpatialGrid::new(10, 1.0).unwrap();
        let a = evaluated(&grid, Vec3::ONE * 3.0, 1.0);
        let b = evaluated(&grid, Vec3::ONE * 6.0, 1.0);
        assert!(!a.inside_points().is_empty());
        assert!(!b.inside_points().is_empty());
        assert!(!engines_collide(&a, &b));
        assert_eq!(CollisionStatus::between(&a, &b), CollisionStatus::Separated);
    }

    #[test]
    fn overlapping_cubes_collide() {
        let grid = SpatialGrid::new(10, 1.0).unwrap();
        let a = evaluated(&grid, Vec3::ONE * 4.0, 3.0);
        let b = evaluated(&grid, Vec3::ONE * 5.0, 3.0);
        assert!(engines_collide(&a, &b));
        assert!(engines_collide(&b, &a));
        assert_eq!(CollisionStatus::between(&a, &b), CollisionStatus::Colliding);
    }

    #[test]
    fn indexed_check_agrees_with_linear_scan() {
        let grid = SpatialGrid::new(10, 0.5).unwrap();
        let a: Vec<Vec3> = grid.candidate_window(VoxelIndex::new(3, 3, 3), Vec3::ONE, 2);
        let b: Vec<Vec3> = grid.candidate_window(VoxelIndex::new(6, 6, 6), Vec3::ONE, 2);
        let c: Vec<Vec3> = grid.candidate_window(VoxelIndex::new(8, 1, 8), Vec3::ONE, 1);

        assert!(points_intersect(&a, &b));
        assert!(points_intersect_indexed(&grid, &a, &b));
        assert!(!points_intersect(&a, &c));
        assert!(!points_intersect_indexed(&grid, &a, &c));
        assert!(!points_intersect_indexed(&grid, &a, &[]));
    }

    #[test]
    fn inputs_are_left_untouched() {
        let a = vec![Vec3::ONE, Vec3::ZERO];
        let b = vec![Vec3::ONE];
        let (a0, b0) = (a.clone(), b.clone());
        assert!(points_intersect(&a, &b));
        assert_eq!(a, a0);
        assert_eq!(b, b0);
    }
}

/// Outcome of a pairwise check, for hosts that switch materials on contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CollisionStatus {
    Separated,
    Colliding,
}

impl CollisionStatus {
    pub fn between(a: &ContainmentEngine, b: &ContainmentEngine) -> Self {
        if engines_collide(a, b) {
            CollisionStatus::Colliding
        } else {
            CollisionStatus::Separated
        }
    }

    pub fn is_colliding(&self) -> bool {
        matches!(self, CollisionStatus::Colliding)
    }
}

/// Is any point in `points` approximately equal to `point`?
pub fn contains_point(points: &[Vec3], point: Vec3) -> bool {
    points.iter().any(|p| p.approx_eq(point, EPSILON))
}

/// Linear scan over both lists, `O(n·m)`.
pub fn points_intersect(a: &[Vec3], b: &[Vec3]) -> bool {
    b.iter().any(|&p| contains_point(a, p))
}

/// Same answer as [`points_intersect`] for grid-aligned points, in `O(n + m)`.
///
/// The first list is keyed by nearest voxel. Each point of the second list
/// is looked up by its own voxel and then confirmed with the usual tolerance.
pub fn points_intersect_indexed(grid: &SpatialGrid, a: &[Vec3], b: &[Vec3]) -> bool {
    let index: HashMap<VoxelIndex, Vec3> = a.iter().map(|&p| (grid.nearest_voxel(p), p)).collect();
    b.iter().any(|&p| {
        index
            .get(&grid.nearest_voxel(p))
            .is_some_and(|q| q.approx_eq(p, EPSILON))
    })
}

/// Do the current inside sets of two engines share a sample?
pub fn engines_collide(a: &ContainmentEngine, b: &ContainmentEngine) -> bool {
    points_intersect(a.inside_points(), b.inside_points())
}
