//! Uniform voxel lattice used to sample space for containment queries.
//!
//! This module discretizes world space into a cube of `size³` sample points
//! spaced `delta` apart, starting at the origin. Every containment engine in
//! a scene reads the same grid, so the grid is built once and never mutated.
//!
//! The grid provides:
//! - Precomputed sample positions `(x, y, z) * delta`
//! - Nearest-voxel lookup for arbitrary world positions
//! - Bounded candidate windows around a voxel, sized by object scale
//!
//! Out-of-range indices are never reported as errors: every lookup saturates
//! to `[0, size - 1]` on each axis.

use std::ops::Range;

use itertools::iproduct;
use serde::{Deserialize, Serialize};

use crate::error::{CollisionError, Result};
use crate::vector::Vec3;

#[cfg(test)]
mod tests {

    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn rejects_invalid_configuration() {
        assert!(matches!(
            SpatialGrid::new(0, 1.0),
            Err(CollisionError::InvalidGrid(_))
        ));
        assert!(SpatialGrid::new(10, 0.0).is_err());
        assert!(SpatialGrid::new(10, -1.0).is_err());
        assert!(SpatialGrid::new(10, f32::NAN).is_err());
        assert!(SpatialGrid::new(1, 0.5).is_ok());
    }

    #[test]
    fn sample_positions_follow_delta() {
        let grid = SpatialGrid::new(4, 0.5).unwrap();
        assert_eq!(grid.len(), 64);
        assert_abs_diff_eq!(
            grid.position(VoxelIndex::new(1, 2, 3)),
            Vec3::new(0.5, 1.0, 1.5)
        );
        assert!(grid.get(VoxelIndex::new(4, 0, 0)).is_none());
    }

    #[test]
    fn nearest_voxel_of_exact_positions() {
        let grid = SpatialGrid::new(10, 0.25).unwrap();
        for (i, j, k) in iproduct!(0..10, 0..10, 0..10) {
            let index = VoxelIndex::new(i, j, k);
            assert_eq!(grid.nearest_voxel(grid.position(index)), index);
        }
    }

    #[test]
    fn nearest_voxel_rounds_half_down_and_clamps() {
        let grid = SpatialGrid::new(10, 1.0).unwrap();
        assert_eq!(grid.nearest_voxel(Vec3::new(2.5, 2.51, 2.49)), VoxelIndex::new(2, 3, 2));
        assert_eq!(grid.nearest_voxel(Vec3::new(-3.0, 40.0, 9.7)), VoxelIndex::new(0, 9, 9));
        assert_eq!(grid.nearest_voxel(Vec3::new(-0.7, 0.0, 8.6)), VoxelIndex::new(0, 0, 9));
    }

    #[test]
    fn window_bounds_scale_and_clamp() {
        let grid = SpatialGrid::new(10, 1.0).unwrap();
        let center = VoxelIndex::new(5, 1, 8);
        let [x, y, z] = grid.window_bounds(center, Vec3::new(1.0, 1.0, 2.7), 2);
        assert_eq!(x, 3..7);
        assert_eq!(y, 0..3);
        assert_eq!(z, 5..9);
    }

    #[test]
    fn window_is_empty_when_extent_collapses() {
        let grid = SpatialGrid::new(10, 1.0).unwrap();
        let window = grid.candidate_window(VoxelIndex::new(5, 5, 5), Vec3::new(0.5, 1.0, 1.0), 1);
        assert!(window.is_empty());
    }

    #[test]
    fn window_enumerates_x_major() {
        let grid = SpatialGrid::new(10, 1.0).unwrap();
        let window = grid.candidate_window(VoxelIndex::new(5, 5, 5), Vec3::ONE, 1);
        let expected: Vec<Vec3> = iproduct!(4..6, 4..6, 4..6)
            .map(|(x, y, z)| Vec3::new(x as f32, y as f32, z as f32))
            .collect();
        assert_eq!(window, expected);
    }

    #[test]
    fn negative_scale_uses_magnitude() {
        let grid = SpatialGrid::new(10, 1.0).unwrap();
        let center = VoxelIndex::new(5, 5, 5);
        assert_eq!(
            grid.window_bounds(center, Vec3::new(-2.0, 2.0, 2.0), 1),
            grid.window_bounds(center, Vec3::new(2.0, 2.0, 2.0), 1)
        );
    }
}

/// Integer coordinates of a grid sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VoxelIndex {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

impl VoxelIndex {
    pub const fn new(x: usize, y: usize, z: usize) -> Self {
        Self { x, y, z }
    }

    fn axis(&self, axis: usize) -> usize {
        match axis {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }
}

/// Fixed lattice of sample points shared read-only by every containment engine.
///
/// **Context**: Classifying every point of space against a mesh is
/// impossible, so containment is evaluated on a finite set of sample points.
/// Comparing two meshes then reduces to comparing the samples each one
/// contains, which only works if both meshes were sampled on the same lattice.
///
/// **How it Works**: Stores the `size³` sample positions in a flat vector in
/// x-major order (index `(x * size + y) * size + z`). Positions are computed
/// once at construction; afterwards the grid only answers lookups.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialGrid {
    size: usize,
    delta: f32,
    points: Vec<Vec3>,
}

impl SpatialGrid {
    /// Builds the lattice.
    ///
    /// **Context**: The grid is the only component with configuration that
    /// can be invalid, and it is built once at start-up, so this is where
    /// bad settings are rejected.
    ///
    /// **How it Works**: Validates `size > 0` and a finite `delta > 0`, then
    /// fills the sample positions `(x, y, z) * delta`.
    pub fn new(size: usize, delta: f32) -> Result<Self> {
        if size == 0 {
            return Err(CollisionError::InvalidGrid(
                "grid size must be at least 1".to_string(),
            ));
        }
        if !(delta.is_finite() && delta > 0.0) {
            return Err(CollisionError::InvalidGrid(format!(
                "grid delta must be a positive number, got {}",
                delta
            )));
        }

        let points = iproduct!(0..size, 0..size, 0..size)
            .map(|(x, y, z)| Vec3::new(x as f32, y as f32, z as f32) * delta)
            .collect();

        log::debug!("built {0}x{0}x{0} grid with delta {1}", size, delta);

        Ok(Self {
            size,
            delta,
            points,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn delta(&self) -> f32 {
        self.delta
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    fn flat_index(&self, index: VoxelIndex) -> usize {
        (index.x * self.size + index.y) * self.size + index.z
    }

    /// Sample position of `index`, or `None` outside the lattice.
    pub fn get(&self, index: VoxelIndex) -> Option<Vec3> {
        if index.x < self.size && index.y < self.size && index.z < self.size {
            Some(self.points[self.flat_index(index)])
        } else {
            None
        }
    }

    /// Sample position of `index`, saturating out-of-range axes.
    pub fn position(&self, index: VoxelIndex) -> Vec3 {
        let last = self.size - 1;
        let clamped = VoxelIndex::new(index.x.min(last), index.y.min(last), index.z.min(last));
        self.points[self.flat_index(clamped)]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vec3> {
        self.points.iter()
    }

    /// Voxel whose sample is nearest to `position`.
    ///
    /// **Context**: Meshes move freely through world space while the grid is
    /// fixed, so each update starts by snapping the mesh pivot to a voxel.
    ///
    /// **How it Works**: Per axis, divides by `delta`; when the fractional
    /// part is greater than one half the value rounds up, otherwise it
    /// rounds down (so exact halves round down). The result is clamped to
    /// `[0, size - 1]`.
    pub fn nearest_voxel(&self, position: Vec3) -> VoxelIndex {
        VoxelIndex::new(
            self.nearest_axis_index(position.x),
            self.nearest_axis_index(position.y),
            self.nearest_axis_index(position.z),
        )
    }

    fn nearest_axis_index(&self, coordinate: f32) -> usize {
        let scaled = coordinate / self.delta;
        let rounded = if scaled - scaled.trunc() > 0.5 {
            scaled + 1.0
        } else {
            scaled
        };
        rounded.clamp(0.0, (self.size - 1) as f32) as usize
    }

    /// Per-axis index ranges of the candidate window around `center`.
    ///
    /// **Context**: Only samples near the mesh can be inside it. The window
    /// grows with the object's scale so that larger meshes are fully covered.
    ///
    /// **How it Works**: For each axis the half-width is
    /// `half_extent + floor(|scale|) - 1` voxels. Both ends are clamped to
    /// `[0, size - 1]` and the upper end is exclusive. A non-positive
    /// half-width yields an empty range.
    pub fn window_bounds(
        &self,
        center: VoxelIndex,
        scale: Vec3,
        half_extent: u32,
    ) -> [Range<usize>; 3] {
        let last = (self.size - 1) as i64;
        let axis_range = |axis: usize| {
            let c = center.axis(axis) as i64;
            let reach = half_extent as i64 + scale.component(axis).abs().floor() as i64 - 1;
            let max = (c + reach).clamp(0, last) as usize;
            let min = (c - reach).clamp(0, last) as usize;
            min..max.max(min)
        };
        [axis_range(0), axis_range(1), axis_range(2)]
    }

    /// Sample points inside the candidate window, in x, then y, then z order.
    pub fn candidate_window(&self, center: VoxelIndex, scale: Vec3, half_extent: u32) -> Vec<Vec3> {
        let [xs, ys, zs] = self.window_bounds(center, scale, half_extent);
        iproduct!(xs, ys, zs)
            .map(|(x, y, z)| self.points[self.flat_index(VoxelIndex::new(x, y, z))])
            .collect()
    }
}
