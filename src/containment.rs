//! Point-in-mesh classification over a shared sampling grid.
//!
//! This module decides which grid samples lie inside a closed triangle mesh.
//! Each update rebuilds the mesh planes from the current world-space
//! triangles, selects the candidate samples around the mesh pivot, and casts
//! a fixed-direction ray from every candidate. A candidate whose ray crosses
//! the surface an odd number of times is inside.
//!
//! The containment system provides:
//! - A per-mesh engine with an explicit `Idle` / `Ready` / `Evaluated` lifecycle
//! - Full rebuild of planes and point lists every update, no incremental state
//! - Local recovery from degenerate triangles and parallel rays
//! - Per-update statistics for diagnostics
//!
//! # Key Components
//!
//! - [`ContainmentEngine`]: Owns the plane set and point lists of one mesh
//! - [`MeshSnapshot`]: The world-space input handed over by the host each update
//! - [`ContainmentParams`]: Window size and ray settings shared by all engines

use serde::{Deserialize, Serialize};

use crate::error::{CollisionError, Result};
use crate::geom::{Aabb, Triangle};
use crate::grid::{SpatialGrid, VoxelIndex};
use crate::plane::Plane;
use crate::ray::{CrossingTally, Ray};
use crate::vector::Vec3;


/// Tuning shared by every engine in a scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContainmentParams {
    pub half_extent: u32,                 // window half-width in voxels at unit scale
    pub ray_direction: Vec3,              // direction of the parity ray
    pub ray_length: f32,                  // must exceed the mesh extent
    pub merge_coincident_crossings: bool, // count shared-edge hits once
}

impl Default for ContainmentParams {
    fn default() -> Self {
        Self {
            half_extent: 1,
            ray_direction: Vec3::FORWARD,
            ray_length: 10.0,
            merge_coincident_crossings: true,
        }
    }
}

/// World-space description of a mesh for one update.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshSnapshot {
    pub triangles: Vec<Triangle>,
    pub pivot: Vec3, // world position used for the voxel lookup
    pub scale: Vec3, // local scale used to size the candidate window
}

/// Lifecycle of a [`ContainmentEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EngineState {
    Idle,      // no mesh attached
    Ready,     // attached, waiting for the first update
    Evaluated, // planes and inside points match the latest snapshot
}

/// Counters from the most recent update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EvaluationStats {
    pub triangles: usize,
    pub degenerate_triangles: usize,
    pub candidates: usize,
    pub inside: usize,
    pub parallel_tests: usize,
    pub coincident_merges: usize,
}

/// Classifies grid samples against one mesh.
///
/// **Context**: Two meshes overlap when some region of space is inside both.
/// Sampling that region on a shared grid turns the question into a comparison
/// of point sets, so each mesh needs its current set of enclosed samples.
///
/// **How it Works**: On every update the engine discards its previous state,
/// rebuilds one plane per triangle, snaps the mesh pivot to the nearest voxel,
/// collects the candidate window around it and keeps every candidate whose
/// parity ray reports an odd crossing count.
#[derive(Debug, Clone)]
pub struct ContainmentEngine {
    params: ContainmentParams,
    state: EngineState,
    planes: Vec<Option<Plane>>, // one slot per triangle, None when degenerate
    nearest_voxel: Option<VoxelIndex>,
    candidates: Vec<Vec3>,
    inside: Vec<Vec3>,
    stats: EvaluationStats,
}

impl ContainmentEngine {
    pub fn new(params: ContainmentParams) -> Self {
        Self {
            params,
            state: EngineState::Idle,
            planes: Vec::new(),
            nearest_voxel: None,
            candidates: Vec::new(),
            inside: Vec::new(),
            stats: EvaluationStats::default(),
        }
    }

    pub fn params(&self) -> &ContainmentParams {
        &self.params
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Marks a mesh as attached. The engine waits for its first update.
    pub fn attach(&mut self) {
        if self.state == EngineState::Idle {
            self.state = EngineState::Ready;
        }
    }

    /// Drops the mesh and every derived list.
    pub fn detach(&mut self) {
        self.state = EngineState::Idle;
        self.planes.clear();
        self.nearest_voxel = None;
        self.candidates.clear();
        self.inside.clear();
        self.stats = EvaluationStats::default();
    }

    /// Recomputes the inside-point set for the mesh's current pose.
    ///
    /// **Context**: Meshes move and rotate between updates, so nothing from
    /// the previous update can be reused. The host calls this once per tick.
    ///
    /// **How it Works**: Rebuilds planes from `snapshot.triangles` (skipping
    /// zero-area triangles), finds the nearest voxel to `snapshot.pivot`,
    /// enumerates the candidate window scaled by `snapshot.scale`, and casts
    /// one ray per candidate. Returns the new inside points.
    pub fn update(&mut self, grid: &SpatialGrid, snapshot: &MeshSnapshot) -> Result<&[Vec3]> {
        if self.state == EngineState::Idle {
            return Err(CollisionError::Detached);
        }

        self.stats = EvaluationStats {
            triangles: snapshot.triangles.len(),
            ..EvaluationStats::default()
        };

        self.rebuild_planes(&snapshot.triangles);
        self.warn_if_ray_too_short(&snapshot.triangles);

        let nearest = grid.nearest_voxel(snapshot.pivot);
        self.nearest_voxel = Some(nearest);
        self.candidates = grid.candidate_window(nearest, snapshot.scale, self.params.half_extent);
        self.stats.candidates = self.candidates.len();

        self.classify_candidates();

        self.state = EngineState::Evaluated;
        log::debug!(
            "voxel {:?}: {} planes, {} candidates, {} inside",
            nearest,
            self.planes.len() - self.stats.degenerate_triangles,
            self.stats.candidates,
            self.stats.inside
        );

        Ok(&self.inside)
    }

    fn rebuild_planes(&mut self, triangles: &[Triangle]) {
        self.planes.clear();
        for triangle in triangles {
            match Plane::from_points(triangle.a, triangle.b, triangle.c) {
                Ok(plane) => self.planes.push(Some(plane)),
                Err(err) => {
                    log::trace!("skipping triangle: {}", err);
                    self.stats.degenerate_triangles += 1;
                    self.planes.push(None);
                }
            }
        }
    }

    fn warn_if_ray_too_short(&self, triangles: &[Triangle]) {
        let vertices = triangles.iter().flat_map(|t| [t.a, t.b, t.c]);
        if let Some(aabb) = Aabb::from_points(vertices) {
            if aabb.extent() > self.params.ray_length {
                log::warn!(
                    "mesh extent {:.3} exceeds ray length {:.3}; interior points may be missed",
                    aabb.extent(),
                    self.params.ray_length
                );
            }
        }
    }

    fn classify_candidates(&mut self) {
        self.inside.clear();
        for &point in &self.candidates {
            let tally = self.cast_from(point);
            self.stats.parallel_tests += tally.parallel;
            self.stats.coincident_merges += tally.raw_hits - tally.crossings;
            log::trace!("{:?}: {} crossings", point, tally.crossings);
            if tally.is_odd() {
                self.inside.push(point);
            }
        }
        self.stats.inside = self.inside.len();
    }

    fn cast_from(&self, point: Vec3) -> CrossingTally {
        let ray = Ray::new(point, self.params.ray_direction, self.params.ray_length);
        ray.cast(&self.planes, self.params.merge_coincident_crossings)
    }

    /// Classifies an arbitrary point against the current planes.
    pub fn is_inside(&self, point: Vec3) -> bool {
        self.state == EngineState::Evaluated && self.cast_from(point).is_odd()
    }

    /// Planes built in the latest update, degenerate triangles excluded.
    pub fn planes(&self) -> Vec<&Plane> {
        self.planes.iter().flatten().collect()
    }

    pub fn nearest_voxel(&self) -> Option<VoxelIndex> {
        self.nearest_voxel
    }

    pub fn candidates(&self) -> &[Vec3] {
        &self.candidates
    }

    /// Grid samples inside the mesh as of the latest update.
    pub fn inside_points(&self) -> &[Vec3] {
        &self.inside
    }

    pub fn last_stats(&self) -> &EvaluationStats {
        &self.stats
    }
}
