//! Voxel-sampled point-in-mesh classification and collision detection.
//!
//! Space is sampled on a fixed [`grid::SpatialGrid`]. Each mesh owns a
//! [`containment::ContainmentEngine`] that finds the samples inside it by
//! ray-crossing parity, and two meshes collide when they share a sample.

pub mod collision;
pub mod containment;
pub mod error;
pub mod geom;
pub mod grid;
pub mod output;
pub mod plane;
pub mod ray;
pub mod settings;
pub mod sweep;
pub mod vector;
