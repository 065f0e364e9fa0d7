//! Meshes, poses and the world-space triangles handed to containment engines.
//!
//! The containment engine only consumes world-space triangles plus a pivot
//! and a scale. This module is the thin host layer that produces them: an
//! indexed triangle [`Mesh`] in model space, a [`Pose`] that places it in the
//! world, and a [`Body`] that pairs the two.

use nalgebra::{Point3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::containment::MeshSnapshot;
use crate::error::{CollisionError, Result};
use crate::vector::Vec3;


/// A triangle in world space, vertices in the winding used to build its plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub a: Vec3,
    pub b: Vec3,
    pub c: Vec3,
}

impl Triangle {
    pub fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self { a, b, c }
    }
}

/// Represents an indexed triangle mesh in model space.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vec3>,      // model-space vertex positions
    pub indices: Vec<[usize; 3]>, // one entry per triangle
}

impl Mesh {
    pub fn new(vertices: Vec<Vec3>, indices: Vec<[usize; 3]>) -> Result<Self> {
        if let Some(bad) = indices.iter().flatten().find(|&&i| i >= vertices.len()) {
            return Err(CollisionError::InvalidMesh(format!(
                "vertex index {} out of range for {} vertices",
                bad,
                vertices.len()
            )));
        }
        Ok(Self { vertices, indices })
    }

    /// Axis-aligned cube centred on the origin, wound counter-clockwise seen
    /// from outside so that every face normal points outward.
    pub fn cube(half_extent: f32) -> Self {
        let h = half_extent;
        let vertices = vec![
            Vec3::new(-h, -h, -h),
            Vec3::new(h, -h, -h),
            Vec3::new(h, h, -h),
            Vec3::new(-h, h, -h),
            Vec3::new(-h, -h, h),
            Vec3::new(h, -h, h),
            Vec3::new(h, h, h),
            Vec3::new(-h, h, h),
        ];
        let indices = vec![
            [0, 2, 1], // -z
            [0, 3, 2],
            [4, 5, 6], // +z
            [4, 6, 7],
            [0, 1, 5], // -y
            [0, 5, 4],
            [3, 7, 6], // +y
            [3, 6, 2],
            [0, 4, 7], // -x
            [0, 7, 3],
            [1, 2, 6], // +x
            [1, 6, 5],
        ];
        Self { vertices, indices }
    }

    /// Loads every model of a Wavefront OBJ file into a single mesh,
    /// triangulating polygon faces.
    pub fn from_file(filename: &str) -> Result<Self> {
        let options = tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        };
        let (models, _) =
            tobj::load_obj(filename, &options).map_err(|source| CollisionError::MeshLoad {
                path: filename.to_string(),
                source,
            })?;

        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        for model in &models {
            let mesh = &model.mesh;
            let offset = vertices.len();
            vertices.extend(
                mesh.positions
                    .chunks_exact(3)
                    .map(|p| Vec3::new(p[0], p[1], p[2])),
            );
            indices.extend(mesh.indices.chunks_exact(3).map(|f| {
                [
                    offset + f[0] as usize,
                    offset + f[1] as usize,
                    offset + f[2] as usize,
                ]
            }));
        }

        log::debug!(
            "loaded {} triangles from {} model(s) in '{}'",
            indices.len(),
            models.len(),
            filename
        );

        Self::new(vertices, indices)
    }

    pub fn num_triangles(&self) -> usize {
        self.indices.len()
    }

    /// Model-space triangles.
    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.indices.iter().map(move |&[a, b, c]| {
            Triangle::new(self.vertices[a], self.vertices[b], self.vertices[c])
        })
    }
}

/// Placement of a mesh in the world: scale, then rotate, then translate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    #[serde(default)]
    pub rotation: [f32; 3], // roll, pitch, yaw in degrees
    #[serde(default = "unit_scale")]
    pub scale: Vec3,
}

fn unit_scale() -> Vec3 {
    Vec3::ONE
}

impl Default for Pose {
    fn default() -> Self {
        Self::at(Vec3::ZERO)
    }
}

impl Pose {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation: [0.0; 3],
            scale: Vec3::ONE,
        }
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_rotation(mut self, degrees: [f32; 3]) -> Self {
        self.rotation = degrees;
        self
    }

    fn quaternion(&self) -> UnitQuaternion<f32> {
        let [roll, pitch, yaw] = self.rotation.map(f32::to_radians);
        UnitQuaternion::from_euler_angles(roll, pitch, yaw)
    }

    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        let scaled: Vector3<f32> = point.scale(self.scale).into();
        let rotated = self.quaternion() * Point3::from(scaled);
        Vec3::from(rotated) + self.position
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Smallest box around `points`, or `None` for no points.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        points.into_iter().fold(None, |acc, p| match acc {
            None => Some(Self { min: p, max: p }),
            Some(b) => Some(Self {
                min: Vec3::min(b.min, p),
                max: Vec3::max(b.max, p),
            }),
        })
    }

    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Length of the box diagonal.
    pub fn extent(&self) -> f32 {
        (self.max - self.min).magnitude()
    }
}

/// A named mesh at a pose. This is what the host moves around every tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub name: String,
    pub mesh: Mesh,
    pub pose: Pose,
}

impl Body {
    pub fn new(name: &str, mesh: Mesh, pose: Pose) -> Self {
        Self {
            name: name.to_string(),
            mesh,
            pose,
        }
    }

    pub fn world_triangles(&self) -> Vec<Triangle> {
        self.mesh
            .triangles()
            .map(|t| {
                Triangle::new(
                    self.pose.transform_point(t.a),
                    self.pose.transform_point(t.b),
                    self.pose.transform_point(t.c),
                )
            })
            .collect()
    }

    pub fn aabb(&self) -> Option<Aabb> {
        Aabb::from_points(self.mesh.vertices.iter().map(|&v| self.pose.transform_point(v)))
    }

    /// Everything a containment engine needs for one update.
    pub fn snapshot(&self) -> MeshSnapshot {
        MeshSnapshot {
            triangles: self.world_triangles(),
            pivot: self.pose.position,
            scale: self.pose.scale,
        }
    }
}
