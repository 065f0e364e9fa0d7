use thiserror::Error;

/// Result type for mesh containment operations
pub type Result<T> = std::result::Result<T, CollisionError>;

/// Errors that can occur while building planes, grids and meshes
#[derive(Error, Debug)]
pub enum CollisionError {
    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),

    #[error("Invalid grid configuration: {0}")]
    InvalidGrid(String),

    #[error("Containment engine has no mesh attached")]
    Detached,

    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),

    #[error("Failed to load mesh '{path}': {source}")]
    MeshLoad {
        path: String,
        #[source]
        source: tobj::LoadError,
    },
}
