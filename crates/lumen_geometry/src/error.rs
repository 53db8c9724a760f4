//! Errors raised while constructing geometry.
//!
//! Ray queries never fail; only building shapes and trees can.

use thiserror::Error;

/// Precondition violations caught at construction time.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("Cannot build a BVH over an empty primitive set")]
    EmptyPrimitiveSet,

    #[error("Radius must be positive, got {0}")]
    NonPositiveRadius(f32),

    #[error("Shape axis has zero length")]
    DegenerateAxis,

    #[error("Mesh face {face} references vertex {index}, but the mesh has {vertex_count} vertices")]
    IndexOutOfRange {
        face: usize,
        index: u32,
        vertex_count: usize,
    },

    #[error("Mesh has {uvs} UV coordinates for {vertices} vertices")]
    MismatchedUvs { uvs: usize, vertices: usize },

    #[error("Instance transform is not invertible")]
    SingularTransform,

    #[error("Invalid BVH configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for geometry construction.
pub type GeometryResult<T> = Result<T, GeometryError>;
