//! Fatal export errors
//!
//! Geometry-local anomalies (degenerate UVs, unnormalized or overflowing
//! weights) are corrected in place and only logged. Everything here aborts the
//! export before the output file is created.

use std::path::PathBuf;

/// Errors that abort an export
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// A mesh has more vertices than the u16 count field can hold
    #[error("mesh '{mesh}' has {count} vertices, maximum is 65535 (split the mesh)")]
    VertexCapacityExceeded { mesh: String, count: usize },

    /// A mesh has more triangles than the u16 count field can hold
    #[error("mesh '{mesh}' has {count} faces, maximum is 65535 (split the mesh)")]
    FaceCapacityExceeded { mesh: String, count: usize },

    /// More meshes than the u16 mesh count can hold
    #[error("model has {0} meshes, maximum is 65535")]
    MeshCapacityExceeded(usize),

    /// More joints than the u16 joint count can hold
    #[error("skeleton has {0} joints, maximum is 65535")]
    JointCapacityExceeded(usize),

    /// A name doesn't fit its length field
    #[error("name of {len} bytes is too long, maximum is {max}")]
    NameTooLong { len: usize, max: usize },

    /// Two bones in the model share a name
    #[error("duplicate joint name '{0}' (bone names must be unique within a model)")]
    DuplicateJointName(String),

    /// A bone refers to a parent that hasn't been assigned a joint index
    #[error("bone '{bone}' in armature '{armature}' refers to a parent that is not defined before it")]
    ParentNotDefined { armature: String, bone: String },

    /// The mesh's capability set has no legacy wire byte
    #[error("vertex format {0:#04x} cannot be written (supported: PTNTC, PTN, PTNTC+skin)")]
    UnsupportedVertexFormat(u8),

    /// Encoded bytes could not be written to the destination
    #[error("failed to write model data")]
    Write(#[from] std::io::Error),

    /// Output file could not be created or written
    #[error("failed to write {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T, E = ExportError> = std::result::Result<T, E>;
