//! Types and constants for mesh extraction

use super::aabb::Aabb;
use ae3d_common::MAX_INFLUENCES;
use glam::Vec3;

/// Opaque white, used when the host has no color layer
pub const DEFAULT_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// Fully extracted vertex in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    /// Engine-space UV (V already flipped)
    pub uv: [f32; 2],
    /// xyz unit tangent, w = handedness (+1 or -1)
    pub tangent: [f32; 4],
    pub color: [f32; 4],
}

/// One joint influence on a vertex
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkinInfluence {
    pub joint: i32,
    pub weight: f32,
}

impl SkinInfluence {
    /// Padding for unused influence slots
    pub const NONE: Self = Self {
        joint: 0,
        weight: 0.0,
    };

    pub fn new(joint: i32, weight: f32) -> Self {
        Self { joint, weight }
    }
}

/// Fixed-size influence set written per skinned vertex
pub type SkinWeights = [SkinInfluence; MAX_INFLUENCES];

/// Mesh ready for encoding
#[derive(Debug, Clone)]
pub struct Mesh {
    pub name: String,
    pub vertices: Vec<Vertex>,
    /// Triangles as vertex indices local to this mesh
    pub triangles: Vec<[u32; 3]>,
    pub aabb: Aabb,
    /// Vertex capability flags (`FORMAT_*`)
    pub format: u8,
    /// Per-vertex influences, present only on skinned meshes
    pub skin: Option<Vec<SkinWeights>>,
}

impl Mesh {
    pub fn is_skinned(&self) -> bool {
        self.skin.is_some()
    }
}

/// Output of the extractor for one host mesh
#[derive(Debug, Clone)]
pub struct ExtractedMesh {
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub triangles: Vec<[u32; 3]>,
    /// Host vertex each output vertex came from (for vertex group lookup)
    pub sources: Vec<u32>,
    /// Whether every corner supplied its own tangent
    pub has_host_tangents: bool,
}

