//! Mesh extraction (host mesh -> triangles, tangents, bounds)

mod aabb;
mod extract;
mod tangents;
mod types;

// Re-export public API
pub use aabb::Aabb;
pub use extract::extract_mesh;
pub use tangents::compute_tangents;
pub use types::{ExtractedMesh, Mesh, SkinInfluence, SkinWeights, Vertex, DEFAULT_COLOR};
