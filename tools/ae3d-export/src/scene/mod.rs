//! Scene providers
//!
//! The exporter never reads host-owned structures directly. A provider copies
//! what the pipeline needs (meshes, armatures) into plain values and answers
//! pose queries at the current playhead.
//!
//! Providers:
//! - [`MemoryScene`] - plain data, built in code
//! - [`ObjScene`] - Wavefront OBJ files (static geometry)
//! - [`GltfScene`] - glTF/GLB files (geometry, skins, animation)

mod gltf;
mod memory;
mod obj;

pub use self::gltf::GltfScene;
pub use memory::MemoryScene;
pub use obj::ObjScene;

use glam::{Mat4, Quat, Vec3};
use std::ops::{Deref, DerefMut};

/// One corner of a host face
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceCorner {
    /// Index into [`HostMesh::positions`]
    pub vertex: u32,
    /// Source UV (not yet flipped), if the mesh has an active UV layer
    pub uv: Option<[f32; 2]>,
    /// RGBA color, if the mesh has a color layer
    pub color: Option<[f32; 4]>,
    /// Split normal for this corner, overriding the vertex normal when smooth
    pub normal: Option<Vec3>,
    /// Host tangent (xyz + handedness), when the host computes its own
    pub tangent: Option<[f32; 4]>,
}

impl FaceCorner {
    pub fn new(vertex: u32) -> Self {
        Self {
            vertex,
            uv: None,
            color: None,
            normal: None,
            tangent: None,
        }
    }

    pub fn with_uv(mut self, uv: [f32; 2]) -> Self {
        self.uv = Some(uv);
        self
    }

    pub fn with_color(mut self, color: [f32; 4]) -> Self {
        self.color = Some(color);
        self
    }
}

/// A triangle or quad as the host stores it
#[derive(Debug, Clone, PartialEq)]
pub struct HostFace {
    /// 3 or 4 corners
    pub corners: Vec<FaceCorner>,
    /// Flat face normal in object space
    pub normal: Vec3,
    /// Smooth shading flag
    pub smooth: bool,
}

/// Bone weight membership of a host vertex
#[derive(Debug, Clone, PartialEq)]
pub struct VertexGroupWeight {
    /// Bone name the group is bound to
    pub bone: String,
    pub weight: f32,
}

impl VertexGroupWeight {
    pub fn new(bone: impl Into<String>, weight: f32) -> Self {
        Self {
            bone: bone.into(),
            weight,
        }
    }
}

/// Mesh object copied out of the host
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostMesh {
    pub name: String,
    /// Accumulated object-to-world transform
    pub world: Mat4,
    /// Object-space vertex positions
    pub positions: Vec<Vec3>,
    /// Object-space vertex normals (same length as `positions`)
    pub normals: Vec<Vec3>,
    pub faces: Vec<HostFace>,
    /// Auto-smooth requested for this object
    pub auto_smooth: bool,
    /// Auto-smooth threshold in degrees (config default when `None`)
    pub auto_smooth_angle: Option<f32>,
    /// Vertex group memberships per vertex (empty when the mesh has none)
    pub groups: Vec<Vec<VertexGroupWeight>>,
}

impl HostMesh {
    /// Memberships of one vertex, empty if the mesh carries no groups
    pub fn groups_of(&self, vertex: u32) -> &[VertexGroupWeight] {
        self.groups
            .get(vertex as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Bone in rest pose
#[derive(Debug, Clone, PartialEq)]
pub struct HostBone {
    pub name: String,
    /// Parent bone index within the same armature
    pub parent: Option<usize>,
    /// Bind transform in armature space (translation + rotation; scale is not modeled)
    pub bind: Mat4,
}

impl HostBone {
    pub fn new(name: impl Into<String>, parent: Option<usize>, translation: Vec3, rotation: Quat) -> Self {
        Self {
            name: name.into(),
            parent,
            bind: Mat4::from_rotation_translation(rotation, translation),
        }
    }
}

/// Armature object copied out of the host
#[derive(Debug, Clone, PartialEq)]
pub struct HostArmature {
    pub name: String,
    /// Armature-to-world transform
    pub world: Mat4,
    /// Bones in source order
    pub bones: Vec<HostBone>,
}

/// Read-only view of a host scene, plus the animation playhead
pub trait SceneProvider {
    /// Selected mesh objects
    fn meshes(&self) -> Vec<HostMesh>;

    /// Armatures in source order
    fn armatures(&self) -> Vec<HostArmature>;

    /// Armature-space transform of a bone at the current playhead
    fn pose(&self, armature: usize, bone: usize) -> Mat4;

    /// Current playhead frame
    fn current_frame(&self) -> i32;

    /// Move the playhead
    fn set_frame(&mut self, frame: i32);

    /// Inclusive animation frame range, `None` when the scene has no animation
    fn frame_range(&self) -> Option<(i32, i32)>;

    /// Frames per second configured in the host, if it has one
    fn frame_rate(&self) -> Option<f32>;
}

impl<P: SceneProvider + ?Sized> SceneProvider for Box<P> {
    fn meshes(&self) -> Vec<HostMesh> {
        (**self).meshes()
    }

    fn armatures(&self) -> Vec<HostArmature> {
        (**self).armatures()
    }

    fn pose(&self, armature: usize, bone: usize) -> Mat4 {
        (**self).pose(armature, bone)
    }

    fn current_frame(&self) -> i32 {
        (**self).current_frame()
    }

    fn set_frame(&mut self, frame: i32) {
        (**self).set_frame(frame)
    }

    fn frame_range(&self) -> Option<(i32, i32)> {
        (**self).frame_range()
    }

    fn frame_rate(&self) -> Option<f32> {
        (**self).frame_rate()
    }
}

/// Scoped playhead acquisition.
///
/// Remembers the playhead on creation and puts it back when dropped, so every
/// exit path (including `?` and panics) leaves the host where it was.
pub struct PlayheadGuard<'a, P: SceneProvider + ?Sized> {
    provider: &'a mut P,
    saved: i32,
}

impl<'a, P: SceneProvider + ?Sized> PlayheadGuard<'a, P> {
    pub fn new(provider: &'a mut P) -> Self {
        let saved = provider.current_frame();
        Self { provider, saved }
    }

    /// Frame the playhead will be restored to
    pub fn saved_frame(&self) -> i32 {
        self.saved
    }
}

impl<P: SceneProvider + ?Sized> Deref for PlayheadGuard<'_, P> {
    type Target = P;

    fn deref(&self) -> &P {
        self.provider
    }
}

impl<P: SceneProvider + ?Sized> DerefMut for PlayheadGuard<'_, P> {
    fn deref_mut(&mut self) -> &mut P {
        self.provider
    }
}

impl<P: SceneProvider + ?Sized> Drop for PlayheadGuard<'_, P> {
    fn drop(&mut self) {
        if self.provider.current_frame() != self.saved {
            self.provider.set_frame(self.saved);
        }
        tracing::debug!("Playhead restored to frame {}", self.saved);
    }
}

/// Flat normal of a polygon from its first three corners
pub(crate) fn polygon_normal(positions: &[Vec3], corners: &[u32]) -> Vec3 {
    if corners.len() < 3 {
        return Vec3::ZERO;
    }
    let p0 = positions[corners[0] as usize];
    let p1 = positions[corners[1] as usize];
    let p2 = positions[corners[2] as usize];
    (p1 - p0).cross(p2 - p0).normalize_or_zero()
}

/// Per-vertex normals as the normalized sum of adjacent face normals
pub(crate) fn average_vertex_normals(positions: &[Vec3], faces: &[HostFace]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for face in faces {
        for corner in &face.corners {
            normals[corner.vertex as usize] += face.normal;
        }
    }
    normals.into_iter().map(Vec3::normalize_or_zero).collect()
}
