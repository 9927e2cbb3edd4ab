//! In-memory scene
//!
//! Holds meshes and armatures as plain values and answers pose queries from
//! a per-frame pose table. Bones without an entry for a frame stay in their
//! bind pose.

use super::{HostArmature, HostMesh, SceneProvider};
use glam::Mat4;
use hashbrown::HashMap;

/// Scene built directly in code
#[derive(Debug, Clone, Default)]
pub struct MemoryScene {
    pub meshes: Vec<HostMesh>,
    pub armatures: Vec<HostArmature>,
    pub frame_range: Option<(i32, i32)>,
    pub frame_rate: Option<f32>,
    current_frame: i32,
    /// (armature, bone, frame) -> armature-space transform
    poses: HashMap<(usize, usize, i32), Mat4>,
}

impl MemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mesh(mut self, mesh: HostMesh) -> Self {
        self.meshes.push(mesh);
        self
    }

    pub fn with_armature(mut self, armature: HostArmature) -> Self {
        self.armatures.push(armature);
        self
    }

    /// Set the animation range and rate
    pub fn with_animation(mut self, start: i32, end: i32, frame_rate: Option<f32>) -> Self {
        self.frame_range = Some((start, end));
        self.frame_rate = frame_rate;
        self
    }

    /// Record a bone's armature-space transform at a frame
    pub fn set_pose(&mut self, armature: usize, bone: usize, frame: i32, transform: Mat4) {
        self.poses.insert((armature, bone, frame), transform);
    }
}

impl SceneProvider for MemoryScene {
    fn meshes(&self) -> Vec<HostMesh> {
        self.meshes.clone()
    }

    fn armatures(&self) -> Vec<HostArmature> {
        self.armatures.clone()
    }

    fn pose(&self, armature: usize, bone: usize) -> Mat4 {
        if let Some(transform) = self.poses.get(&(armature, bone, self.current_frame)) {
            return *transform;
        }
        self.armatures
            .get(armature)
            .and_then(|a| a.bones.get(bone))
            .map(|b| b.bind)
            .unwrap_or(Mat4::IDENTITY)
    }

    fn current_frame(&self) -> i32 {
        self.current_frame
    }

    fn set_frame(&mut self, frame: i32) {
        self.current_frame = frame;
    }

    fn frame_range(&self) -> Option<(i32, i32)> {
        self.frame_range
    }

    fn frame_rate(&self) -> Option<f32> {
        self.frame_rate
    }
}
