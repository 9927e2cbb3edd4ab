//! Skeleton builder
//!
//! Flattens every armature into one joint list. Joints are numbered in
//! armature order, then bone order, and a parent always comes before its
//! children.

use glam::{Mat4, Quat, Vec3};
use hashbrown::HashMap;

use crate::error::{ExportError, Result};
use crate::pool::{PoolKey, PoolValue, ValuePool};
use crate::scene::HostArmature;

/// Parent index written for root joints
pub const ROOT_PARENT: i32 = -1;

/// A joint in the flattened skeleton
#[derive(Debug, Clone)]
pub struct Joint {
    /// Bone name, unique within the model
    pub name: String,
    /// Index of the parent joint, or [`ROOT_PARENT`]
    pub parent: i32,
    /// World-space bind pose, inverted
    pub inverse_bind: Mat4,
    /// Owning armature index
    pub armature: usize,
    /// Bone index within the armature
    pub bone: usize,
    /// Interned parent-relative bind translation
    pub bind_position: PoolKey,
    /// Interned parent-relative bind rotation
    pub bind_orientation: PoolKey,
    /// One matrix per sampled frame of the armature's track
    pub frames: Vec<Mat4>,
}

/// Flattened joint list with (armature, bone) lookup
#[derive(Debug, Clone, Default)]
pub struct Skeleton {
    pub joints: Vec<Joint>,
    lookup: HashMap<(usize, usize), usize>,
    by_name: HashMap<String, usize>,
}

impl Skeleton {
    /// Global joint index of a bone
    pub fn joint_index(&self, armature: usize, bone: usize) -> Option<usize> {
        self.lookup.get(&(armature, bone)).copied()
    }

    /// Global joint index of a bone by name
    pub fn joint_by_name(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Joints belonging to one armature, in joint order
    pub fn armature_joints(&self, armature: usize) -> impl Iterator<Item = (usize, &Joint)> {
        self.joints
            .iter()
            .enumerate()
            .filter(move |(_, joint)| joint.armature == armature)
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }
}

/// Translation and rotation of `transform` relative to `parent`
pub fn local_pose(parent: Option<Mat4>, transform: Mat4) -> (Vec3, Quat) {
    let local = match parent {
        Some(parent) => parent.inverse() * transform,
        None => transform,
    };
    let (_scale, rotation, translation) = local.to_scale_rotation_translation();
    (translation, rotation)
}

/// Matrix of an interned (position, orientation) pair
pub fn pose_matrix(pool: &ValuePool, position: PoolKey, orientation: PoolKey) -> Mat4 {
    let translation = pool
        .get(position)
        .and_then(PoolValue::as_position)
        .unwrap_or(Vec3::ZERO);
    let rotation = pool
        .get(orientation)
        .and_then(PoolValue::as_orientation)
        .map(Quat::normalize)
        .unwrap_or(Quat::IDENTITY);
    Mat4::from_rotation_translation(rotation, translation)
}

/// Build the joint list from armatures in source order
pub fn build_skeleton(armatures: &[HostArmature], pool: &mut ValuePool) -> Result<Skeleton> {
    let mut skeleton = Skeleton::default();

    for (armature_index, armature) in armatures.iter().enumerate() {
        for (bone_index, bone) in armature.bones.iter().enumerate() {
            if skeleton.by_name.contains_key(&bone.name) {
                return Err(ExportError::DuplicateJointName(bone.name.clone()));
            }

            let (parent, parent_bind) = match bone.parent {
                Some(parent_bone) => {
                    let parent_joint = skeleton
                        .joint_index(armature_index, parent_bone)
                        .ok_or_else(|| ExportError::ParentNotDefined {
                            armature: armature.name.clone(),
                            bone: bone.name.clone(),
                        })?;
                    (
                        parent_joint as i32,
                        Some(armature.bones[parent_bone].bind),
                    )
                }
                None => (ROOT_PARENT, None),
            };

            let (position, orientation) = local_pose(parent_bind, bone.bind);
            let (bind_position, bind_orientation) = pool.intern_pose(position, orientation);

            let index = skeleton.joints.len();
            skeleton.joints.push(Joint {
                name: bone.name.clone(),
                parent,
                inverse_bind: (armature.world * bone.bind).inverse(),
                armature: armature_index,
                bone: bone_index,
                bind_position,
                bind_orientation,
                frames: Vec::new(),
            });
            skeleton.lookup.insert((armature_index, bone_index), index);
            skeleton.by_name.insert(bone.name.clone(), index);
        }
    }

    if !skeleton.is_empty() {
        tracing::info!(
            "Skeleton: {} joints from {} armature(s)",
            skeleton.len(),
            armatures.len()
        );
    }

    Ok(skeleton)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::HostBone;

    fn chain_armature() -> HostArmature {
        HostArmature {
            name: "Rig".to_string(),
            world: Mat4::IDENTITY,
            bones: vec![
                HostBone::new("Root", None, Vec3::ZERO, Quat::IDENTITY),
                HostBone::new("Spine", Some(0), Vec3::Y, Quat::IDENTITY),
                HostBone::new("Head", Some(1), Vec3::new(0.0, 2.0, 0.0), Quat::IDENTITY),
            ],
        }
    }

    #[test]
    fn test_chain_parents() {
        let mut pool = ValuePool::new();
        let skeleton = build_skeleton(&[chain_armature()], &mut pool).unwrap();
        let parents: Vec<i32> = skeleton.joints.iter().map(|j| j.parent).collect();
        assert_eq!(parents, vec![-1, 0, 1]);
        assert_eq!(skeleton.joint_by_name("Head"), Some(2));
    }

    #[test]
    fn test_local_bind_is_parent_relative() {
        let mut pool = ValuePool::new();
        let skeleton = build_skeleton(&[chain_armature()], &mut pool).unwrap();
        let head = &skeleton.joints[2];
        let position = pool.get(head.bind_position).and_then(PoolValue::as_position);
        assert_eq!(position, Some(Vec3::Y));
    }

    #[test]
    fn test_inverse_bind_includes_armature_world() {
        let mut armature = chain_armature();
        armature.world = Mat4::from_translation(Vec3::X);
        let mut pool = ValuePool::new();
        let skeleton = build_skeleton(&[armature], &mut pool).unwrap();

        // Spine sits at (1, 1, 0) in world space
        let p = skeleton.joints[1]
            .inverse_bind
            .transform_point3(Vec3::new(1.0, 1.0, 0.0));
        assert!(p.length() < 1e-6);
    }

    #[test]
    fn test_two_armatures_share_numbering() {
        let mut second = chain_armature();
        for bone in &mut second.bones {
            bone.name = format!("B_{}", bone.name);
        }
        let mut pool = ValuePool::new();
        let skeleton = build_skeleton(&[chain_armature(), second], &mut pool).unwrap();
        assert_eq!(skeleton.len(), 6);
        assert_eq!(skeleton.joints[4].parent, 3);
        assert_eq!(skeleton.joint_index(1, 0), Some(3));
        assert_eq!(skeleton.armature_joints(1).count(), 3);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut pool = ValuePool::new();
        let err = build_skeleton(&[chain_armature(), chain_armature()], &mut pool).unwrap_err();
        assert!(matches!(err, ExportError::DuplicateJointName(name) if name == "Root"));
    }

    #[test]
    fn test_parent_after_child_rejected() {
        let mut armature = chain_armature();
        armature.bones[1].parent = Some(2);
        let mut pool = ValuePool::new();
        let err = build_skeleton(&[armature], &mut pool).unwrap_err();
        assert!(matches!(err, ExportError::ParentNotDefined { bone, .. } if bone == "Spine"));
    }

    #[test]
    fn test_pose_matrix_round_trips_interned_keys() {
        let mut pool = ValuePool::new();
        let (p, o) = pool.intern_pose(Vec3::new(1.0, 2.0, 3.0), Quat::IDENTITY);
        let m = pose_matrix(&pool, p, o);
        assert_eq!(m, Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)));
    }
}
