//! Delta-keyframe animation sampling
//!
//! Steps the host playhead through its frame range and records, per armature,
//! only the joints whose rounded local pose changed since the previous
//! sample. The playhead is put back where it was when sampling ends, however
//! it ends.

use glam::Mat4;

use crate::pool::{PoolKey, ValuePool};
use crate::scene::{PlayheadGuard, SceneProvider};
use crate::skeleton::{local_pose, pose_matrix, Skeleton};

/// Milliseconds per second
const MS_PER_SECOND: f32 = 1000.0;

/// Interned pose of one joint at one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JointKey {
    /// Global joint index
    pub joint: usize,
    pub position: PoolKey,
    pub orientation: PoolKey,
}

/// Joints that changed at one sampled frame
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationFrame {
    /// Host frame number
    pub frame: i32,
    /// Time since the first changed frame
    pub timestamp_ms: f32,
    pub keys: Vec<JointKey>,
}

/// Sampled animation of one armature
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationTrack {
    pub armature: usize,
    pub frames: Vec<AnimationFrame>,
    /// (last changed frame - first changed frame + 1) in milliseconds
    pub length_ms: f32,
}

impl AnimationTrack {
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Per-armature sampling state
struct TrackState {
    armature: usize,
    /// (global joint, last recorded position, last recorded orientation)
    last: Vec<(usize, PoolKey, PoolKey)>,
    frames: Vec<AnimationFrame>,
    first_changed: Option<i32>,
    last_changed: Option<i32>,
}

/// Sample every armature over the provider's frame range.
///
/// Returns one track per armature that has joints (empty tracks included),
/// or nothing when the provider has no animation.
pub fn sample_animation<P: SceneProvider + ?Sized>(
    provider: &mut P,
    skeleton: &Skeleton,
    armature_count: usize,
    pool: &mut ValuePool,
    frame_rate: f32,
) -> Vec<AnimationTrack> {
    let Some((start, end)) = provider.frame_range() else {
        return Vec::new();
    };
    if skeleton.is_empty() || end < start {
        return Vec::new();
    }

    let ms_per_frame = MS_PER_SECOND / frame_rate;

    let mut states: Vec<TrackState> = (0..armature_count)
        .map(|armature| TrackState {
            armature,
            last: skeleton
                .armature_joints(armature)
                .map(|(index, joint)| (index, joint.bind_position, joint.bind_orientation))
                .collect(),
            frames: Vec::new(),
            first_changed: None,
            last_changed: None,
        })
        .filter(|state| !state.last.is_empty())
        .collect();

    let mut guard = PlayheadGuard::new(provider);
    tracing::debug!(
        "Sampling frames {}..={} at {} fps (playhead was {})",
        start,
        end,
        frame_rate,
        guard.saved_frame()
    );

    for frame in start..=end {
        guard.set_frame(frame);

        for state in &mut states {
            let mut keys = Vec::new();

            for (joint_index, last_position, last_orientation) in &mut state.last {
                let joint = &skeleton.joints[*joint_index];
                let pose = guard.pose(state.armature, joint.bone);
                let parent_pose = usize::try_from(joint.parent)
                    .ok()
                    .map(|parent| guard.pose(state.armature, skeleton.joints[parent].bone));

                let (position, orientation) = local_pose(parent_pose, pose);
                let (position, orientation) = pool.intern_pose(position, orientation);

                if position != *last_position || orientation != *last_orientation {
                    *last_position = position;
                    *last_orientation = orientation;
                    keys.push(JointKey {
                        joint: *joint_index,
                        position,
                        orientation,
                    });
                }
            }

            if keys.is_empty() {
                continue;
            }

            let first = *state.first_changed.get_or_insert(frame);
            state.last_changed = Some(frame);
            state.frames.push(AnimationFrame {
                frame,
                timestamp_ms: (frame - first) as f32 * ms_per_frame,
                keys,
            });
        }
    }

    states
        .into_iter()
        .map(|state| {
            let length_ms = match (state.first_changed, state.last_changed) {
                (Some(first), Some(last)) => (last - first + 1) as f32 * ms_per_frame,
                _ => 0.0,
            };
            tracing::debug!(
                "Armature {}: {} keyframes, {} ms",
                state.armature,
                state.frames.len(),
                length_ms
            );
            AnimationTrack {
                armature: state.armature,
                frames: state.frames,
                length_ms,
            }
        })
        .collect()
}

/// Fill every joint's frame list from the sampled tracks.
///
/// A joint gets one matrix per keyframe of its armature's track: its new
/// local pose where it changed, identity elsewhere.
pub fn attach_tracks(skeleton: &mut Skeleton, tracks: &[AnimationTrack], pool: &ValuePool) {
    for joint in &mut skeleton.joints {
        joint.frames.clear();
    }

    for track in tracks {
        let joints: Vec<usize> = skeleton
            .armature_joints(track.armature)
            .map(|(index, _)| index)
            .collect();

        for frame in &track.frames {
            for &joint_index in &joints {
                let matrix = frame
                    .keys
                    .iter()
                    .find(|key| key.joint == joint_index)
                    .map(|key| pose_matrix(pool, key.position, key.orientation))
                    .unwrap_or(Mat4::IDENTITY);
                skeleton.joints[joint_index].frames.push(matrix);
            }
        }
    }
}
