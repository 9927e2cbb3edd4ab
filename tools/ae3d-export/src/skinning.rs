//! Skin-weight normalization
//!
//! Vertex group memberships become at most four joint influences per vertex.
//! When a vertex has more, the heaviest four are kept (ties go to the lower
//! joint index). Kept weights that don't sum to one are rescaled and rounded
//! to two decimals.

use ae3d_common::MAX_INFLUENCES;
use hashbrown::HashSet;

use crate::mesh::{SkinInfluence, SkinWeights};
use crate::pool::round_decimals;
use crate::scene::HostMesh;
use crate::skeleton::Skeleton;

/// Weight sums within this distance of 1.0 are left alone
const WEIGHT_SUM_TOLERANCE: f32 = 1e-6;

/// Decimal places kept after rescaling
const WEIGHT_DECIMALS: i32 = 2;

/// Influence set for a vertex with no usable memberships
const DEFAULT_WEIGHTS: SkinWeights = [
    SkinInfluence {
        joint: 0,
        weight: 1.0,
    },
    SkinInfluence::NONE,
    SkinInfluence::NONE,
    SkinInfluence::NONE,
];

/// Keep the top influences and rescale them to sum to one.
///
/// Returns the padded influence set and whether any influences were dropped.
pub fn normalize_influences(mut influences: Vec<SkinInfluence>) -> (SkinWeights, bool) {
    influences.retain(|i| i.weight > 0.0);
    if influences.is_empty() {
        return (DEFAULT_WEIGHTS, false);
    }

    influences.sort_by(|a, b| b.weight.total_cmp(&a.weight).then(a.joint.cmp(&b.joint)));
    let overflowed = influences.len() > MAX_INFLUENCES;
    influences.truncate(MAX_INFLUENCES);

    let sum: f32 = influences.iter().map(|i| i.weight).sum();
    if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        for influence in &mut influences {
            influence.weight = round_decimals(influence.weight / sum, WEIGHT_DECIMALS);
        }
    }

    let mut weights = [SkinInfluence::NONE; MAX_INFLUENCES];
    weights[..influences.len()].copy_from_slice(&influences);
    (weights, overflowed)
}

/// Per-vertex influences for an extracted mesh.
///
/// `sources` maps each output vertex to the host vertex whose groups it
/// takes. Returns `None` when no vertex maps to any joint (the mesh is then
/// written unskinned).
pub fn build_skin(mesh: &HostMesh, sources: &[u32], skeleton: &Skeleton) -> Option<Vec<SkinWeights>> {
    if skeleton.is_empty() {
        return None;
    }

    let mut unknown: HashSet<&str> = HashSet::new();
    let mut any_mapped = false;
    let mut overflow_count = 0usize;

    let skin: Vec<SkinWeights> = sources
        .iter()
        .map(|&source| {
            let influences: Vec<SkinInfluence> = mesh
                .groups_of(source)
                .iter()
                .filter_map(|group| match skeleton.joint_by_name(&group.bone) {
                    Some(joint) => Some(SkinInfluence::new(joint as i32, group.weight)),
                    None => {
                        unknown.insert(group.bone.as_str());
                        None
                    }
                })
                .collect();

            any_mapped |= influences.iter().any(|i| i.weight > 0.0);
            let (weights, overflowed) = normalize_influences(influences);
            if overflowed {
                overflow_count += 1;
            }
            weights
        })
        .collect();

    for name in &unknown {
        tracing::debug!(
            "Mesh '{}': vertex group '{}' has no matching bone, ignored",
            mesh.name,
            name
        );
    }

    if overflow_count > 0 {
        tracing::debug!(
            "Mesh '{}': {} vertices had more than {} influences, kept the heaviest",
            mesh.name,
            overflow_count,
            MAX_INFLUENCES
        );
    }

    any_mapped.then_some(skin)
}
