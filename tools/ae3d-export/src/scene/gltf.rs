//! glTF/GLB scene provider
//!
//! Every node with a mesh becomes a mesh object, every skin becomes an
//! armature, and one animation clip drives the playhead.

use super::{
    average_vertex_normals, polygon_normal, FaceCorner, HostArmature, HostBone, HostFace,
    HostMesh, SceneProvider, VertexGroupWeight,
};
use anyhow::{bail, Context, Result};
use glam::{Mat4, Quat, Vec3};
use gltf::animation::util::ReadOutputs;
use gltf::animation::Interpolation;
use std::path::Path;

/// Local node transform decomposed for animation
#[derive(Debug, Clone, Copy)]
struct NodeTrs {
    translation: Vec3,
    rotation: Quat,
    scale: Vec3,
}

impl NodeTrs {
    fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

#[derive(Debug, Clone)]
enum ChannelValues {
    Translation(Vec<Vec3>),
    Rotation(Vec<Quat>),
    Scale(Vec<Vec3>),
}

/// One animated property of one node
#[derive(Debug, Clone)]
struct Channel {
    node: usize,
    times: Vec<f32>,
    values: ChannelValues,
    step: bool,
}

/// Scene read from a glTF or GLB file
#[derive(Debug, Clone)]
pub struct GltfScene {
    meshes: Vec<HostMesh>,
    armatures: Vec<HostArmature>,
    /// Node index of every bone, per armature
    joint_nodes: Vec<Vec<usize>>,
    parents: Vec<Option<usize>>,
    rest: Vec<NodeTrs>,
    animation_names: Vec<String>,
    channels: Vec<Channel>,
    duration: f32,
    frame_rate: f32,
    current_frame: i32,
    /// World transform of every node at the current frame
    posed_world: Vec<Mat4>,
}

impl GltfScene {
    /// Load a glTF/GLB file.
    ///
    /// # Arguments
    /// * `input` - Path to the glTF/GLB file
    /// * `clip` - Optional animation name to select (uses first animation if None)
    /// * `frame_rate` - Frames per second used to map the playhead to clip time
    pub fn open(input: &Path, clip: Option<&str>, frame_rate: f32) -> Result<Self> {
        let (document, buffers, _images) =
            gltf::import(input).with_context(|| format!("Failed to load glTF: {:?}", input))?;

        if frame_rate <= 0.0 {
            bail!("Frame rate must be positive, got {}", frame_rate);
        }

        let node_count = document.nodes().count();
        let mut parents = vec![None; node_count];
        for node in document.nodes() {
            for child in node.children() {
                parents[child.index()] = Some(node.index());
            }
        }

        let rest: Vec<NodeTrs> = document
            .nodes()
            .map(|node| {
                let (t, r, s) = node.transform().decomposed();
                NodeTrs {
                    translation: Vec3::from(t),
                    rotation: Quat::from_array(r),
                    scale: Vec3::from(s),
                }
            })
            .collect();
        let rest_world = world_transforms(&parents, &rest);

        let mut meshes = Vec::new();
        for node in document.nodes() {
            let Some(mesh) = node.mesh() else {
                continue;
            };
            let name = node
                .name()
                .or(mesh.name())
                .map(String::from)
                .unwrap_or_else(|| format!("mesh_{}", node.index()));
            let joint_names: Option<Vec<String>> = node
                .skin()
                .map(|skin| skin.joints().map(|j| joint_name(&j)).collect());

            let mut host = read_mesh(&mesh, &buffers, joint_names.as_deref(), &name)?;
            host.name = name;
            // Skinned meshes are placed by their joints, not by the node transform
            host.world = if joint_names.is_some() {
                Mat4::IDENTITY
            } else {
                rest_world[node.index()]
            };
            meshes.push(host);
        }

        let mut armatures = Vec::new();
        let mut joint_nodes = Vec::new();
        for skin in document.skins() {
            let joints: Vec<gltf::Node> = skin.joints().collect();
            let nodes: Vec<usize> = joints.iter().map(|j| j.index()).collect();

            let inverse_binds: Option<Vec<Mat4>> = skin
                .reader(|buffer| Some(&buffers[buffer.index()]))
                .read_inverse_bind_matrices()
                .map(|iter| iter.map(|m| Mat4::from_cols_array_2d(&m)).collect());

            // Skins may list joints in any order; bones go out parents first
            let skin_parents: Vec<Option<usize>> = nodes
                .iter()
                .map(|&node| joint_parent(node, &parents, &nodes))
                .collect();
            let order = parent_first_order(&skin_parents);
            let mut position_of = vec![0; order.len()];
            for (position, &skin_index) in order.iter().enumerate() {
                position_of[skin_index] = position;
            }

            let bones = order
                .iter()
                .map(|&i| {
                    let joint = &joints[i];
                    let bind = match inverse_binds.as_ref().and_then(|ibm| ibm.get(i)) {
                        Some(ibm) => ibm.inverse(),
                        None => rest_world[joint.index()],
                    };
                    HostBone {
                        name: joint_name(joint),
                        parent: skin_parents[i].map(|parent| position_of[parent]),
                        bind,
                    }
                })
                .collect();
            let nodes: Vec<usize> = order.iter().map(|&i| nodes[i]).collect();

            armatures.push(HostArmature {
                name: skin
                    .name()
                    .map(String::from)
                    .unwrap_or_else(|| format!("skin_{}", skin.index())),
                world: Mat4::IDENTITY,
                bones,
            });
            joint_nodes.push(nodes);
        }

        let animation_names: Vec<String> = document
            .animations()
            .map(|a| {
                a.name()
                    .map(String::from)
                    .unwrap_or_else(|| format!("animation_{}", a.index()))
            })
            .collect();

        // Find animation by name or use first
        let animation = match clip {
            Some(name) => Some(
                document
                    .animations()
                    .find(|a| a.name() == Some(name))
                    .with_context(|| {
                        format!(
                            "Animation '{}' not found in glTF. Available animations: {:?}",
                            name, animation_names
                        )
                    })?,
            ),
            None => document.animations().next(),
        };

        let channels = match &animation {
            Some(animation) => read_channels(animation, &buffers)?,
            None => Vec::new(),
        };
        let duration = channels
            .iter()
            .filter_map(|c| c.times.last().copied())
            .fold(0.0f32, f32::max);

        let mut scene = Self {
            meshes,
            armatures,
            joint_nodes,
            parents,
            rest,
            animation_names,
            channels,
            duration,
            frame_rate,
            current_frame: 0,
            posed_world: rest_world,
        };
        scene.update_pose();
        Ok(scene)
    }

    /// Names of all animation clips in the file
    pub fn animation_names(&self) -> &[String] {
        &self.animation_names
    }

    /// Duration of the selected clip in seconds
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Recompute node world transforms for the current frame
    fn update_pose(&mut self) {
        let t = self.current_frame as f32 / self.frame_rate;
        let mut locals = self.rest.clone();

        for channel in &self.channels {
            let Some(local) = locals.get_mut(channel.node) else {
                continue;
            };
            match &channel.values {
                ChannelValues::Translation(values) => {
                    if let Some(v) = sample(&channel.times, values, t, channel.step, Vec3::lerp) {
                        local.translation = v;
                    }
                }
                ChannelValues::Rotation(values) => {
                    if let Some(q) = sample(&channel.times, values, t, channel.step, Quat::slerp) {
                        local.rotation = q.normalize();
                    }
                }
                ChannelValues::Scale(values) => {
                    if let Some(v) = sample(&channel.times, values, t, channel.step, Vec3::lerp) {
                        local.scale = v;
                    }
                }
            }
        }

        self.posed_world = world_transforms(&self.parents, &locals);
    }
}

fn joint_name(joint: &gltf::Node) -> String {
    joint
        .name()
        .map(String::from)
        .unwrap_or_else(|| format!("joint_{}", joint.index()))
}

/// Nearest ancestor of `node` that is a joint of the same skin
fn joint_parent(node: usize, parents: &[Option<usize>], joints: &[usize]) -> Option<usize> {
    let mut cursor = parents[node];
    while let Some(ancestor) = cursor {
        if let Some(position) = joints.iter().position(|&j| j == ancestor) {
            return Some(position);
        }
        cursor = parents[ancestor];
    }
    None
}

/// Depth-first order over a joint forest, roots and siblings in listed order
fn parent_first_order(parents: &[Option<usize>]) -> Vec<usize> {
    let mut children = vec![Vec::new(); parents.len()];
    let mut stack = Vec::new();
    for (i, parent) in parents.iter().enumerate() {
        match parent {
            Some(p) => children[*p].push(i),
            None => stack.push(i),
        }
    }
    stack.reverse();

    let mut order = Vec::with_capacity(parents.len());
    while let Some(i) = stack.pop() {
        order.push(i);
        stack.extend(children[i].iter().rev());
    }
    order
}

/// Compose local transforms up the node hierarchy
fn world_transforms(parents: &[Option<usize>], locals: &[NodeTrs]) -> Vec<Mat4> {
    (0..locals.len())
        .map(|node| {
            let mut world = locals[node].matrix();
            let mut cursor = parents[node];
            while let Some(parent) = cursor {
                world = locals[parent].matrix() * world;
                cursor = parents[parent];
            }
            world
        })
        .collect()
}

/// Read every triangle primitive of a mesh into one host mesh
fn read_mesh(
    mesh: &gltf::Mesh,
    buffers: &[gltf::buffer::Data],
    joint_names: Option<&[String]>,
    name: &str,
) -> Result<HostMesh> {
    let mut host = HostMesh::default();

    for primitive in mesh.primitives() {
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            tracing::warn!(
                "Mesh '{}': skipping primitive {} with mode {:?} (only triangles are exported)",
                name,
                primitive.index(),
                primitive.mode()
            );
            continue;
        }

        let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

        // Positions (required)
        let positions: Vec<Vec3> = reader
            .read_positions()
            .with_context(|| format!("Mesh '{}' primitive has no positions", name))?
            .map(Vec3::from)
            .collect();
        let count = positions.len();

        let normals: Option<Vec<Vec3>> = reader
            .read_normals()
            .map(|iter| iter.map(Vec3::from).collect())
            .filter(|n: &Vec<Vec3>| n.len() == count);
        let tangents: Option<Vec<[f32; 4]>> = reader
            .read_tangents()
            .map(|iter| iter.collect())
            .filter(|t: &Vec<[f32; 4]>| t.len() == count);
        let uvs: Option<Vec<[f32; 2]>> = reader
            .read_tex_coords(0)
            .map(|iter| iter.into_f32().collect());
        let colors: Option<Vec<[f32; 4]>> = reader
            .read_colors(0)
            .map(|iter| iter.into_rgba_f32().collect());
        let joints: Option<Vec<[u16; 4]>> =
            reader.read_joints(0).map(|iter| iter.into_u16().collect());
        let weights: Option<Vec<[f32; 4]>> =
            reader.read_weights(0).map(|iter| iter.into_f32().collect());

        let indices: Vec<u32> = match reader.read_indices() {
            Some(iter) => iter.into_u32().collect(),
            None => (0..count as u32).collect(),
        };
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= count) {
            bail!(
                "Mesh '{}' index {} is out of range for {} vertices",
                name,
                bad,
                count
            );
        }

        let mut faces = Vec::with_capacity(indices.len() / 3);
        for tri in indices.chunks_exact(3) {
            let corners = tri
                .iter()
                .map(|&i| {
                    let i = i as usize;
                    FaceCorner {
                        vertex: i as u32,
                        uv: uvs.as_ref().and_then(|u| u.get(i).copied()),
                        color: colors.as_ref().and_then(|c| c.get(i).copied()),
                        normal: None,
                        tangent: tangents.as_ref().map(|t| t[i]),
                    }
                })
                .collect();
            faces.push(HostFace {
                normal: polygon_normal(&positions, tri),
                corners,
                smooth: normals.is_some(),
            });
        }

        let normals = normals.unwrap_or_else(|| average_vertex_normals(&positions, &faces));

        let groups: Vec<Vec<VertexGroupWeight>> = match (joint_names, &joints, &weights) {
            (Some(names), Some(j), Some(w)) if j.len() == count && w.len() == count => j
                .iter()
                .zip(w)
                .map(|(joint_set, weight_set)| {
                    joint_set
                        .iter()
                        .zip(weight_set)
                        .filter(|(_, &weight)| weight > 0.0)
                        .filter_map(|(&joint, &weight)| {
                            names
                                .get(joint as usize)
                                .map(|bone| VertexGroupWeight::new(bone.clone(), weight))
                        })
                        .collect()
                })
                .collect(),
            (Some(_), Some(_), None) | (Some(_), None, Some(_)) => {
                tracing::warn!(
                    "Mesh '{}' has partial skinning data (joints or weights missing), ignoring skinning",
                    name
                );
                vec![Vec::new(); count]
            }
            _ => vec![Vec::new(); count],
        };

        // Append with vertex numbering offset by what's already there
        let base = host.positions.len() as u32;
        host.positions.extend(positions);
        host.normals.extend(normals);
        host.groups.extend(groups);
        host.faces.extend(faces.into_iter().map(|mut face| {
            for corner in &mut face.corners {
                corner.vertex += base;
            }
            face
        }));
    }

    Ok(host)
}

/// Read the T/R/S channels of an animation clip
fn read_channels(
    animation: &gltf::Animation,
    buffers: &[gltf::buffer::Data],
) -> Result<Vec<Channel>> {
    let mut channels = Vec::new();

    for channel in animation.channels() {
        let node = channel.target().node().index();
        let interpolation = channel.sampler().interpolation();
        let reader = channel.reader(|buffer| Some(&buffers[buffer.index()]));

        let times: Vec<f32> = reader
            .read_inputs()
            .context("Animation channel has no input times")?
            .collect();
        let Some(outputs) = reader.read_outputs() else {
            bail!("Animation channel for node {} has no output values", node);
        };

        let values = match outputs {
            ReadOutputs::Translations(iter) => {
                ChannelValues::Translation(keyframe_values(iter.map(Vec3::from), interpolation))
            }
            ReadOutputs::Rotations(iter) => ChannelValues::Rotation(keyframe_values(
                iter.into_f32().map(Quat::from_array),
                interpolation,
            )),
            ReadOutputs::Scales(iter) => {
                ChannelValues::Scale(keyframe_values(iter.map(Vec3::from), interpolation))
            }
            ReadOutputs::MorphTargetWeights(_) => continue, // Ignore morph targets
        };

        channels.push(Channel {
            node,
            times,
            values,
            step: interpolation == Interpolation::Step,
        });
    }

    Ok(channels)
}

/// Keyframe values; cubic-spline tangents are dropped and the segment treated as linear
fn keyframe_values<T>(iter: impl Iterator<Item = T>, interpolation: Interpolation) -> Vec<T> {
    if interpolation == Interpolation::CubicSpline {
        // (in-tangent, value, out-tangent) triplets
        iter.skip(1).step_by(3).collect()
    } else {
        iter.collect()
    }
}

/// Sample a keyframe track at time `t`
fn sample<T: Copy>(
    times: &[f32],
    values: &[T],
    t: f32,
    step: bool,
    lerp: impl Fn(T, T, f32) -> T,
) -> Option<T> {
    if times.is_empty() || values.is_empty() {
        return None;
    }
    let last = times.len().min(values.len()) - 1;

    // Find keyframes
    let mut i = 0;
    while i < last && times[i + 1] <= t {
        i += 1;
    }

    if i >= last || t <= times[0] || step {
        return Some(values[i]);
    }

    let t0 = times[i];
    let t1 = times[i + 1];
    let factor = if t1 > t0 { (t - t0) / (t1 - t0) } else { 0.0 };
    Some(lerp(values[i], values[i + 1], factor.clamp(0.0, 1.0)))
}

impl SceneProvider for GltfScene {
    fn meshes(&self) -> Vec<HostMesh> {
        self.meshes.clone()
    }

    fn armatures(&self) -> Vec<HostArmature> {
        self.armatures.clone()
    }

    fn pose(&self, armature: usize, bone: usize) -> Mat4 {
        self.joint_nodes
            .get(armature)
            .and_then(|nodes| nodes.get(bone))
            .map(|&node| self.posed_world[node])
            .unwrap_or(Mat4::IDENTITY)
    }

    fn current_frame(&self) -> i32 {
        self.current_frame
    }

    fn set_frame(&mut self, frame: i32) {
        if frame != self.current_frame {
            self.current_frame = frame;
            self.update_pose();
        }
    }

    fn frame_range(&self) -> Option<(i32, i32)> {
        if self.channels.is_empty() {
            return None;
        }
        Some((0, (self.duration * self.frame_rate).ceil() as i32))
    }

    fn frame_rate(&self) -> Option<f32> {
        Some(self.frame_rate)
    }
}
