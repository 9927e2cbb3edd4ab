//! AE3D binary writer
//!
//! Re-exports the wire definitions from ae3d-common and serializes a built
//! [`Model`]. Everything is validated before the first byte is produced, so a
//! failed export never leaves a partial stream behind.

pub use ae3d_common::formats::*;
pub use ae3d_common::packing::*;

use glam::Mat4;
use std::io::Write;

use crate::error::{ExportError, Result};
use crate::export::Model;
use crate::mesh::{Mesh, SkinInfluence, Vertex};
use crate::skeleton::Joint;

/// Check every count, name length and vertex format against its field
pub fn validate_model(model: &Model) -> Result<()> {
    if model.meshes.len() > MAX_COUNT_U16 {
        return Err(ExportError::MeshCapacityExceeded(model.meshes.len()));
    }

    for mesh in &model.meshes {
        if mesh.vertices.len() > MAX_COUNT_U16 {
            return Err(ExportError::VertexCapacityExceeded {
                mesh: mesh.name.clone(),
                count: mesh.vertices.len(),
            });
        }
        if mesh.triangles.len() > MAX_COUNT_U16 {
            return Err(ExportError::FaceCapacityExceeded {
                mesh: mesh.name.clone(),
                count: mesh.triangles.len(),
            });
        }
        if mesh.name.len() > MAX_COUNT_U16 {
            return Err(ExportError::NameTooLong {
                len: mesh.name.len(),
                max: MAX_COUNT_U16,
            });
        }
        if legacy_format_byte(mesh.format).is_none() {
            return Err(ExportError::UnsupportedVertexFormat(mesh.format));
        }
    }

    if model.meshes.iter().any(|m| m.format & FORMAT_SKINNED != 0) {
        if model.skeleton.len() > MAX_COUNT_U16 {
            return Err(ExportError::JointCapacityExceeded(model.skeleton.len()));
        }
        for joint in &model.skeleton.joints {
            if joint.name.len() > i32::MAX as usize {
                return Err(ExportError::NameTooLong {
                    len: joint.name.len(),
                    max: i32::MAX as usize,
                });
            }
        }
    }

    Ok(())
}

/// Write a complete AE3D model file
pub fn write_ae3d_model<W: Write>(w: &mut W, model: &Model) -> Result<()> {
    validate_model(model)?;

    let (aabb_min, aabb_max) = model.aabb.to_wire();
    let header = Ae3dModelHeader::new(aabb_min, aabb_max, model.meshes.len() as u16);
    w.write_all(&header.to_bytes())?;

    for mesh in &model.meshes {
        write_mesh(w, mesh, &model.skeleton.joints)?;
    }

    w.write_all(&AE3D_TERMINATOR.to_le_bytes())?;
    Ok(())
}

/// Encode a model into memory
pub fn encode_model(model: &Model) -> Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(encoded_size_hint(model));
    write_ae3d_model(&mut bytes, model)?;
    Ok(bytes)
}

fn encoded_size_hint(model: &Model) -> usize {
    let joints_size: usize = model
        .skeleton
        .joints
        .iter()
        .map(|j| JOINT_MATRIX_SIZE * (1 + j.frames.len()) + 16 + j.name.len())
        .sum();

    Ae3dModelHeader::SIZE
        + 1
        + model
            .meshes
            .iter()
            .map(|m| {
                let stride = vertex_stride(m.format) as usize;
                let skin = if m.format & FORMAT_SKINNED != 0 {
                    2 + joints_size
                } else {
                    0
                };
                31 + m.name.len()
                    + m.vertices.len() * stride
                    + m.triangles.len() * TRIANGLE_SIZE
                    + skin
            })
            .sum::<usize>()
}

fn write_mesh<W: Write>(w: &mut W, mesh: &Mesh, joints: &[Joint]) -> Result<()> {
    let format_byte =
        legacy_format_byte(mesh.format).ok_or(ExportError::UnsupportedVertexFormat(mesh.format))?;

    let (aabb_min, aabb_max) = mesh.aabb.to_wire();
    write_f32s(w, &aabb_min)?;
    write_f32s(w, &aabb_max)?;

    w.write_all(&(mesh.name.len() as u16).to_le_bytes())?;
    w.write_all(mesh.name.as_bytes())?;

    w.write_all(&(mesh.vertices.len() as u16).to_le_bytes())?;
    w.write_all(&format_byte.to_le_bytes())?;

    let skinned = mesh.format & FORMAT_SKINNED != 0;
    for (i, vertex) in mesh.vertices.iter().enumerate() {
        write_vertex(w, vertex, mesh.format)?;
        if skinned {
            let influences = mesh
                .skin
                .as_ref()
                .and_then(|skin| skin.get(i))
                .copied()
                .unwrap_or([SkinInfluence::NONE; MAX_INFLUENCES]);
            for influence in &influences {
                w.write_all(&influence.weight.to_le_bytes())?;
            }
            for influence in &influences {
                w.write_all(&influence.joint.to_le_bytes())?;
            }
        }
    }

    w.write_all(&(mesh.triangles.len() as u16).to_le_bytes())?;
    for tri in &mesh.triangles {
        for &index in tri {
            w.write_all(&(index as u16).to_le_bytes())?;
        }
    }

    if skinned {
        w.write_all(&(joints.len() as u16).to_le_bytes())?;
        for joint in joints {
            write_joint(w, joint)?;
        }
    }

    Ok(())
}

/// Position, uv, normal, then tangent and color when the format has them
fn write_vertex<W: Write>(w: &mut W, vertex: &Vertex, format: u8) -> Result<()> {
    write_f32s(w, &vertex.position.to_array())?;
    write_f32s(w, &vertex.uv)?;
    write_f32s(w, &vertex.normal.to_array())?;
    if format & FORMAT_TANGENT != 0 {
        write_f32s(w, &vertex.tangent)?;
    }
    if format & FORMAT_COLOR != 0 {
        write_f32s(w, &vertex.color)?;
    }
    Ok(())
}

fn write_joint<W: Write>(w: &mut W, joint: &Joint) -> Result<()> {
    write_matrix(w, &joint.inverse_bind)?;
    w.write_all(&joint.parent.to_le_bytes())?;
    w.write_all(&(joint.name.len() as i32).to_le_bytes())?;
    w.write_all(joint.name.as_bytes())?;
    // Track byte length, unused by readers
    w.write_all(&0i32.to_le_bytes())?;
    w.write_all(&(joint.frames.len() as i32).to_le_bytes())?;
    for frame in &joint.frames {
        write_matrix(w, frame)?;
    }
    Ok(())
}

/// 16 floats, row-major
fn write_matrix<W: Write>(w: &mut W, m: &Mat4) -> Result<()> {
    write_f32s(w, &m.transpose().to_cols_array())
}

fn write_f32s<W: Write>(w: &mut W, values: &[f32]) -> Result<()> {
    for v in values {
        w.write_all(&v.to_le_bytes())?;
    }
    Ok(())
}
