//! Per-vertex tangent space from UV derivatives

use super::types::Vertex;
use glam::Vec3;

/// UV areas below this are treated as degenerate
const DEGENERATE_UV_AREA: f32 = 1e-4;

/// Orthogonalized tangents shorter than this use the fallback axis
const TANGENT_EPSILON: f32 = 1e-6;

/// Fill `tangent` of every vertex from the triangle UV layout.
///
/// Triangles with (near) zero UV area contribute the fixed basis
/// `t = +X, b = +Y`. Returns the number of such triangles; a warning is
/// logged once for the mesh when there are any.
pub fn compute_tangents(name: &str, vertices: &mut [Vertex], triangles: &[[u32; 3]]) -> usize {
    let mut tangents = vec![Vec3::ZERO; vertices.len()];
    let mut bitangents = vec![Vec3::ZERO; vertices.len()];
    let mut degenerate = 0;

    for tri in triangles {
        let [i0, i1, i2] = tri.map(|i| i as usize);
        let (v0, v1, v2) = (&vertices[i0], &vertices[i1], &vertices[i2]);

        let dp1 = v1.position - v0.position;
        let dp2 = v2.position - v0.position;
        let du1 = v1.uv[0] - v0.uv[0];
        let du2 = v2.uv[0] - v0.uv[0];
        let dv1 = v1.uv[1] - v0.uv[1];
        let dv2 = v2.uv[1] - v0.uv[1];

        let area = du1 * dv2 - dv1 * du2;
        let (t, b) = if area.abs() < DEGENERATE_UV_AREA {
            degenerate += 1;
            (Vec3::X, Vec3::Y)
        } else {
            (
                (dp1 * dv2 - dp2 * dv1) / area,
                (dp2 * du1 - dp1 * du2) / area,
            )
        };

        for i in [i0, i1, i2] {
            tangents[i] += t;
            bitangents[i] += b;
        }
    }

    if degenerate > 0 {
        tracing::warn!(
            "Mesh '{}': {} triangle(s) have degenerate UVs, using default tangent basis",
            name,
            degenerate
        );
    }

    for ((vertex, t), b) in vertices.iter_mut().zip(tangents).zip(bitangents) {
        let n = vertex.normal;
        let tangent = orthogonalize(n, t);
        let handedness = if n.cross(tangent).dot(b) >= 0.0 {
            1.0
        } else {
            -1.0
        };
        vertex.tangent = [tangent.x, tangent.y, tangent.z, handedness];
    }

    degenerate
}

/// Gram-Schmidt `t` against `n`, with a deterministic fallback when `t`
/// is parallel to `n` or zero
fn orthogonalize(n: Vec3, t: Vec3) -> Vec3 {
    let projected = t - n * n.dot(t);
    if projected.length() > TANGENT_EPSILON {
        return projected.normalize();
    }

    let x_axis = Vec3::X - n * n.dot(Vec3::X);
    if x_axis.length() > TANGENT_EPSILON {
        return x_axis.normalize();
    }

    if n.length() > TANGENT_EPSILON {
        n.normalize().any_orthonormal_vector()
    } else {
        Vec3::X
    }
}
