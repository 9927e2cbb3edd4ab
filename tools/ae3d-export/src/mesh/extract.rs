//! Host mesh -> world-space vertex buffer and triangle list
//!
//! Faces are triangulated with a fixed fan: triangles keep corners (0,1,2)
//! and quads add (0,2,3). Every triangle corner becomes its own vertex, so
//! triangle `f` uses vertices `3f`, `3f+1` and `3f+2`. With welding enabled,
//! corners that agree on every attribute share one vertex instead.

use super::types::{ExtractedMesh, Vertex, DEFAULT_COLOR};
use crate::config::GeometrySection;
use crate::scene::{FaceCorner, HostFace, HostMesh};
use glam::{Mat4, Quat, Vec3};
use hashbrown::HashMap;
use std::f32::consts::FRAC_PI_2;

/// Attribute grid for welding (values closer than this are the same)
const WELD_EPSILON: f32 = 1e-4;

/// Corner patterns used for each triangle of a face
const TRIANGLE_FAN: [[usize; 3]; 1] = [[0, 1, 2]];
const QUAD_FAN: [[usize; 3]; 2] = [[0, 1, 2], [0, 2, 3]];

/// Decomposed object-to-world transform
struct WorldTransform {
    scale: Vec3,
    rotation: Quat,
    translation: Vec3,
}

impl WorldTransform {
    fn new(world: Mat4, z_up_to_y_up: bool) -> Self {
        let world = if z_up_to_y_up {
            Mat4::from_rotation_x(-FRAC_PI_2) * world
        } else {
            world
        };
        let (scale, rotation, translation) = world.to_scale_rotation_translation();
        Self {
            scale,
            rotation,
            translation,
        }
    }

    fn point(&self, co: Vec3) -> Vec3 {
        self.translation + self.rotation * (co * self.scale)
    }

    fn normal(&self, n: Vec3) -> Vec3 {
        (self.rotation * n).normalize_or_zero()
    }
}

/// Hashable attribute fingerprint of a vertex, quantized to the weld grid
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct WeldKey {
    attributes: Vec<i64>,
    groups: Vec<(String, i64)>,
}

impl WeldKey {
    fn new(vertex: &Vertex, mesh: &HostMesh, source: u32) -> Self {
        let mut attributes = Vec::with_capacity(16);
        attributes.extend(vertex.position.to_array().map(quantize));
        attributes.extend(vertex.normal.to_array().map(quantize));
        attributes.extend(vertex.uv.map(quantize));
        attributes.extend(vertex.color.map(quantize));
        attributes.extend(vertex.tangent.map(quantize));

        let groups = mesh
            .groups_of(source)
            .iter()
            .map(|g| (g.bone.clone(), quantize(g.weight)))
            .collect();

        Self { attributes, groups }
    }
}

fn quantize(value: f32) -> i64 {
    (value as f64 / WELD_EPSILON as f64).round() as i64
}

/// Extract one host mesh.
///
/// Returns world-space vertices (tangents zeroed unless every corner carries
/// a host tangent), the triangle list, and the host vertex each output vertex
/// came from.
pub fn extract_mesh(mesh: &HostMesh, geometry: &GeometrySection) -> ExtractedMesh {
    let transform = WorldTransform::new(mesh.world, geometry.z_up_to_y_up);
    let has_host_tangents = !mesh.faces.is_empty()
        && mesh
            .faces
            .iter()
            .all(|f| f.corners.iter().all(|c| c.tangent.is_some()));

    let auto_smooth = mesh
        .auto_smooth
        .then(|| AutoSmooth::new(mesh, geometry.auto_smooth_angle));

    let mut vertices = Vec::new();
    let mut sources = Vec::new();
    let mut triangles = Vec::new();
    let mut welded: HashMap<WeldKey, u32> = HashMap::new();

    for (face_index, face) in mesh.faces.iter().enumerate() {
        let fan: &[[usize; 3]] = match face.corners.len() {
            3 => &TRIANGLE_FAN,
            4 => &QUAD_FAN,
            n => {
                tracing::warn!(
                    "Mesh '{}': skipping face {} with {} corners",
                    mesh.name,
                    face_index,
                    n
                );
                continue;
            }
        };

        if let Some(bad) = face
            .corners
            .iter()
            .find(|c| c.vertex as usize >= mesh.positions.len())
        {
            tracing::warn!(
                "Mesh '{}': skipping face {} with vertex index {} out of range for {} vertices",
                mesh.name,
                face_index,
                bad.vertex,
                mesh.positions.len()
            );
            continue;
        }

        for pattern in fan {
            let tri = pattern.map(|corner_index| {
                let corner = &face.corners[corner_index];
                let normal = select_normal(mesh, face_index, face, corner, auto_smooth.as_ref());
                let vertex = build_vertex(mesh, corner, normal, &transform, has_host_tangents);

                if geometry.weld_vertices {
                    let key = WeldKey::new(&vertex, mesh, corner.vertex);
                    *welded.entry(key).or_insert_with(|| {
                        vertices.push(vertex);
                        sources.push(corner.vertex);
                        (vertices.len() - 1) as u32
                    })
                } else {
                    vertices.push(vertex);
                    sources.push(corner.vertex);
                    (vertices.len() - 1) as u32
                }
            });
            triangles.push(tri);
        }
    }

    if geometry.weld_vertices {
        tracing::debug!(
            "Mesh '{}': welded {} corners into {} vertices",
            mesh.name,
            triangles.len() * 3,
            vertices.len()
        );
    }

    ExtractedMesh {
        name: mesh.name.clone(),
        vertices,
        triangles,
        sources,
        has_host_tangents,
    }
}

fn build_vertex(
    mesh: &HostMesh,
    corner: &FaceCorner,
    normal: Vec3,
    transform: &WorldTransform,
    has_host_tangents: bool,
) -> Vertex {
    // Corner indices are range-checked by the caller
    let co = mesh.positions[corner.vertex as usize];

    // Engine space has V pointing down
    let uv = corner.uv.map(|[u, v]| [u, 1.0 - v]).unwrap_or([0.0, 0.0]);

    let tangent = match corner.tangent {
        Some([x, y, z, w]) if has_host_tangents => {
            let t = transform.normal(Vec3::new(x, y, z));
            [t.x, t.y, t.z, if w < 0.0 { -1.0 } else { 1.0 }]
        }
        _ => [0.0; 4],
    };

    Vertex {
        position: transform.point(co),
        normal: transform.normal(normal),
        uv,
        tangent,
        color: corner.color.unwrap_or(DEFAULT_COLOR),
    }
}

/// Object-space normal for one face corner
fn select_normal(
    mesh: &HostMesh,
    face_index: usize,
    face: &HostFace,
    corner: &FaceCorner,
    auto_smooth: Option<&AutoSmooth>,
) -> Vec3 {
    if !face.smooth {
        return face.normal;
    }

    let smooth = corner.normal.unwrap_or_else(|| {
        mesh.normals
            .get(corner.vertex as usize)
            .copied()
            .unwrap_or(face.normal)
    });

    match auto_smooth {
        Some(auto) if !auto.shares_smooth_edge(mesh, face_index, corner.vertex) => face.normal,
        _ => smooth,
    }
}

/// Face adjacency for auto-smooth decisions
struct AutoSmooth {
    /// Faces touching each host vertex
    faces_of: Vec<Vec<usize>>,
    threshold_degrees: f32,
}

impl AutoSmooth {
    fn new(mesh: &HostMesh, default_angle: f32) -> Self {
        let mut faces_of = vec![Vec::new(); mesh.positions.len()];
        for (face_index, face) in mesh.faces.iter().enumerate() {
            for corner in &face.corners {
                if let Some(list) = faces_of.get_mut(corner.vertex as usize) {
                    list.push(face_index);
                }
            }
        }
        Self {
            faces_of,
            threshold_degrees: mesh.auto_smooth_angle.unwrap_or(default_angle),
        }
    }

    /// Whether some other face on `vertex` is within the smoothing angle
    fn shares_smooth_edge(&self, mesh: &HostMesh, face_index: usize, vertex: u32) -> bool {
        let normal = mesh.faces[face_index].normal;
        if normal.length_squared() == 0.0 {
            return false;
        }

        let Some(neighbors) = self.faces_of.get(vertex as usize) else {
            return false;
        };

        neighbors
            .iter()
            .filter(|&&other| other != face_index)
            .map(|&other| mesh.faces[other].normal)
            .filter(|other| other.length_squared() > 0.0)
            .any(|other| normal.angle_between(other).to_degrees().round() <= self.threshold_degrees)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::VertexGroupWeight;

    fn assert_near(actual: Vec3, expected: Vec3) {
        assert!(
            (actual - expected).length() < 1e-5,
            "expected {expected}, got {actual}"
        );
    }

    fn quad_mesh() -> HostMesh {
        HostMesh {
            name: "Quad".to_string(),
            world: Mat4::IDENTITY,
            positions: vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            normals: vec![Vec3::Z; 4],
            faces: vec![HostFace {
                corners: vec![
                    FaceCorner::new(0).with_uv([0.0, 0.0]),
                    FaceCorner::new(1).with_uv([1.0, 0.0]),
                    FaceCorner::new(2).with_uv([1.0, 1.0]),
                    FaceCorner::new(3).with_uv([0.0, 1.0]),
                ],
                normal: Vec3::Z,
                smooth: false,
            }],
            ..Default::default()
        }
    }

    /// Two faces meeting at a 90 degree edge along x = 0
    fn folded_mesh() -> HostMesh {
        let corners = |ids: [u32; 3]| ids.iter().map(|&i| FaceCorner::new(i)).collect();
        HostMesh {
            name: "Fold".to_string(),
            world: Mat4::IDENTITY,
            positions: vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 0.0, 1.0),
            ],
            normals: vec![Vec3::new(0.0, 0.0, 0.0), Vec3::ONE.normalize(), Vec3::Z, Vec3::X],
            faces: vec![
                HostFace {
                    corners: corners([0, 2, 1]),
                    normal: Vec3::NEG_Z,
                    smooth: true,
                },
                HostFace {
                    corners: corners([0, 1, 3]),
                    normal: Vec3::NEG_X,
                    smooth: true,
                },
            ],
            auto_smooth: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_quad_fan_pattern() {
        let extracted = extract_mesh(&quad_mesh(), &GeometrySection::default());
        assert_eq!(extracted.triangles, vec![[0, 1, 2], [3, 4, 5]]);
        assert_eq!(extracted.vertices.len(), 6);
        // Second triangle uses corners 0, 2, 3
        assert_eq!(extracted.sources, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn test_uv_flip_and_defaults() {
        let extracted = extract_mesh(&quad_mesh(), &GeometrySection::default());
        assert_eq!(extracted.vertices[0].uv, [0.0, 1.0]);
        assert_eq!(extracted.vertices[2].uv, [1.0, 0.0]);
        assert_eq!(extracted.vertices[0].color, DEFAULT_COLOR);
        assert_eq!(extracted.vertices[0].tangent, [0.0; 4]);
        assert!(!extracted.has_host_tangents);
    }

    #[test]
    fn test_missing_uv_layer_is_zero() {
        let mut mesh = quad_mesh();
        for corner in &mut mesh.faces[0].corners {
            corner.uv = None;
        }
        let extracted = extract_mesh(&mesh, &GeometrySection::default());
        assert!(extracted.vertices.iter().all(|v| v.uv == [0.0, 0.0]));
    }

    #[test]
    fn test_world_transform_applied() {
        let mut mesh = quad_mesh();
        mesh.world = Mat4::from_scale_rotation_translation(
            Vec3::splat(2.0),
            Quat::from_rotation_z(FRAC_PI_2),
            Vec3::new(10.0, 0.0, 0.0),
        );
        let extracted = extract_mesh(&mesh, &GeometrySection::default());

        // Corner 1 at (1,0,0): scaled to (2,0,0), rotated to (0,2,0), moved to (10,2,0)
        assert_near(extracted.vertices[1].position, Vec3::new(10.0, 2.0, 0.0));
        // Normal rotated only, still unit length
        assert_near(extracted.vertices[1].normal, Vec3::Z);
    }

    #[test]
    fn test_z_up_conversion() {
        let geometry = GeometrySection {
            z_up_to_y_up: true,
            ..Default::default()
        };
        let extracted = extract_mesh(&quad_mesh(), &geometry);
        // +Z face normal becomes +Y
        assert_near(extracted.vertices[0].normal, Vec3::Y);
        // (0,1,0) goes to (0,0,-1)
        assert_near(extracted.vertices[5].position, Vec3::NEG_Z);
    }

    #[test]
    fn test_flat_and_smooth_normals() {
        let mut mesh = quad_mesh();
        mesh.normals[1] = Vec3::new(1.0, 0.0, 1.0).normalize();

        let flat = extract_mesh(&mesh, &GeometrySection::default());
        assert_near(flat.vertices[1].normal, Vec3::Z);

        mesh.faces[0].smooth = true;
        let smooth = extract_mesh(&mesh, &GeometrySection::default());
        assert_near(smooth.vertices[1].normal, mesh.normals[1]);
    }

    #[test]
    fn test_auto_smooth_threshold() {
        let mesh = folded_mesh();

        // 90 degree fold is above the 30 degree default: flat normals
        let sharp = extract_mesh(&mesh, &GeometrySection::default());
        assert_near(sharp.vertices[2].normal, Vec3::NEG_Z);

        // Raising the threshold to 90 smooths the shared vertices
        let geometry = GeometrySection {
            auto_smooth_angle: 90.0,
            ..Default::default()
        };
        let smooth = extract_mesh(&mesh, &geometry);
        assert_near(smooth.vertices[2].normal, Vec3::ONE.normalize());
        // Vertex 2 belongs to one face only and keeps the flat normal
        assert_near(smooth.vertices[1].normal, Vec3::NEG_Z);
    }

    #[test]
    fn test_mesh_auto_smooth_angle_overrides_default() {
        let mut mesh = folded_mesh();
        mesh.auto_smooth_angle = Some(90.0);
        let extracted = extract_mesh(&mesh, &GeometrySection::default());
        assert_near(extracted.vertices[2].normal, Vec3::ONE.normalize());
    }

    #[test]
    fn test_weld_shares_identical_corners() {
        let geometry = GeometrySection {
            weld_vertices: true,
            ..Default::default()
        };
        let extracted = extract_mesh(&quad_mesh(), &geometry);
        assert_eq!(extracted.vertices.len(), 4);
        assert_eq!(extracted.triangles, vec![[0, 1, 2], [0, 2, 3]]);
    }

    #[test]
    fn test_weld_keeps_different_groups_apart() {
        let mut mesh = quad_mesh();
        // Vertex 4 duplicates vertex 0 but belongs to a bone group
        mesh.positions.push(Vec3::ZERO);
        mesh.normals.push(Vec3::Z);
        mesh.groups = vec![Vec::new(); 5];
        mesh.groups[4] = vec![VertexGroupWeight::new("Bone", 1.0)];
        mesh.faces = vec![
            HostFace {
                corners: vec![
                    FaceCorner::new(0).with_uv([0.0, 0.0]),
                    FaceCorner::new(1).with_uv([1.0, 0.0]),
                    FaceCorner::new(2).with_uv([1.0, 1.0]),
                ],
                normal: Vec3::Z,
                smooth: false,
            },
            HostFace {
                corners: vec![
                    FaceCorner::new(4).with_uv([0.0, 0.0]),
                    FaceCorner::new(2).with_uv([1.0, 1.0]),
                    FaceCorner::new(3).with_uv([0.0, 1.0]),
                ],
                normal: Vec3::Z,
                smooth: false,
            },
        ];

        let geometry = GeometrySection {
            weld_vertices: true,
            ..Default::default()
        };
        let extracted = extract_mesh(&mesh, &geometry);
        assert_eq!(extracted.vertices.len(), 5);
        assert_eq!(extracted.triangles, vec![[0, 1, 2], [3, 2, 4]]);
        assert_eq!(extracted.sources[3], 4);
    }

    #[test]
    fn test_host_tangents_pass_through() {
        let mut mesh = quad_mesh();
        for corner in &mut mesh.faces[0].corners {
            corner.tangent = Some([1.0, 0.0, 0.0, -1.0]);
        }
        let extracted = extract_mesh(&mesh, &GeometrySection::default());
        assert!(extracted.has_host_tangents);
        assert_eq!(extracted.vertices[0].tangent, [1.0, 0.0, 0.0, -1.0]);
    }

    #[test]
    fn test_out_of_range_corner_skips_face() {
        let mut mesh = quad_mesh();
        mesh.faces.push(HostFace {
            corners: vec![FaceCorner::new(0), FaceCorner::new(1), FaceCorner::new(9)],
            normal: Vec3::Z,
            smooth: false,
        });

        let extracted = extract_mesh(&mesh, &GeometrySection::default());
        assert_eq!(extracted.vertices.len(), 6);
        assert_eq!(extracted.triangles.len(), 2);
        assert!(extracted.sources.iter().all(|&s| s < 4));
    }
}
