//! OBJ scene provider

use super::{
    average_vertex_normals, polygon_normal, FaceCorner, HostArmature, HostFace, HostMesh,
    SceneProvider,
};
use anyhow::{Context, Result};
use glam::{Mat4, Vec3};
use hashbrown::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Parsed face vertex reference: (position, uv, normal), all 0-based
type ObjCorner = (usize, Option<usize>, Option<usize>);

/// Static scene read from a Wavefront OBJ file.
///
/// Each `o`/`g` statement starts a new mesh object. `s` toggles smooth
/// shading for the faces that follow. Triangles and quads are kept as-is;
/// larger polygons are fan-split into triangles.
#[derive(Debug, Clone)]
pub struct ObjScene {
    meshes: Vec<HostMesh>,
    current_frame: i32,
}

#[derive(Default)]
struct ObjObject {
    name: String,
    faces: Vec<(Vec<ObjCorner>, bool)>,
}

impl ObjScene {
    /// Load an OBJ file
    pub fn load(input: &Path) -> Result<Self> {
        let file = File::open(input).with_context(|| format!("Failed to open OBJ: {:?}", input))?;
        let default_name = input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unnamed");
        Self::parse(BufReader::new(file), default_name)
    }

    /// Parse OBJ text; objects without an `o`/`g` name use `default_name`
    pub fn parse<R: BufRead>(reader: R, default_name: &str) -> Result<Self> {
        let mut positions: Vec<Vec3> = Vec::new();
        let mut colors: Vec<Option<[f32; 4]>> = Vec::new();
        let mut tex_coords: Vec<[f32; 2]> = Vec::new();
        let mut normals_raw: Vec<Vec3> = Vec::new();

        let mut objects: Vec<ObjObject> = Vec::new();
        let mut current = ObjObject {
            name: default_name.to_string(),
            faces: Vec::new(),
        };
        let mut smooth = false;

        for (line_no, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("Failed to read OBJ line {}", line_no + 1))?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.is_empty() {
                continue;
            }

            match parts[0] {
                "v" if parts.len() >= 4 => {
                    let x: f32 = parts[1].parse().unwrap_or(0.0);
                    let y: f32 = parts[2].parse().unwrap_or(0.0);
                    let z: f32 = parts[3].parse().unwrap_or(0.0);
                    positions.push(Vec3::new(x, y, z));

                    // Common extension: "v x y z r g b"
                    if parts.len() >= 7 {
                        let r: f32 = parts[4].parse().unwrap_or(1.0);
                        let g: f32 = parts[5].parse().unwrap_or(1.0);
                        let b: f32 = parts[6].parse().unwrap_or(1.0);
                        colors.push(Some([r, g, b, 1.0]));
                    } else {
                        colors.push(None);
                    }
                }
                "vt" if parts.len() >= 3 => {
                    let u: f32 = parts[1].parse().unwrap_or(0.0);
                    let v: f32 = parts[2].parse().unwrap_or(0.0);
                    tex_coords.push([u, v]);
                }
                "vn" if parts.len() >= 4 => {
                    let x: f32 = parts[1].parse().unwrap_or(0.0);
                    let y: f32 = parts[2].parse().unwrap_or(0.0);
                    let z: f32 = parts[3].parse().unwrap_or(0.0);
                    normals_raw.push(Vec3::new(x, y, z));
                }
                "o" | "g" => {
                    let name = parts[1..].join(" ");
                    if current.faces.is_empty() {
                        if !name.is_empty() {
                            current.name = name;
                        }
                    } else {
                        let next = ObjObject {
                            name: if name.is_empty() {
                                default_name.to_string()
                            } else {
                                name
                            },
                            faces: Vec::new(),
                        };
                        objects.push(std::mem::replace(&mut current, next));
                    }
                }
                "s" if parts.len() >= 2 => {
                    smooth = !matches!(parts[1], "off" | "0");
                }
                "f" if parts.len() >= 4 => {
                    let face_verts: Vec<ObjCorner> = parts[1..]
                        .iter()
                        .filter_map(|v| parse_obj_vertex(v))
                        .collect();

                    if face_verts.len() < 3 {
                        continue;
                    }

                    if face_verts.len() <= 4 {
                        current.faces.push((face_verts, smooth));
                    } else {
                        // Fan triangulation for convex polygons
                        for i in 1..face_verts.len() - 1 {
                            let tri = vec![face_verts[0], face_verts[i], face_verts[i + 1]];
                            current.faces.push((tri, smooth));
                        }
                    }
                }
                _ => {}
            }
        }

        if !current.faces.is_empty() {
            objects.push(current);
        }

        let meshes = objects
            .into_iter()
            .map(|object| build_host_mesh(object, &positions, &colors, &tex_coords, &normals_raw))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            meshes,
            current_frame: 0,
        })
    }
}

/// Convert one OBJ object into a host mesh with object-local vertex numbering
fn build_host_mesh(
    object: ObjObject,
    positions: &[Vec3],
    colors: &[Option<[f32; 4]>],
    tex_coords: &[[f32; 2]],
    normals_raw: &[Vec3],
) -> Result<HostMesh> {
    let mut local_of: HashMap<usize, u32> = HashMap::new();
    let mut local_positions: Vec<Vec3> = Vec::new();
    let mut faces = Vec::with_capacity(object.faces.len());

    for (face_verts, smooth) in &object.faces {
        let mut corners = Vec::with_capacity(face_verts.len());
        for &(vi, vti, vni) in face_verts {
            let position = *positions.get(vi).with_context(|| {
                format!(
                    "Face in object '{}' refers to missing vertex {}",
                    object.name,
                    vi + 1
                )
            })?;
            let local = *local_of.entry(vi).or_insert_with(|| {
                local_positions.push(position);
                (local_positions.len() - 1) as u32
            });

            corners.push(FaceCorner {
                vertex: local,
                uv: vti.map(|ti| tex_coords.get(ti).copied().unwrap_or([0.0; 2])),
                color: colors.get(vi).copied().flatten(),
                normal: vni.map(|ni| normals_raw.get(ni).copied().unwrap_or(Vec3::Y)),
                tangent: None,
            });
        }

        let indices: Vec<u32> = corners.iter().map(|c| c.vertex).collect();
        faces.push(HostFace {
            normal: polygon_normal(&local_positions, &indices),
            corners,
            smooth: *smooth,
        });
    }

    let normals = average_vertex_normals(&local_positions, &faces);

    Ok(HostMesh {
        name: object.name,
        world: Mat4::IDENTITY,
        positions: local_positions,
        normals,
        faces,
        auto_smooth: false,
        auto_smooth_angle: None,
        groups: Vec::new(),
    })
}

/// Parse OBJ vertex reference: "v", "v/vt", "v/vt/vn", or "v//vn"
fn parse_obj_vertex(s: &str) -> Option<ObjCorner> {
    let parts: Vec<&str> = s.split('/').collect();

    let vi = parts.first()?.parse::<usize>().ok()?.checked_sub(1)?; // OBJ indices are 1-based

    let vti = parts
        .get(1)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<usize>().ok())
        .and_then(|i| i.checked_sub(1));

    let vni = parts
        .get(2)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<usize>().ok())
        .and_then(|i| i.checked_sub(1));

    Some((vi, vti, vni))
}

impl SceneProvider for ObjScene {
    fn meshes(&self) -> Vec<HostMesh> {
        self.meshes.clone()
    }

    fn armatures(&self) -> Vec<HostArmature> {
        Vec::new()
    }

    fn pose(&self, _armature: usize, _bone: usize) -> Mat4 {
        Mat4::IDENTITY
    }

    fn current_frame(&self) -> i32 {
        self.current_frame
    }

    fn set_frame(&mut self, frame: i32) {
        self.current_frame = frame;
    }

    fn frame_range(&self) -> Option<(i32, i32)> {
        None
    }

    fn frame_rate(&self) -> Option<f32> {
        None
    }
}
