//! Minimal .ae3d reader used to check writer output
#![allow(dead_code)]

use ae3d_common::{
    format_from_legacy_byte, Ae3dModelHeader, BinarySerializable, AE3D_TERMINATOR, FORMAT_COLOR,
    FORMAT_SKINNED, FORMAT_TANGENT,
};

pub struct DecodedModel {
    pub aabb_min: [f32; 3],
    pub aabb_max: [f32; 3],
    pub meshes: Vec<DecodedMesh>,
}

pub struct DecodedMesh {
    pub aabb_min: [f32; 3],
    pub aabb_max: [f32; 3],
    pub name: String,
    pub format_byte: i8,
    pub vertices: Vec<DecodedVertex>,
    pub triangles: Vec<[u16; 3]>,
    pub joints: Vec<DecodedJoint>,
}

#[derive(Debug, Clone, Copy)]
pub struct DecodedVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
    pub normal: [f32; 3],
    pub tangent: Option<[f32; 4]>,
    pub color: Option<[f32; 4]>,
    pub weights: Option<[f32; 4]>,
    pub joints: Option<[i32; 4]>,
}

pub struct DecodedJoint {
    pub inverse_bind: [f32; 16],
    pub parent: i32,
    pub name: String,
    pub frames: Vec<[f32; 16]>,
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> &'a [u8] {
        let bytes: &'a [u8] = self.bytes;
        let slice = &bytes[self.pos..self.pos + n];
        self.pos += n;
        slice
    }

    fn i8(&mut self) -> i8 {
        self.take(1)[0] as i8
    }

    fn u16(&mut self) -> u16 {
        u16::from_le_bytes(self.take(2).try_into().unwrap())
    }

    fn i32(&mut self) -> i32 {
        i32::from_le_bytes(self.take(4).try_into().unwrap())
    }

    fn f32(&mut self) -> f32 {
        f32::from_le_bytes(self.take(4).try_into().unwrap())
    }

    fn f32s<const N: usize>(&mut self) -> [f32; N] {
        std::array::from_fn(|_| self.f32())
    }

    fn string(&mut self, len: usize) -> String {
        String::from_utf8(self.take(len).to_vec()).unwrap()
    }
}

/// Decode a whole file, panicking on any layout mismatch
pub fn decode(bytes: &[u8]) -> DecodedModel {
    let header = Ae3dModelHeader::deserialize(bytes).expect("bad header");
    let mut r = Reader {
        bytes,
        pos: <Ae3dModelHeader as BinarySerializable>::SIZE,
    };

    let meshes = (0..header.mesh_count).map(|_| decode_mesh(&mut r)).collect();

    assert_eq!(r.i8(), AE3D_TERMINATOR, "missing terminator");
    assert_eq!(r.pos, bytes.len(), "trailing bytes after terminator");

    DecodedModel {
        aabb_min: header.aabb_min,
        aabb_max: header.aabb_max,
        meshes,
    }
}

fn decode_mesh(r: &mut Reader) -> DecodedMesh {
    let aabb_min = r.f32s::<3>();
    let aabb_max = r.f32s::<3>();
    let name_len = r.u16() as usize;
    let name = r.string(name_len);
    let vertex_count = r.u16();
    let format_byte = r.i8();
    let format = format_from_legacy_byte(format_byte).expect("unknown format byte");

    let vertices = (0..vertex_count)
        .map(|_| {
            let position = r.f32s::<3>();
            let uv = r.f32s::<2>();
            let normal = r.f32s::<3>();
            let tangent = (format & FORMAT_TANGENT != 0).then(|| r.f32s::<4>());
            let color = (format & FORMAT_COLOR != 0).then(|| r.f32s::<4>());
            let (weights, joints) = if format & FORMAT_SKINNED != 0 {
                let weights = r.f32s::<4>();
                let joints = std::array::from_fn(|_| r.i32());
                (Some(weights), Some(joints))
            } else {
                (None, None)
            };
            DecodedVertex {
                position,
                uv,
                normal,
                tangent,
                color,
                weights,
                joints,
            }
        })
        .collect();

    let face_count = r.u16();
    let triangles = (0..face_count)
        .map(|_| [r.u16(), r.u16(), r.u16()])
        .collect();

    let joints = if format & FORMAT_SKINNED != 0 {
        let joint_count = r.u16();
        (0..joint_count)
            .map(|_| {
                let inverse_bind = r.f32s::<16>();
                let parent = r.i32();
                let name_len = r.i32() as usize;
                let name = r.string(name_len);
                assert_eq!(r.i32(), 0, "track byte length must be zero");
                let frame_count = r.i32();
                let frames = (0..frame_count).map(|_| r.f32s::<16>()).collect();
                DecodedJoint {
                    inverse_bind,
                    parent,
                    name,
                    frames,
                }
            })
            .collect()
    } else {
        Vec::new()
    };

    DecodedMesh {
        aabb_min,
        aabb_max,
        name,
        format_byte,
        vertices,
        triangles,
        joints,
    }
}

/// Whether a position lies inside a box (inclusive)
pub fn inside(p: [f32; 3], min: [f32; 3], max: [f32; 3]) -> bool {
    (0..3).all(|i| p[i] >= min[i] && p[i] <= max[i])
}
