//! AE3D model framing (.ae3d)
//!
//! # Layout
//! ```text
//! 0x00: magic [i8; 2] = 97, 57 ("a9")
//! 0x02: model aabb min [f32; 3]
//! 0x0E: model aabb max [f32; 3]
//! 0x1A: mesh_count u16
//! 0x1C: meshes...
//!
//! mesh:
//!   aabb min [f32; 3], aabb max [f32; 3]
//!   name_len u16, name bytes (UTF-8)
//!   vertex_count u16
//!   format i8 (0 = PTNTC, 1 = PTN, 2 = PTNTC + skin)
//!   vertices (vertex_count * stride)
//!   face_count u16
//!   faces (face_count * 3 * u16)
//!   if format == 2:
//!     joint_count u16
//!     joints:
//!       inverse bind [f32; 16] (row-major)
//!       parent i32 (-1 = root)
//!       name_len i32, name bytes
//!       track_bytes i32 (reserved, always 0)
//!       frame_count i32
//!       frames (frame_count * [f32; 16], row-major)
//!
//! terminator i8 = 100
//! ```
//!
//! Vertex attribute order is position, uv, normal, tangent, color, weights,
//! joint indices. See `ae3d_common::packing` for which attributes each format
//! byte carries.

/// Identification bytes at the start of every file
pub const AE3D_MAGIC: [i8; 2] = [97, 57];

/// Last byte of every file
pub const AE3D_TERMINATOR: i8 = 100;

/// Largest value any u16 count field can hold
pub const MAX_COUNT_U16: usize = u16::MAX as usize;

/// Size of one triangle record (3 × u16)
pub const TRIANGLE_SIZE: usize = 6;

/// Size of one serialized 4×4 matrix (16 × f32)
pub const JOINT_MATRIX_SIZE: usize = 64;

/// AE3D model header (28 bytes)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ae3dModelHeader {
    pub aabb_min: [f32; 3],
    pub aabb_max: [f32; 3],
    pub mesh_count: u16,
}

impl Ae3dModelHeader {
    pub const SIZE: usize = 28;

    pub fn new(aabb_min: [f32; 3], aabb_max: [f32; 3], mesh_count: u16) -> Self {
        Self {
            aabb_min,
            aabb_max,
            mesh_count,
        }
    }

    /// Write header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0] = AE3D_MAGIC[0] as u8;
        bytes[1] = AE3D_MAGIC[1] as u8;
        for (i, v) in self.aabb_min.iter().chain(self.aabb_max.iter()).enumerate() {
            let at = 2 + i * 4;
            bytes[at..at + 4].copy_from_slice(&v.to_le_bytes());
        }
        bytes[26..28].copy_from_slice(&self.mesh_count.to_le_bytes());
        bytes
    }

    /// Read header from bytes
    ///
    /// Returns `None` if the slice is too short or the magic bytes don't match.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        if bytes[0] as i8 != AE3D_MAGIC[0] || bytes[1] as i8 != AE3D_MAGIC[1] {
            return None;
        }
        let read_f32 = |at: usize| {
            f32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
        };
        Some(Self {
            aabb_min: [read_f32(2), read_f32(6), read_f32(10)],
            aabb_max: [read_f32(14), read_f32(18), read_f32(22)],
            mesh_count: u16::from_le_bytes([bytes[26], bytes[27]]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_header_roundtrip() {
        let header = Ae3dModelHeader::new([-1.0, -2.0, -3.0], [1.0, 2.0, 3.0], 7);

        let bytes = header.to_bytes();
        assert_eq!(bytes.len(), Ae3dModelHeader::SIZE);
        assert_eq!(&bytes[0..2], b"a9");

        let parsed = Ae3dModelHeader::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn test_model_header_layout() {
        let header = Ae3dModelHeader::new([0.5, 0.0, 0.0], [0.0, 0.0, 2.0], 0x0102);
        let bytes = header.to_bytes();
        assert_eq!(&bytes[2..6], &0.5f32.to_le_bytes());
        assert_eq!(&bytes[22..26], &2.0f32.to_le_bytes());
        assert_eq!(&bytes[26..28], &[0x02, 0x01]);
    }

    #[test]
    fn test_model_header_rejects_bad_magic() {
        let mut bytes = Ae3dModelHeader::new([0.0; 3], [0.0; 3], 1).to_bytes();
        bytes[1] = b'8';
        assert!(Ae3dModelHeader::from_bytes(&bytes).is_none());
    }

    #[test]
    fn test_model_header_from_short_bytes() {
        let short_bytes = [97u8, 57, 0, 0];
        assert!(Ae3dModelHeader::from_bytes(&short_bytes).is_none());
    }
}
