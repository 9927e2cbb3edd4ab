//! Vertex format capability flags
//!
//! In memory a mesh describes its vertex layout as a set of capability bits.
//! On the wire the layout is still a single legacy byte, so every supported
//! capability set maps to exactly one byte value:
//!
//! | Legacy byte | Capabilities                          | Stride |
//! |-------------|---------------------------------------|--------|
//! | 0           | position, uv, normal, tangent, color  | 64     |
//! | 1           | position, uv, normal                  | 32     |
//! | 2           | byte 0 + 4 weights + 4 joint indices  | 96     |
//!
//! Position is always present and has no flag.

// ============================================================================
// Vertex Format Constants
// ============================================================================

/// Vertex format flag: Has UV coordinates (2 floats)
pub const FORMAT_UV: u8 = 1;
/// Vertex format flag: Has per-vertex color (RGBA, 4 floats)
pub const FORMAT_COLOR: u8 = 2;
/// Vertex format flag: Has normals (3 floats)
pub const FORMAT_NORMAL: u8 = 4;
/// Vertex format flag: Has joint weights (4 floats) and joint indices (4 i32)
pub const FORMAT_SKINNED: u8 = 8;
/// Vertex format flag: Has tangent + handedness (4 floats)
pub const FORMAT_TANGENT: u8 = 16;

/// Position, uv, normal
pub const FORMAT_PTN: u8 = FORMAT_UV | FORMAT_NORMAL;
/// Position, uv, normal, tangent, color
pub const FORMAT_PTNTC: u8 = FORMAT_UV | FORMAT_NORMAL | FORMAT_TANGENT | FORMAT_COLOR;
/// PTNTC plus skinning
pub const FORMAT_PTNTC_SKINNED: u8 = FORMAT_PTNTC | FORMAT_SKINNED;

/// Legacy wire byte for [`FORMAT_PTNTC`]
pub const LEGACY_PTNTC: i8 = 0;
/// Legacy wire byte for [`FORMAT_PTN`]
pub const LEGACY_PTN: i8 = 1;
/// Legacy wire byte for [`FORMAT_PTNTC_SKINNED`]
pub const LEGACY_PTNTC_SKINNED: i8 = 2;

/// Joint influences stored per skinned vertex
pub const MAX_INFLUENCES: usize = 4;

/// Map a capability set to its legacy wire byte.
///
/// Returns `None` for combinations the engine cannot read.
#[inline]
pub const fn legacy_format_byte(format: u8) -> Option<i8> {
    match format {
        FORMAT_PTNTC => Some(LEGACY_PTNTC),
        FORMAT_PTN => Some(LEGACY_PTN),
        FORMAT_PTNTC_SKINNED => Some(LEGACY_PTNTC_SKINNED),
        _ => None,
    }
}

/// Map a legacy wire byte back to its capability set.
#[inline]
pub const fn format_from_legacy_byte(byte: i8) -> Option<u8> {
    match byte {
        LEGACY_PTNTC => Some(FORMAT_PTNTC),
        LEGACY_PTN => Some(FORMAT_PTN),
        LEGACY_PTNTC_SKINNED => Some(FORMAT_PTNTC_SKINNED),
        _ => None,
    }
}

/// Calculate vertex stride in bytes for a capability set
#[inline]
pub const fn vertex_stride(format: u8) -> u32 {
    let mut stride = 12; // Position: Float32x3

    if format & FORMAT_UV != 0 {
        stride += 8; // Float32x2
    }
    if format & FORMAT_NORMAL != 0 {
        stride += 12; // Float32x3
    }
    if format & FORMAT_TANGENT != 0 {
        stride += 16; // Float32x4
    }
    if format & FORMAT_COLOR != 0 {
        stride += 16; // Float32x4
    }
    if format & FORMAT_SKINNED != 0 {
        stride += 32; // Weights Float32x4 + joint indices Sint32x4
    }

    stride
}
