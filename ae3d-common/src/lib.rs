//! Shared types and utilities for the AE3D model format
//!
//! This crate provides the wire-level pieces shared between:
//! - `ae3d-export` (asset pipeline, writer side)
//! - engine-side loaders and test readers
//!
//! # Modules
//!
//! - [`packing`] - Vertex capability flags, legacy format bytes, strides
//! - [`formats`] - Fixed binary headers and framing constants

pub mod formats;
pub mod packing;

// Re-export commonly used packing items
pub use packing::{
    FORMAT_COLOR, FORMAT_NORMAL, FORMAT_PTN, FORMAT_PTNTC, FORMAT_PTNTC_SKINNED, FORMAT_SKINNED,
    FORMAT_TANGENT, FORMAT_UV, LEGACY_PTN, LEGACY_PTNTC, LEGACY_PTNTC_SKINNED, MAX_INFLUENCES,
    format_from_legacy_byte, legacy_format_byte, vertex_stride,
};

// Re-export commonly used format items
pub use formats::{
    AE3D_EXT, AE3D_MAGIC, AE3D_TERMINATOR, Ae3dModelHeader, BinarySerializable, JOINT_MATRIX_SIZE,
    MAX_COUNT_U16, TRIANGLE_SIZE,
};
