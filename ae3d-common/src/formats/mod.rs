//! AE3D binary model format
//!
//! One `.ae3d` file holds a whole model: a fixed header, a variable-length
//! record per mesh, and a terminator byte. All integers are little-endian and
//! all floating-point values are 32-bit.
//!
//! Only the fixed-size pieces live here. The variable-length mesh and joint
//! records are written by `ae3d-export`; their layout is documented in
//! [`model`].
//!
//! All fixed headers implement the [`BinarySerializable`] trait for consistent
//! serialization/deserialization.

pub mod model;
mod serialization;

pub use model::*;
pub use serialization::BinarySerializable;

/// File extension for AE3D models
pub const AE3D_EXT: &str = "ae3d";
