//! Binary serialization trait for fixed-size format headers.
//!
//! Each header keeps its type-specific `to_bytes()` returning a fixed-size
//! array; the trait gives generic code a uniform view.

/// Trait for binary-serializable format headers.
///
/// The trait uses `Vec<u8>` for the return type because associated const
/// generics in return types (`[u8; Self::SIZE]`) are not yet stable in Rust.
///
/// # Example
///
/// ```
/// use ae3d_common::formats::{Ae3dModelHeader, BinarySerializable};
///
/// let header = Ae3dModelHeader::new([0.0; 3], [1.0; 3], 2);
///
/// let bytes = header.serialize();
/// let parsed = Ae3dModelHeader::deserialize(&bytes).unwrap();
/// assert_eq!(parsed.mesh_count, 2);
/// ```
pub trait BinarySerializable: Sized {
    /// Size of the serialized header in bytes.
    const SIZE: usize;

    /// Serialize to bytes.
    fn serialize(&self) -> Vec<u8>;

    /// Deserialize from bytes.
    ///
    /// Returns `None` if the byte slice is too short or contains invalid data.
    fn deserialize(bytes: &[u8]) -> Option<Self>;
}

impl BinarySerializable for super::Ae3dModelHeader {
    const SIZE: usize = Self::SIZE;

    fn serialize(&self) -> Vec<u8> {
        self.to_bytes().to_vec()
    }

    fn deserialize(bytes: &[u8]) -> Option<Self> {
        Self::from_bytes(bytes)
    }
}
