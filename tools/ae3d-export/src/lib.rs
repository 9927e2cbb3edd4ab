//! ae3d-export library
//!
//! Turns scene geometry, skeletons and animation into `.ae3d` model files.
//! Scenes come in through [`scene::SceneProvider`]; the CLI uses the glTF and
//! OBJ providers, embedders can implement their own.

pub mod animation;
pub mod config;
pub mod error;
pub mod export;
pub mod formats;
pub mod mesh;
pub mod pool;
pub mod scene;
pub mod skeleton;
pub mod skinning;

// Re-export vertex format constants from ae3d-common
pub use ae3d_common::{
    legacy_format_byte, vertex_stride, AE3D_EXT, FORMAT_COLOR, FORMAT_NORMAL, FORMAT_PTN,
    FORMAT_PTNTC, FORMAT_PTNTC_SKINNED, FORMAT_SKINNED, FORMAT_TANGENT, FORMAT_UV,
};

// Re-export key types for driving an export
pub use config::ExportConfig;
pub use error::{ExportError, Result};
pub use export::{build_model, export_to_file, Model};
pub use formats::encode_model;
pub use scene::{GltfScene, MemoryScene, ObjScene, SceneProvider};
