//! Export pipeline
//!
//! Extract -> tangents -> bounds, joined with skeleton -> skin weights ->
//! animation, then encode. Each stage returns values that are merged into a
//! [`Model`]; the output file is only created once the encoded bytes exist.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use ae3d_common::{AE3D_EXT, FORMAT_PTN, FORMAT_PTNTC, FORMAT_PTNTC_SKINNED};

use crate::animation::{attach_tracks, sample_animation, AnimationTrack};
use crate::config::ExportConfig;
use crate::error::{ExportError, Result};
use crate::formats::encode_model;
use crate::mesh::{compute_tangents, extract_mesh, Aabb, Mesh};
use crate::pool::ValuePool;
use crate::scene::{HostMesh, PlayheadGuard, SceneProvider};
use crate::skeleton::{build_skeleton, Skeleton};
use crate::skinning::build_skin;

/// Everything written to one .ae3d file
#[derive(Debug, Clone, Default)]
pub struct Model {
    /// Union of all non-empty mesh boxes
    pub aabb: Aabb,
    pub meshes: Vec<Mesh>,
    pub skeleton: Skeleton,
    pub tracks: Vec<AnimationTrack>,
    pub pool: ValuePool,
}

impl Model {
    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(|m| m.vertices.len()).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(|m| m.triangles.len()).sum()
    }
}

/// State shared by the pipeline stages of one export run
pub struct ExportContext<'a> {
    pub config: &'a ExportConfig,
    pub pool: ValuePool,
}

impl<'a> ExportContext<'a> {
    pub fn new(config: &'a ExportConfig) -> Self {
        Self {
            config,
            pool: ValuePool::new(),
        }
    }

    /// Run geometry stages for one host mesh
    pub fn build_mesh(&self, host: &HostMesh, skeleton: &Skeleton) -> Mesh {
        let mut extracted = extract_mesh(host, &self.config.geometry);

        if !extracted.has_host_tangents {
            compute_tangents(&extracted.name, &mut extracted.vertices, &extracted.triangles);
        }

        let aabb = Aabb::from_points(extracted.vertices.iter().map(|v| v.position));
        if aabb.is_empty() {
            tracing::warn!("Mesh '{}' has no geometry", extracted.name);
        }

        let skin = build_skin(host, &extracted.sources, skeleton);
        let format = if skin.is_some() {
            FORMAT_PTNTC_SKINNED
        } else if self.config.geometry.ptn_only {
            FORMAT_PTN
        } else {
            FORMAT_PTNTC
        };

        Mesh {
            name: extracted.name,
            vertices: extracted.vertices,
            triangles: extracted.triangles,
            aabb,
            format,
            skin,
        }
    }
}

/// Union of every non-empty mesh box
pub fn model_aabb(meshes: &[Mesh]) -> Aabb {
    meshes
        .iter()
        .filter(|m| !m.aabb.is_empty())
        .fold(Aabb::EMPTY, |acc, m| acc.union(m.aabb))
}

/// Build the full model from a scene.
///
/// The playhead is saved on entry and restored on every exit path.
pub fn build_model<P: SceneProvider + ?Sized>(
    provider: &mut P,
    config: &ExportConfig,
) -> Result<Model> {
    let mut scene = PlayheadGuard::new(provider);
    let mut ctx = ExportContext::new(config);

    let host_meshes = scene.meshes();
    if host_meshes.is_empty() {
        tracing::warn!("No meshes selected, writing an empty model");
        return Ok(Model::default());
    }

    let armatures = scene.armatures();
    let mut skeleton = build_skeleton(&armatures, &mut ctx.pool)?;

    let meshes: Vec<Mesh> = host_meshes
        .iter()
        .map(|host| ctx.build_mesh(host, &skeleton))
        .collect();

    let tracks = if config.animation.disabled || !meshes.iter().any(Mesh::is_skinned) {
        Vec::new()
    } else {
        let frame_rate = config.resolve_frame_rate(scene.frame_rate());
        sample_animation(
            &mut *scene,
            &skeleton,
            armatures.len(),
            &mut ctx.pool,
            frame_rate,
        )
    };
    attach_tracks(&mut skeleton, &tracks, &ctx.pool);

    let model = Model {
        aabb: model_aabb(&meshes),
        meshes,
        skeleton,
        tracks,
        pool: ctx.pool,
    };

    tracing::info!(
        "Built model: {} meshes, {} vertices, {} triangles, {} joints",
        model.meshes.len(),
        model.vertex_count(),
        model.triangle_count(),
        model.skeleton.len()
    );

    Ok(model)
}

/// Output path with the .ae3d extension appended when missing
pub fn output_path(path: &Path) -> PathBuf {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case(AE3D_EXT) => path.to_path_buf(),
        _ => {
            let mut name = path.as_os_str().to_owned();
            name.push(".");
            name.push(AE3D_EXT);
            PathBuf::from(name)
        }
    }
}

/// Build, encode, then write the model file in one go.
///
/// Returns the path actually written. Nothing is created on disk if building
/// or encoding fails.
pub fn export_to_file<P: SceneProvider + ?Sized>(
    provider: &mut P,
    config: &ExportConfig,
    path: &Path,
) -> Result<PathBuf> {
    let model = build_model(provider, config)?;
    let bytes = encode_model(&model)?;

    let path = output_path(path);
    let io_error = |source| ExportError::Io {
        path: path.clone(),
        source,
    };

    let file = File::create(&path).map_err(io_error)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(&bytes).map_err(io_error)?;
    writer.flush().map_err(io_error)?;

    tracing::info!("Wrote {:?} ({} bytes)", path, bytes.len());
    Ok(path)
}
