//! ae3d-export - AE3D model export tool
//!
//! Converts glTF/GLB and OBJ scenes (meshes, skeletons, animation) to .ae3d

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use ae3d_export::scene::HostMesh;
use ae3d_export::{
    build_model, encode_model, export_to_file, ExportConfig, GltfScene, ObjScene, SceneProvider,
    AE3D_EXT,
};

#[derive(Parser)]
#[command(name = "ae3d-export")]
#[command(about = "AE3D model export tool")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a scene file to .ae3d
    Export {
        /// Input scene file (glTF/GLB/OBJ)
        input: PathBuf,

        /// Output .ae3d file (default: input with .ae3d extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        options: ExportOptions,
    },

    /// Build the model without writing it and print a summary
    Check {
        /// Input scene file (glTF/GLB/OBJ)
        input: PathBuf,

        #[command(flatten)]
        options: ExportOptions,
    },

    /// List meshes, armatures and animations in a scene file
    List {
        /// Input scene file (glTF/GLB/OBJ)
        input: PathBuf,
    },
}

/// Settings shared by export and check; flags override export.toml
#[derive(Args)]
struct ExportOptions {
    /// Path to export.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Animation sampling rate in frames per second (default: 24)
    #[arg(short, long)]
    frame_rate: Option<f32>,

    /// Animation clip name (default: first clip)
    #[arg(short, long)]
    animation: Option<String>,

    /// Merge corners with identical attributes into shared vertices
    #[arg(long)]
    weld: bool,

    /// Convert a Z-up scene to Y-up
    #[arg(long)]
    z_up: bool,

    /// Write position/uv/normal only for unskinned meshes
    #[arg(long)]
    ptn: bool,
}

impl ExportOptions {
    /// Load export.toml (if given) and apply command-line overrides
    fn resolve(&self) -> Result<ExportConfig> {
        let mut config = match &self.config {
            Some(path) => ExportConfig::load(path)?,
            None => ExportConfig::default(),
        };

        if let Some(rate) = self.frame_rate {
            if rate <= 0.0 {
                bail!("Frame rate must be positive, got {}", rate);
            }
            config.animation.frame_rate = Some(rate);
        }
        if let Some(clip) = &self.animation {
            config.animation.clip = Some(clip.clone());
        }
        config.geometry.weld_vertices |= self.weld;
        config.geometry.z_up_to_y_up |= self.z_up;
        config.geometry.ptn_only |= self.ptn;

        Ok(config)
    }
}

/// Input formats, detected by extension
enum SceneFormat {
    Obj,
    Gltf,
}

fn detect_format(input: &Path) -> Result<SceneFormat> {
    let ext = input
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "obj" => Ok(SceneFormat::Obj),
        "gltf" | "glb" => Ok(SceneFormat::Gltf),
        _ => bail!(
            "Unsupported scene format: {:?} (use .obj, .gltf, or .glb)",
            input
        ),
    }
}

fn open_scene(input: &Path, config: &ExportConfig) -> Result<Box<dyn SceneProvider>> {
    let scene: Box<dyn SceneProvider> = match detect_format(input)? {
        SceneFormat::Obj => Box::new(ObjScene::load(input)?),
        SceneFormat::Gltf => Box::new(GltfScene::open(
            input,
            config.animation.clip.as_deref(),
            config.resolve_frame_rate(None),
        )?),
    };
    Ok(scene)
}

fn log_meshes(meshes: &[HostMesh]) {
    tracing::info!("{} mesh(es):", meshes.len());
    for mesh in meshes {
        tracing::info!(
            "  '{}': {} vertices, {} faces{}",
            mesh.name,
            mesh.positions.len(),
            mesh.faces.len(),
            if mesh.groups.iter().any(|g| !g.is_empty()) {
                ", weighted"
            } else {
                ""
            }
        );
    }
}

fn list_scene(input: &Path) -> Result<()> {
    let config = ExportConfig::default();
    let (scene, animations) = match detect_format(input)? {
        SceneFormat::Obj => {
            let scene: Box<dyn SceneProvider> = Box::new(ObjScene::load(input)?);
            (scene, Vec::new())
        }
        SceneFormat::Gltf => {
            let gltf = GltfScene::open(input, None, config.resolve_frame_rate(None))?;
            let animations = gltf.animation_names().to_vec();
            let scene: Box<dyn SceneProvider> = Box::new(gltf);
            (scene, animations)
        }
    };

    log_meshes(&scene.meshes());

    let armatures = scene.armatures();
    tracing::info!("{} armature(s):", armatures.len());
    for armature in &armatures {
        tracing::info!("  '{}': {} bones", armature.name, armature.bones.len());
    }

    tracing::info!("{} animation(s):", animations.len());
    for (i, name) in animations.iter().enumerate() {
        tracing::info!("  [{}] '{}'", i, name);
    }

    Ok(())
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Export {
            input,
            output,
            options,
        } => {
            let config = options.resolve()?;
            let output = output.unwrap_or_else(|| input.with_extension(AE3D_EXT));
            tracing::info!("Exporting {:?} -> {:?}", input, output);

            let mut scene = open_scene(&input, &config)?;
            export_to_file(&mut scene, &config, &output)?;
            tracing::info!("Done!");
        }

        Commands::Check { input, options } => {
            let config = options.resolve()?;
            tracing::info!("Checking {:?}", input);

            let mut scene = open_scene(&input, &config)?;
            let model = build_model(&mut scene, &config)?;
            let bytes = encode_model(&model)?;

            for mesh in &model.meshes {
                tracing::info!(
                    "  '{}': {} vertices, {} triangles, format {:#04x}",
                    mesh.name,
                    mesh.vertices.len(),
                    mesh.triangles.len(),
                    mesh.format
                );
            }
            for track in &model.tracks {
                tracing::info!(
                    "  armature {}: {} keyframes, {} ms",
                    track.armature,
                    track.frames.len(),
                    track.length_ms
                );
            }
            tracing::info!(
                "Model is valid: {} meshes, {} joints, {} bytes",
                model.meshes.len(),
                model.skeleton.len(),
                bytes.len()
            );
        }

        Commands::List { input } => {
            list_scene(&input)?;
        }
    }

    Ok(())
}
