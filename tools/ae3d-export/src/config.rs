//! export.toml parsing
//!
//! Every field is optional; an empty file (or no file at all) gives the
//! legacy exporter behavior. CLI flags override file values.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Frame rate used when neither the config nor the host provides one
pub const LEGACY_FRAME_RATE: f32 = 24.0;

/// export.toml structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportConfig {
    #[serde(default)]
    pub geometry: GeometrySection,
    #[serde(default)]
    pub animation: AnimationSection,
}

/// Geometry extraction settings
#[derive(Debug, Clone, Deserialize)]
pub struct GeometrySection {
    /// Merge corners with matching attributes into shared vertices.
    /// Default: false (one vertex per triangle corner)
    #[serde(default)]
    pub weld_vertices: bool,

    /// Rotate -90° about X so Z-up scenes come out Y-up.
    /// Default: false
    #[serde(default)]
    pub z_up_to_y_up: bool,

    /// Write position/uv/normal only (format byte 1) for unskinned meshes.
    /// Default: false (PTNTC)
    #[serde(default)]
    pub ptn_only: bool,

    /// Fallback auto-smooth angle in degrees for meshes that request
    /// auto-smooth without giving their own threshold.
    /// Default: 30
    #[serde(default = "default_auto_smooth_angle")]
    pub auto_smooth_angle: f32,
}

impl Default for GeometrySection {
    fn default() -> Self {
        Self {
            weld_vertices: false,
            z_up_to_y_up: false,
            ptn_only: false,
            auto_smooth_angle: default_auto_smooth_angle(),
        }
    }
}

fn default_auto_smooth_angle() -> f32 {
    30.0
}

/// Animation sampling settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnimationSection {
    /// Sampling rate override in frames per second.
    /// Default: the host's rate, or 24 if the host has none
    #[serde(default)]
    pub frame_rate: Option<f32>,

    /// Name of the clip to sample for hosts that carry several.
    /// Default: the first clip
    #[serde(default)]
    pub clip: Option<String>,

    /// Skip animation sampling entirely.
    /// Default: false
    #[serde(default)]
    pub disabled: bool,
}

impl ExportConfig {
    /// Load config from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        Self::parse(&content)
    }

    /// Parse config from string
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse export.toml")
    }

    /// Resolve the sampling rate: config override, then host rate, then 24 fps
    pub fn resolve_frame_rate(&self, host_rate: Option<f32>) -> f32 {
        let positive = |rate: &f32| *rate > 0.0;
        self.animation
            .frame_rate
            .filter(positive)
            .or(host_rate.filter(positive))
            .unwrap_or(LEGACY_FRAME_RATE)
    }
}
