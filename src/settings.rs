//! Baking configuration surface
//!
//! Plain value settings for charting, tracing, filtering, stitching and
//! the incremental driver. No environment or CLI coupling; an editor layer
//! may persist these as presets via serde.
//!
//! Author: Moroya Sakamoto

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Charting
// ---------------------------------------------------------------------------

/// Lightmap chart allocation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartingSettings {
    /// Size of one lightmap chart (atlas page edge, texels).
    pub chart_size: u32,
    /// Largest region a single object may occupy. Desired sizes above this
    /// are uniformly downscaled, lowering effective texel density.
    pub max_region_size: u32,
    /// Padding between individual objects on the chart, texels.
    pub padding: u32,
    /// Texel density in texels per scene unit.
    pub texel_density: f32,
    /// Minimal rescale factor for object lightmaps.
    /// Values above 0 may cause inconsistent lightmap density if object
    /// scale is too small.
    pub min_object_scale: f32,
}

impl Default for ChartingSettings {
    fn default() -> Self {
        Self {
            chart_size: 512,
            max_region_size: 510,
            padding: 1,
            texel_density: 10.0,
            min_object_scale: 1.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Tracing
// ---------------------------------------------------------------------------

/// Ray tracing settings shared by direct and indirect baking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TracingSettings {
    /// Number of indirect bounces.
    pub num_bounces: u32,
    /// Number of indirect gather samples per texel.
    pub num_indirect_samples: u32,
    /// Ray origin offset along the normal, avoids self-intersection.
    pub ray_position_offset: f32,
    /// Number of parallel tasks a texel loop is split into.
    pub num_tasks: u32,
}

impl TracingSettings {
    /// Hard cap on bounce depth.
    pub const MAX_BOUNCES: u32 = 8;
}

impl Default for TracingSettings {
    fn default() -> Self {
        Self {
            num_bounces: 2,
            num_indirect_samples: 10,
            ray_position_offset: 0.001,
            num_tasks: 8,
        }
    }
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

/// Edge-aware denoise filter settings for indirect light.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterSettings {
    /// Kernel half-width in texels, 0..=5. Zero disables the filter.
    pub kernel_radius: u32,
    /// Number of filter passes.
    pub num_iterations: u32,
    /// Luminance blend threshold: larger keeps more noise but fewer edges.
    pub color_sigma: f32,
    /// Position blend threshold in scene units.
    pub position_sigma: f32,
    /// Normal smoothing strength (cosine power).
    pub normal_power: f32,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            kernel_radius: 2,
            num_iterations: 1,
            color_sigma: 0.3,
            position_sigma: 1.0,
            normal_power: 4.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Stitching
// ---------------------------------------------------------------------------

/// Seam stitching settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StitchingSettings {
    /// Number of blend iterations. Zero disables stitching.
    pub num_iterations: u32,
    /// Per-iteration blend toward the seam midpoint, 0..=1.
    pub blend_factor: f32,
}

impl Default for StitchingSettings {
    fn default() -> Self {
        Self {
            num_iterations: 4,
            blend_factor: 0.6,
        }
    }
}

// ---------------------------------------------------------------------------
// Incremental driver
// ---------------------------------------------------------------------------

/// Settings for the incremental driver itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncrementalSettings {
    /// World-space edge length of one chunk.
    pub chunk_size: f32,
    /// Margin applied on all sides of a chunk when collecting its vicinity.
    pub scene_padding: f32,
    /// Directory lightmap images are written to.
    pub output_directory: PathBuf,
    /// Lightmap file name prefix.
    pub name_prefix: String,
    /// Lightmap file name suffix, including extension.
    pub name_suffix: String,
}

impl Default for IncrementalSettings {
    fn default() -> Self {
        Self {
            chunk_size: 64.0,
            scene_padding: 32.0,
            output_directory: PathBuf::new(),
            name_prefix: "lightmap-".to_string(),
            name_suffix: ".png".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregate
// ---------------------------------------------------------------------------

/// All settings consumed by the baking pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BakeSettings {
    /// Chart allocation settings.
    pub charting: ChartingSettings,
    /// Ray tracing settings.
    pub tracing: TracingSettings,
    /// Indirect light filter settings.
    pub filter: FilterSettings,
    /// Seam stitching settings.
    pub stitching: StitchingSettings,
    /// Incremental driver settings.
    pub incremental: IncrementalSettings,
}
