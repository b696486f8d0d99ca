//! # Ember-Bake
//!
//! **Incremental chunked lightmap baker**
//!
//! Bakes static global illumination into lightmap textures, one scene
//! chunk at a time, so arbitrarily large scenes fit into bounded memory
//! and a bake can be resumed between editor sessions.
//!
//! ## Features
//!
//! - **Chunking**: Morton-ordered chunk partitioning of the scene
//! - **Charting**: shelf bin-packing of objects into lightmap atlases
//! - **Geometry buffers**: per-texel position, normal and coverage
//! - **Direct light**: shadow-traced Lambert for directional, point and
//!   spot lights
//! - **Indirect light**: deterministic Monte-Carlo gathering with
//!   configurable bounces, plus light probe refresh
//! - **Post-processing**: edge-aware denoising and UV seam stitching
//! - **Output**: gamma-encoded PNG images, one per lightmap
//!
//! ## Example
//!
//! ```rust,no_run
//! use ember_bake::prelude::*;
//!
//! let scene = shared_scene(Scene::default());
//! let collector = DefaultSceneCollector::new(scene.clone());
//!
//! let mut settings = BakeSettings::default();
//! settings.incremental.output_directory = "lightmaps".into();
//!
//! let mut lightmapper =
//!     IncrementalLightmapper::initialize(settings, scene, collector, MemoryLightCache::new())
//!         .expect("output directory must be configured");
//! lightmapper.process_scene();
//! lightmapper.bake().expect("bake failed");
//! ```
//!
//! ## Author
//!
//! Moroya Sakamoto

#![warn(missing_docs)]

pub mod baker;
pub mod cache;
pub mod chart;
pub mod chunks;
pub mod filter;
pub mod geometry;
pub mod raytrace;
pub mod scene;
pub mod settings;
pub mod stitch;
pub mod trace;
pub mod types;
pub mod vicinity;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude - commonly used types and functions
pub mod prelude {
    pub use crate::baker::{BakeError, IncrementalLightmapper, StepResult};
    pub use crate::cache::{BakedLightCache, MemoryLightCache};
    pub use crate::chart::{Chart, ChartRegion};
    pub use crate::geometry::{GeometryBuffer, LightmapSeam};
    pub use crate::scene::{
        shared_scene, BakeMode, DefaultSceneCollector, LightProbe, LightType, Scene,
        SceneCollector, SceneLight, SceneLightSource, SceneObject, SharedScene,
    };
    pub use crate::settings::{
        BakeSettings, ChartingSettings, FilterSettings, IncrementalSettings, StitchingSettings,
        TracingSettings,
    };
    pub use crate::types::{Aabb, ChunkCoord, TexRect};
    pub use crate::vicinity::ChunkVicinity;
}
