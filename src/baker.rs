//! Incremental lightmap baker
//!
//! Drives the whole pipeline as a resumable four-phase state machine.
//! Every phase advances one chunk per step and reports [`StepResult`], so
//! a host application can spread a bake over frames or sessions:
//!
//! 1. Charting: allocate lightmap regions for chunk-owned objects and
//!    rasterize their geometry buffers.
//! 2. Vicinity: snapshot each chunk's padded surroundings.
//! 3. Direct: bake direct light for every chunk-owned lightmap.
//! 4. Indirect: gather bounces, filter, stitch, compose and write images,
//!    and refresh light probes.
//!
//! [`IncrementalLightmapper::process_scene`] drives phases 1 and 2, after
//! which lightmap references in the scene are final;
//! [`IncrementalLightmapper::bake`] drives phases 3 and 4.
//!
//! Artifacts flow between phases exclusively through the
//! [`BakedLightCache`], which is also where release points are: geometry
//! buffers and vicinities die with their chunk in phase 4, direct buffers
//! in bulk once phase 4 completes, since any chunk may read a neighbour's
//! direct light until the very end.
//!
//! Author: Moroya Sakamoto

use crate::cache::BakedLightCache;
use crate::chart::{apply_charts, generate_charts};
use crate::chunks::sort_chunks;
use crate::geometry::bake_geometry_buffers;
use crate::scene::{SceneCollector, SharedScene};
use crate::settings::BakeSettings;
use crate::stitch::StitchingContext;
use crate::trace::direct::bake_direct_light;
use crate::trace::indirect::{bake_indirect_light, bake_probe_irradiance, DirectLightMaps};
use crate::trace::{BakedDirect, BakedIndirect};
use crate::types::ChunkCoord;
use crate::vicinity::create_chunk_vicinity;
use glam::{Vec3, Vec4};
use log::{debug, info};
use std::path::PathBuf;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors and results
// ---------------------------------------------------------------------------

/// Failures of the baking pipeline.
#[derive(Debug, Error)]
pub enum BakeError {
    /// The output directory setting is empty.
    #[error("Output directory is not configured")]
    NoOutputDirectory,
    /// Filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Lightmap image could not be encoded or written.
    #[error("Failed to write lightmap image {path}: {source}")]
    Image {
        /// Destination path.
        path: PathBuf,
        /// Underlying encoder error.
        source: image::ImageError,
    },
}

/// Outcome of a single phase step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    /// The phase has more chunks to process.
    Pending,
    /// The phase is complete. Further steps are no-ops.
    Done,
}

// ---------------------------------------------------------------------------
// Lightmapper
// ---------------------------------------------------------------------------

/// Resumable incremental lightmapper over a shared scene.
pub struct IncrementalLightmapper<C: SceneCollector, K: BakedLightCache> {
    settings: BakeSettings,
    scene: SharedScene,
    collector: C,
    cache: K,
    chunks: Vec<ChunkCoord>,
    num_charts: u32,
    charting_cursor: usize,
    vicinity_cursor: usize,
    direct_cursor: usize,
    indirect_cursor: usize,
    direct_released: bool,
    stitching: Option<StitchingContext>,
}

impl<C: SceneCollector, K: BakedLightCache> IncrementalLightmapper<C, K> {
    /// Lock the scene, partition it into chunks and get ready to step.
    ///
    /// Chunks are ordered along a Morton curve of their coordinates so
    /// neighbouring chunks are processed close together, keeping warm
    /// cache entries relevant.
    pub fn initialize(
        settings: BakeSettings,
        scene: SharedScene,
        mut collector: C,
        cache: K,
    ) -> Result<Self, BakeError> {
        if settings.incremental.output_directory.as_os_str().is_empty() {
            return Err(BakeError::NoOutputDirectory);
        }
        std::fs::create_dir_all(&settings.incremental.output_directory)?;

        collector.lock_scene(settings.incremental.chunk_size);
        let mut chunks = collector.chunks();
        sort_chunks(&mut chunks);
        info!("Baking scene of {} chunks", chunks.len());

        Ok(Self {
            settings,
            scene,
            collector,
            cache,
            chunks,
            num_charts: 0,
            charting_cursor: 0,
            vicinity_cursor: 0,
            direct_cursor: 0,
            indirect_cursor: 0,
            direct_released: false,
            stitching: None,
        })
    }

    /// Chunks in processing order.
    pub fn chunks(&self) -> &[ChunkCoord] {
        &self.chunks
    }

    /// Number of lightmap charts allocated so far.
    pub fn num_charts(&self) -> u32 {
        self.num_charts
    }

    /// Cache holding intermediate and final artifacts.
    pub fn cache(&self) -> &K {
        &self.cache
    }

    /// Destination of the image for a lightmap index.
    pub fn lightmap_file_name(&self, lightmap: u32) -> PathBuf {
        let incremental = &self.settings.incremental;
        incremental.output_directory.join(format!(
            "{}{}{}",
            incremental.name_prefix, lightmap, incremental.name_suffix
        ))
    }

    // ---------------------------------------------------------------------------
// Phase 1: charting
// ---------------------------------------------------------------------------

    /// Chart the next chunk's objects and rasterize their geometry.
    pub fn step_charting(&mut self) -> StepResult {
        let Some(&chunk) = self.chunks.get(self.charting_cursor) else {
            return StepResult::Done;
        };
        self.charting_cursor += 1;

        let objects = self.collector.unique_objects_in_chunk(chunk);
        let charts = {
            let scene = self.scene.read().unwrap();
            generate_charts(&scene, &objects, &self.settings.charting, self.num_charts)
        };
        {
            let mut scene = self.scene.write().unwrap();
            apply_charts(&charts, &mut scene);
        }

        let buffers = {
            let scene = self.scene.read().unwrap();
            bake_geometry_buffers(&scene, &charts)
        };
        for buffer in buffers {
            self.cache.store_geometry_buffer(buffer.lightmap_index, buffer);
        }

        let lightmaps: Vec<u32> = charts.iter().map(|chart| chart.index).collect();
        debug!(
            "Charted chunk {chunk}: {} objects into {} lightmaps",
            objects.len(),
            lightmaps.len()
        );
        self.num_charts += charts.len() as u32;
        self.cache.store_lightmaps_for_chunk(chunk, lightmaps);
        StepResult::Pending
    }

    // ---------------------------------------------------------------------------
// Phase 2: vicinity
// ---------------------------------------------------------------------------

    /// Snapshot the padded surroundings of the next chunk.
    pub fn step_charting_vicinity(&mut self) -> StepResult {
        let Some(&chunk) = self.chunks.get(self.vicinity_cursor) else {
            return StepResult::Done;
        };
        self.vicinity_cursor += 1;

        let vicinity =
            create_chunk_vicinity(&self.scene, &self.collector, chunk, &self.settings.incremental);
        debug!(
            "Collected vicinity of chunk {chunk}: {} lights, {} probes",
            vicinity.lights.len(),
            vicinity.probes.len()
        );
        self.cache.store_chunk_vicinity(chunk, vicinity);
        StepResult::Pending
    }

    // ---------------------------------------------------------------------------
// Phase 3: direct light
// ---------------------------------------------------------------------------

    /// Bake direct light for the lightmaps owned by the next chunk.
    pub fn step_bake_direct(&mut self) -> StepResult {
        let Some(&chunk) = self.chunks.get(self.direct_cursor) else {
            return StepResult::Done;
        };
        self.direct_cursor += 1;

        let lightmaps = self
            .cache
            .load_lightmaps_for_chunk(chunk)
            .expect("charting must run before direct baking");
        let vicinity = self
            .cache
            .load_chunk_vicinity(chunk)
            .expect("vicinity collection must run before direct baking");

        for &lightmap in lightmaps.iter() {
            let geometry = self
                .cache
                .load_geometry_buffer(lightmap)
                .expect("geometry buffers outlive the direct phase");

            let mut direct = BakedDirect::new(lightmap, geometry.width);
            bake_direct_light(&mut direct, &geometry, &vicinity, &self.settings.tracing);
            self.cache.store_direct_light(lightmap, direct);
        }
        debug!("Baked direct light of chunk {chunk}");
        StepResult::Pending
    }

    // ---------------------------------------------------------------------------
// Phase 4: indirect light and output
// ---------------------------------------------------------------------------

    /// Bake indirect light for the next chunk, then filter, stitch,
    /// compose and save its lightmaps and refresh its probes.
    pub fn step_bake_indirect(&mut self) -> Result<StepResult, BakeError> {
        let Some(&chunk) = self.chunks.get(self.indirect_cursor) else {
            self.release_direct_light();
            return Ok(StepResult::Done);
        };
        self.indirect_cursor += 1;

        let lightmaps = self
            .cache
            .load_lightmaps_for_chunk(chunk)
            .expect("charting must run before indirect baking");
        let vicinity = self
            .cache
            .load_chunk_vicinity(chunk)
            .expect("vicinity collection must run before indirect baking");

        // Direct light of everything rays can reach from this chunk.
        let mut direct_maps = DirectLightMaps::new();
        for geometry in vicinity.raytracer.geometries() {
            if !direct_maps.contains_key(&geometry.lightmap_index) {
                let direct = self
                    .cache
                    .load_direct_light(geometry.lightmap_index)
                    .expect("direct baking must run before indirect baking");
                direct_maps.insert(geometry.lightmap_index, direct);
            }
        }

        // Shared stitching scratch, created with the first chunk and
        // reused for every later one.
        let mut stitching = self
            .stitching
            .take()
            .unwrap_or_else(|| StitchingContext::new(self.settings.charting.chart_size));
        for &lightmap in lightmaps.iter() {
            let geometry = self
                .cache
                .load_geometry_buffer(lightmap)
                .expect("geometry buffers outlive the indirect phase");
            let direct = self
                .cache
                .load_direct_light(lightmap)
                .expect("direct baking must run before indirect baking");

            let mut indirect = BakedIndirect::new(self.settings.charting.chart_size);
            bake_indirect_light(
                &mut indirect,
                &geometry,
                &vicinity,
                &direct_maps,
                &self.settings.tracing,
            );
            indirect.normalize();
            crate::filter::filter_indirect_light(
                &mut indirect,
                &geometry,
                &self.settings.filter,
                self.settings.tracing.num_tasks,
            );
            stitching.stitch_seams(&mut indirect.light, &geometry.seams, &self.settings.stitching);

            self.save_lightmap(lightmap, &direct, &indirect)?;
            self.cache.release_geometry_buffer(lightmap);
        }
        self.stitching = Some(stitching);

        // Refresh probes caught in this chunk's vicinity.
        let mut scene = self.scene.write().unwrap();
        for &probe in &vicinity.probes {
            let position = scene.probes[probe].position;
            scene.probes[probe].irradiance = bake_probe_irradiance(
                position,
                &vicinity,
                &direct_maps,
                &self.settings.tracing,
            );
        }
        drop(scene);

        self.cache.release_chunk_vicinity(chunk);
        debug!("Baked and saved lightmaps of chunk {chunk}");
        Ok(StepResult::Pending)
    }

    /// Direct buffers are shared across chunks and can only go once the
    /// last chunk is done.
    fn release_direct_light(&mut self) {
        if self.direct_released {
            return;
        }
        self.direct_released = true;
        for lightmap in 0..self.num_charts {
            self.cache.release_direct_light(lightmap);
        }
    }

    /// Compose direct and indirect light into a gamma-encoded image file.
    fn save_lightmap(
        &self,
        lightmap: u32,
        direct: &BakedDirect,
        indirect: &BakedIndirect,
    ) -> Result<(), BakeError> {
        let size = self.settings.charting.chart_size;
        let mut image = image::RgbaImage::new(size, size);

        for (index, pixel) in image.pixels_mut().enumerate() {
            let bounced = indirect.light[index];
            let linear = direct.light[index] + Vec3::new(bounced.x, bounced.y, bounced.z);
            let encoded = Vec4::new(
                linear.x.max(0.0).powf(1.0 / 2.2),
                linear.y.max(0.0).powf(1.0 / 2.2),
                linear.z.max(0.0).powf(1.0 / 2.2),
                1.0,
            )
            .min(Vec4::ONE);
            *pixel = image::Rgba([
                (encoded.x * 255.0).round() as u8,
                (encoded.y * 255.0).round() as u8,
                (encoded.z * 255.0).round() as u8,
                255,
            ]);
        }

        let path = self.lightmap_file_name(lightmap);
        image
            .save(&path)
            .map_err(|source| BakeError::Image { path, source })
    }

    // ---------------------------------------------------------------------------
// Whole-scene driver
// ---------------------------------------------------------------------------

    /// Run charting and vicinity collection to completion.
    ///
    /// After this returns every object carries its final lightmap index
    /// and UV transform, so the scene can be serialized or referenced
    /// before a single image exists.
    pub fn process_scene(&mut self) {
        while self.step_charting() == StepResult::Pending {}
        info!("Charting done, {} lightmaps", self.num_charts);
        while self.step_charting_vicinity() == StepResult::Pending {}
        info!("Vicinity collection done");
    }

    /// Run direct and indirect baking to completion and write the
    /// lightmap images. [`Self::process_scene`] must have run first.
    pub fn bake(&mut self) -> Result<(), BakeError> {
        while self.step_bake_direct() == StepResult::Pending {}
        info!("Direct baking done");
        while self.step_bake_indirect()? == StepResult::Pending {}
        info!("Indirect baking done");
        Ok(())
    }
}
