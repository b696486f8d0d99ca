//! Chunk vicinity
//!
//! The vicinity of a chunk is everything light can carry into it: the
//! chunk volume expanded by the scene padding, snapshotted as a raytracer
//! scene plus the relevant lights and probes.
//!
//! Author: Moroya Sakamoto

use crate::raytrace::RaytracerScene;
use crate::scene::{SceneCollector, SceneLight, SharedScene};
use crate::settings::IncrementalSettings;
use crate::types::ChunkCoord;

/// Immutable snapshot of a chunk's surroundings, ready for tracing.
#[derive(Debug, Clone)]
pub struct ChunkVicinity {
    /// Raytracer over all geometry within the padded chunk volume.
    pub raytracer: RaytracerScene,
    /// Lights affecting the padded volume.
    pub lights: Vec<SceneLight>,
    /// Indices of light probes inside the padded volume.
    pub probes: Vec<usize>,
}

/// Snapshot the padded surroundings of `chunk`.
///
/// The padding is applied symmetrically on all sides so illumination from
/// neighbouring chunks is captured no matter the direction.
pub fn create_chunk_vicinity<C: SceneCollector>(
    scene: &SharedScene,
    collector: &C,
    chunk: ChunkCoord,
    settings: &IncrementalSettings,
) -> ChunkVicinity {
    let volume = collector
        .chunk_bounding_box(chunk)
        .expanded(settings.scene_padding);
    let objects = collector.objects_in_volume(chunk, &volume);
    let lights = collector.lights_in_volume(chunk, &volume);

    let scene = scene.read().unwrap();
    let raytracer = RaytracerScene::build(&scene, &objects);
    let lights = lights
        .into_iter()
        .map(|index| SceneLight::snapshot(&scene.lights[index]))
        .collect();
    let probes = scene
        .probes
        .iter()
        .enumerate()
        .filter(|(_, probe)| volume.contains(probe.position))
        .map(|(index, _)| index)
        .collect();

    ChunkVicinity {
        raytracer,
        lights,
        probes,
    }
}
