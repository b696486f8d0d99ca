//! Scene data model and collector contract
//!
//! The pipeline consumes geometry and light descriptors through the
//! [`SceneCollector`] trait and writes lightmap references back onto
//! [`SceneObject`]s. [`DefaultSceneCollector`] partitions a scene into a
//! uniform chunk grid from object bounding boxes.
//!
//! Author: Moroya Sakamoto

use crate::types::{Aabb, ChunkCoord};
use glam::{Mat4, Quat, UVec2, Vec2, Vec3, Vec4};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

// ---------------------------------------------------------------------------
// Lights
// ---------------------------------------------------------------------------

/// Light source type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightType {
    /// Infinitely distant light with constant direction.
    Directional,
    /// Omnidirectional light with a range.
    Point,
    /// Cone light with a range.
    Spot,
}

/// How a light participates in baking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BakeMode {
    /// Fully baked: contributes to the direct and indirect terms.
    Baked,
    /// Real-time direct, baked indirect only.
    Mixed,
    /// Fully dynamic: never baked.
    Dynamic,
}

/// Light as placed in the scene.
#[derive(Debug, Clone)]
pub struct SceneLightSource {
    /// Light type.
    pub light_type: LightType,
    /// Bake participation mode.
    pub mode: BakeMode,
    /// Linear RGB color, premultiplied by intensity.
    pub color: Vec3,
    /// World position. Ignored for directional lights.
    pub position: Vec3,
    /// World direction, normalized by the snapshot.
    pub direction: Vec3,
    /// Influence radius for point and spot lights.
    pub range: f32,
    /// Full cone angle for spot lights, radians.
    pub spot_angle: f32,
}

/// Immutable per-vicinity snapshot of one light.
///
/// Captured in phase 2 so later phases never read the live scene.
#[derive(Debug, Clone)]
pub struct SceneLight {
    /// Light type.
    pub light_type: LightType,
    /// Linear RGB color.
    pub color: Vec3,
    /// World position.
    pub position: Vec3,
    /// Normalized world direction.
    pub direction: Vec3,
    /// Influence radius.
    pub range: f32,
    /// Cosine of the spot half-angle.
    pub spot_cutoff: f32,
    /// Whether the light contributes to the baked direct term.
    pub bake_direct: bool,
    /// Whether the light contributes to the baked indirect term.
    pub bake_indirect: bool,
}

impl SceneLight {
    /// Snapshot a scene light for baking.
    pub fn snapshot(source: &SceneLightSource) -> Self {
        Self {
            light_type: source.light_type,
            color: source.color,
            position: source.position,
            direction: source.direction.normalize_or_zero(),
            range: source.range,
            spot_cutoff: (source.spot_angle * 0.5).cos(),
            bake_direct: source.mode == BakeMode::Baked,
            bake_indirect: source.mode != BakeMode::Dynamic,
        }
    }
}

/// Irradiance probe placed in the scene, refreshed during indirect baking.
#[derive(Debug, Clone)]
pub struct LightProbe {
    /// World position.
    pub position: Vec3,
    /// Baked irradiance, linear RGB.
    pub irradiance: Vec3,
}

impl LightProbe {
    /// Create an unbaked probe.
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            irradiance: Vec3::ZERO,
        }
    }
}

// ---------------------------------------------------------------------------
// Objects
// ---------------------------------------------------------------------------

/// Static triangle mesh object participating in the bake.
///
/// `lightmap_uvs` is the object-local unwrap in `[0, 1]`; charting maps it
/// into the atlas via `lightmap_scale_offset`.
#[derive(Debug, Clone)]
pub struct SceneObject {
    /// Object name, used in warnings.
    pub name: String,
    /// Local-space vertex positions.
    pub positions: Vec<Vec3>,
    /// Local-space vertex normals.
    pub normals: Vec<Vec3>,
    /// Object-local lightmap UVs in `[0, 1]`.
    pub lightmap_uvs: Vec<Vec2>,
    /// Triangle indices.
    pub indices: Vec<u32>,
    /// World position.
    pub position: Vec3,
    /// World rotation.
    pub rotation: Quat,
    /// World scale.
    pub scale: Vec3,
    /// Authored lightmap size metadata, texels.
    pub lightmap_size_hint: UVec2,
    /// Texel density the size hint was authored at, texels per unit.
    pub lightmap_density_hint: f32,
    /// Assigned lightmap chart index, written by charting.
    pub lightmap_index: Option<u32>,
    /// Assigned UV transform `(sx, sy, ox, oy)`, written by charting.
    pub lightmap_scale_offset: Vec4,
}

impl SceneObject {
    /// Create an object at the origin with identity transform.
    pub fn new(
        name: impl Into<String>,
        positions: Vec<Vec3>,
        normals: Vec<Vec3>,
        lightmap_uvs: Vec<Vec2>,
        indices: Vec<u32>,
    ) -> Self {
        Self {
            name: name.into(),
            positions,
            normals,
            lightmap_uvs,
            indices,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            lightmap_size_hint: UVec2::new(32, 32),
            lightmap_density_hint: 10.0,
            lightmap_index: None,
            lightmap_scale_offset: Vec4::new(1.0, 1.0, 0.0, 0.0),
        }
    }

    /// Local-to-world matrix.
    pub fn world_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// World-space bounding box of all vertices.
    pub fn world_bounds(&self) -> Aabb {
        let matrix = self.world_matrix();
        let mut bounds = Aabb::empty();
        for &p in &self.positions {
            bounds.merge_point(matrix.transform_point3(p));
        }
        bounds
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// The whole bakeable scene: objects, lights and probes.
#[derive(Debug, Default)]
pub struct Scene {
    /// Static objects.
    pub objects: Vec<SceneObject>,
    /// Light sources.
    pub lights: Vec<SceneLightSource>,
    /// Irradiance probes.
    pub probes: Vec<LightProbe>,
}

/// Scene handle shared between the lightmapper and the collector.
pub type SharedScene = Arc<RwLock<Scene>>;

/// Wrap a scene into a shared handle.
pub fn shared_scene(scene: Scene) -> SharedScene {
    Arc::new(RwLock::new(scene))
}

// ---------------------------------------------------------------------------
// Collector
// ---------------------------------------------------------------------------

/// Contract the pipeline uses to query scene contents spatially.
///
/// Object and light handles are indices into the shared scene. A chunk
/// "uniquely owns" an object when the object's bounds center falls inside
/// it, so every object belongs to exactly one chunk.
pub trait SceneCollector {
    /// Lock the scene for baking and partition it into chunks of the given
    /// world-space edge length.
    fn lock_scene(&mut self, chunk_size: f32);
    /// All non-empty chunk coordinates.
    fn chunks(&self) -> Vec<ChunkCoord>;
    /// Objects uniquely owned by the chunk.
    fn unique_objects_in_chunk(&self, chunk: ChunkCoord) -> Vec<usize>;
    /// Objects whose bounds intersect the volume.
    fn objects_in_volume(&self, chunk: ChunkCoord, volume: &Aabb) -> Vec<usize>;
    /// Lights relevant to the volume. Directional lights are always relevant.
    fn lights_in_volume(&self, chunk: ChunkCoord, volume: &Aabb) -> Vec<usize>;
    /// World-space bounding box of the chunk cell.
    fn chunk_bounding_box(&self, chunk: ChunkCoord) -> Aabb;
}

/// Uniform-grid collector over a shared scene.
pub struct DefaultSceneCollector {
    scene: SharedScene,
    chunk_size: f32,
    owners: HashMap<ChunkCoord, Vec<usize>>,
}

impl DefaultSceneCollector {
    /// Create a collector over the shared scene.
    pub fn new(scene: SharedScene) -> Self {
        Self {
            scene,
            chunk_size: 0.0,
            owners: HashMap::new(),
        }
    }

    fn world_to_chunk(&self, pos: Vec3) -> ChunkCoord {
        let s = self.chunk_size;
        ChunkCoord {
            x: (pos.x / s).floor() as i32,
            y: (pos.y / s).floor() as i32,
            z: (pos.z / s).floor() as i32,
        }
    }
}

impl SceneCollector for DefaultSceneCollector {
    fn lock_scene(&mut self, chunk_size: f32) {
        self.chunk_size = chunk_size;
        self.owners.clear();

        let scene = self.scene.read().unwrap();
        for (index, object) in scene.objects.iter().enumerate() {
            let owner = self.world_to_chunk(object.world_bounds().center());
            self.owners.entry(owner).or_default().push(index);
        }
    }

    fn chunks(&self) -> Vec<ChunkCoord> {
        self.owners.keys().copied().collect()
    }

    fn unique_objects_in_chunk(&self, chunk: ChunkCoord) -> Vec<usize> {
        self.owners.get(&chunk).cloned().unwrap_or_default()
    }

    fn objects_in_volume(&self, _chunk: ChunkCoord, volume: &Aabb) -> Vec<usize> {
        let scene = self.scene.read().unwrap();
        scene
            .objects
            .iter()
            .enumerate()
            .filter(|(_, object)| object.world_bounds().intersects(volume))
            .map(|(index, _)| index)
            .collect()
    }

    fn lights_in_volume(&self, _chunk: ChunkCoord, volume: &Aabb) -> Vec<usize> {
        let scene = self.scene.read().unwrap();
        scene
            .lights
            .iter()
            .enumerate()
            .filter(|(_, light)| match light.light_type {
                LightType::Directional => true,
                LightType::Point | LightType::Spot => {
                    volume.intersects_sphere(light.position, light.range)
                }
            })
            .map(|(index, _)| index)
            .collect()
    }

    fn chunk_bounding_box(&self, chunk: ChunkCoord) -> Aabb {
        let s = self.chunk_size;
        let min = Vec3::new(
            chunk.x as f32 * s,
            chunk.y as f32 * s,
            chunk.z as f32 * s,
        );
        Aabb::new(min, min + Vec3::splat(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_quad(center: Vec3) -> SceneObject {
        let mut object = SceneObject::new(
            "quad",
            vec![
                Vec3::new(-0.5, 0.0, -0.5),
                Vec3::new(0.5, 0.0, -0.5),
                Vec3::new(0.5, 0.0, 0.5),
                Vec3::new(-0.5, 0.0, 0.5),
            ],
            vec![Vec3::Y; 4],
            vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(1.0, 0.0),
                Vec2::new(1.0, 1.0),
                Vec2::new(0.0, 1.0),
            ],
            vec![0, 1, 2, 0, 2, 3],
        );
        object.position = center;
        object
    }

    #[test]
    fn collector_assigns_unique_owner() {
        let mut scene = Scene::default();
        scene.objects.push(flat_quad(Vec3::new(1.0, 1.0, 1.0)));
        scene.objects.push(flat_quad(Vec3::new(17.0, 1.0, 1.0)));

        let mut collector = DefaultSceneCollector::new(shared_scene(scene));
        collector.lock_scene(8.0);

        let chunks = collector.chunks();
        assert_eq!(chunks.len(), 2);

        let total: usize = chunks
            .iter()
            .map(|&c| collector.unique_objects_in_chunk(c).len())
            .sum();
        assert_eq!(total, 2, "Each object is owned by exactly one chunk");
    }

    #[test]
    fn directional_light_always_relevant() {
        let mut scene = Scene::default();
        scene.objects.push(flat_quad(Vec3::ZERO));
        scene.lights.push(SceneLightSource {
            light_type: LightType::Directional,
            mode: BakeMode::Baked,
            color: Vec3::ONE,
            position: Vec3::new(1000.0, 1000.0, 1000.0),
            direction: Vec3::NEG_Y,
            range: 0.0,
            spot_angle: 0.0,
        });
        scene.lights.push(SceneLightSource {
            light_type: LightType::Point,
            mode: BakeMode::Baked,
            color: Vec3::ONE,
            position: Vec3::new(1000.0, 0.0, 0.0),
            range: 5.0,
            direction: Vec3::NEG_Y,
            spot_angle: 0.0,
        });

        let mut collector = DefaultSceneCollector::new(shared_scene(scene));
        collector.lock_scene(8.0);

        let chunk = collector.chunks()[0];
        let volume = collector.chunk_bounding_box(chunk);
        let lights = collector.lights_in_volume(chunk, &volume);
        assert_eq!(lights, vec![0], "Distant point light must be culled");
    }

    #[test]
    fn light_snapshot_derives_bake_flags() {
        let source = SceneLightSource {
            light_type: LightType::Directional,
            mode: BakeMode::Mixed,
            color: Vec3::ONE,
            position: Vec3::ZERO,
            direction: Vec3::new(0.0, -2.0, 0.0),
            range: 0.0,
            spot_angle: 0.0,
        };
        let light = SceneLight::snapshot(&source);
        assert!(!light.bake_direct);
        assert!(light.bake_indirect);
        assert!((light.direction.length() - 1.0).abs() < 1e-6);
    }
}
