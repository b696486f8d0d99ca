//! Lightmap geometry buffers
//!
//! Rasterizes charted objects into per-texel surface data (world position,
//! smooth normal, geometry id) used by the direct and indirect bakers, and
//! records UV seams for the stitcher: mesh edges adjacent in 3D whose
//! texels are disjoint in atlas space.
//!
//! Author: Moroya Sakamoto

use crate::chart::{Chart, ChartRegion};
use crate::scene::{Scene, SceneObject};
use glam::{IVec2, Vec2, Vec3};
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Seams
// ---------------------------------------------------------------------------

/// One seam edge: the same 3D edge mapped to two disjoint UV segments.
///
/// Positions are in texel space of the owning lightmap. Endpoint `i` of
/// `positions` corresponds to endpoint `i` of `other_positions`.
#[derive(Debug, Clone, Copy)]
pub struct LightmapSeam {
    /// Texel-space endpoints of the first UV segment.
    pub positions: [Vec2; 2],
    /// Texel-space endpoints of the second UV segment.
    pub other_positions: [Vec2; 2],
}

// ---------------------------------------------------------------------------
// GeometryBuffer
// ---------------------------------------------------------------------------

/// Rasterized surface data for one lightmap, at texel granularity.
///
/// `geometry_ids` is zero for uncovered texels and `object index + 1` for
/// covered ones.
#[derive(Debug, Clone)]
pub struct GeometryBuffer {
    /// Lightmap chart index this buffer belongs to.
    pub lightmap_index: u32,
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// World-space positions per texel.
    pub positions: Vec<Vec3>,
    /// Smooth world-space normals per texel.
    pub smooth_normals: Vec<Vec3>,
    /// Geometry ids per texel, 0 = empty.
    pub geometry_ids: Vec<u32>,
    /// Seams recorded during rasterization.
    pub seams: Vec<LightmapSeam>,
}

impl GeometryBuffer {
    /// Create a zeroed buffer.
    pub fn new(lightmap_index: u32, size: u32) -> Self {
        let texels = (size * size) as usize;
        Self {
            lightmap_index,
            width: size,
            height: size,
            positions: vec![Vec3::ZERO; texels],
            smooth_normals: vec![Vec3::ZERO; texels],
            geometry_ids: vec![0; texels],
            seams: Vec::new(),
        }
    }

    /// Convert a flat index to a texel location.
    #[inline]
    pub fn index_to_location(&self, index: usize) -> IVec2 {
        IVec2::new(
            (index as u32 % self.width) as i32,
            (index as u32 / self.width) as i32,
        )
    }

    /// Whether the location is inside the buffer.
    #[inline]
    pub fn is_valid_location(&self, location: IVec2) -> bool {
        location.x >= 0
            && location.x < self.width as i32
            && location.y >= 0
            && location.y < self.height as i32
    }

    /// Convert a texel location to a flat index.
    #[inline]
    pub fn location_to_index(&self, location: IVec2) -> usize {
        location.x as usize + self.width as usize * location.y as usize
    }

    /// Number of covered texels.
    pub fn covered_texels(&self) -> usize {
        self.geometry_ids.iter().filter(|&&id| id != 0).count()
    }
}

// ---------------------------------------------------------------------------
// Rasterization
// ---------------------------------------------------------------------------

/// Bake geometry buffers for every chart, one buffer per lightmap index.
pub fn bake_geometry_buffers(scene: &Scene, charts: &[Chart]) -> Vec<GeometryBuffer> {
    charts
        .iter()
        .map(|chart| {
            let mut buffer = GeometryBuffer::new(chart.index, chart.size);
            for element in &chart.elements {
                let object = &scene.objects[element.object];
                rasterize_object(&mut buffer, object, element.object, &element.region);
                collect_seams(&mut buffer, object, &element.region);
            }
            buffer
        })
        .collect()
}

/// Map an object-local lightmap UV into texel space of its region.
#[inline]
fn uv_to_texels(uv: Vec2, region: &ChartRegion) -> Vec2 {
    region.position.as_vec2() + uv * region.size.as_vec2()
}

/// Rasterize one object's triangles into its allocated region.
fn rasterize_object(
    buffer: &mut GeometryBuffer,
    object: &SceneObject,
    object_index: usize,
    region: &ChartRegion,
) {
    let matrix = object.world_matrix();
    let geometry_id = object_index as u32 + 1;

    for triangle in 0..object.triangle_count() {
        let i0 = object.indices[triangle * 3] as usize;
        let i1 = object.indices[triangle * 3 + 1] as usize;
        let i2 = object.indices[triangle * 3 + 2] as usize;

        let t0 = uv_to_texels(object.lightmap_uvs[i0], region);
        let t1 = uv_to_texels(object.lightmap_uvs[i1], region);
        let t2 = uv_to_texels(object.lightmap_uvs[i2], region);

        let denom = (t1 - t0).perp_dot(t2 - t0);
        if denom.abs() < 1e-8 {
            continue;
        }
        let inv_denom = 1.0 / denom;

        let p0 = matrix.transform_point3(object.positions[i0]);
        let p1 = matrix.transform_point3(object.positions[i1]);
        let p2 = matrix.transform_point3(object.positions[i2]);

        let n0 = object.rotation * object.normals[i0];
        let n1 = object.rotation * object.normals[i1];
        let n2 = object.rotation * object.normals[i2];

        let min = t0.min(t1).min(t2).floor().max(Vec2::ZERO);
        let max = t0
            .max(t1)
            .max(t2)
            .ceil()
            .min(Vec2::new(buffer.width as f32, buffer.height as f32));

        for y in min.y as u32..max.y as u32 {
            for x in min.x as u32..max.x as u32 {
                let center = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let w1 = (center - t0).perp_dot(t2 - t0) * inv_denom;
                let w2 = (t1 - t0).perp_dot(center - t0) * inv_denom;
                let w0 = 1.0 - w1 - w2;

                const TOLERANCE: f32 = -1e-4;
                if w0 < TOLERANCE || w1 < TOLERANCE || w2 < TOLERANCE {
                    continue;
                }

                let index = buffer.location_to_index(IVec2::new(x as i32, y as i32));
                buffer.positions[index] = p0 * w0 + p1 * w1 + p2 * w2;
                buffer.smooth_normals[index] =
                    (n0 * w0 + n1 * w1 + n2 * w2).normalize_or_zero();
                buffer.geometry_ids[index] = geometry_id;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Seam detection
// ---------------------------------------------------------------------------

/// Quantized world-space point, tolerant key for positional edge matching.
#[derive(PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord)]
struct PointKey(i64, i64, i64);

impl PointKey {
    fn quantize(p: Vec3) -> Self {
        const SCALE: f32 = 1024.0;
        Self(
            (p.x * SCALE).round() as i64,
            (p.y * SCALE).round() as i64,
            (p.z * SCALE).round() as i64,
        )
    }
}

/// Record seams: edges shared by position but split in lightmap UV space.
fn collect_seams(buffer: &mut GeometryBuffer, object: &SceneObject, region: &ChartRegion) {
    let matrix = object.world_matrix();
    let mut edges: HashMap<(PointKey, PointKey), [Vec2; 2]> = HashMap::new();

    for triangle in 0..object.triangle_count() {
        for edge in 0..3 {
            let a = object.indices[triangle * 3 + edge] as usize;
            let b = object.indices[triangle * 3 + (edge + 1) % 3] as usize;

            let mut key_a = PointKey::quantize(matrix.transform_point3(object.positions[a]));
            let mut key_b = PointKey::quantize(matrix.transform_point3(object.positions[b]));
            let mut uv_a = uv_to_texels(object.lightmap_uvs[a], region);
            let mut uv_b = uv_to_texels(object.lightmap_uvs[b], region);

            // Normalize endpoint order so both sides of the edge align.
            if key_b < key_a {
                std::mem::swap(&mut key_a, &mut key_b);
                std::mem::swap(&mut uv_a, &mut uv_b);
            }

            match edges.get(&(key_a, key_b)) {
                None => {
                    edges.insert((key_a, key_b), [uv_a, uv_b]);
                }
                Some(&other) => {
                    const SPLIT_THRESHOLD: f32 = 0.5; // texels
                    let split = other[0].distance(uv_a) > SPLIT_THRESHOLD
                        || other[1].distance(uv_b) > SPLIT_THRESHOLD;
                    if split {
                        buffer.seams.push(LightmapSeam {
                            positions: other,
                            other_positions: [uv_a, uv_b],
                        });
                    }
                }
            }
        }
    }
}
