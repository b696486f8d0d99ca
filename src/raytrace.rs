//! Ray tracing scene for lightmap baking
//!
//! Collects world-space triangles from a set of scene objects and answers
//! the two queries the bakers need: closest hit and binary occlusion.
//! Hits carry lightmap index and atlas UV so the indirect baker can sample
//! previously baked direct light at the hit point.
//!
//! Author: Moroya Sakamoto

use crate::scene::{Scene, SceneObject};
use glam::{Vec2, Vec3};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Per-object description exposed by the raytracer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RaytracerGeometry {
    /// Index of the object within the owning scene.
    pub object_index: usize,
    /// Lightmap the object is charted into.
    pub lightmap_index: u32,
}

/// Closest-hit query result.
#[derive(Debug, Clone, Copy)]
pub struct RayHit {
    /// Distance along the ray.
    pub distance: f32,
    /// World-space hit position.
    pub position: Vec3,
    /// Geometric normal of the hit triangle, facing the ray origin.
    pub normal: Vec3,
    /// Lightmap of the hit object.
    pub lightmap_index: u32,
    /// Atlas lightmap UV at the hit point, in [0, 1].
    pub lightmap_uv: Vec2,
}

#[derive(Debug, Clone)]
struct Triangle {
    positions: [Vec3; 3],
    lightmap_uvs: [Vec2; 3],
    geometry: u32,
}

/// Immutable triangle soup built from a set of scene objects.
///
/// Lightmap UVs are stored in atlas space, already remapped through each
/// object's `lightmap_scale_offset`.
#[derive(Debug, Clone, Default)]
pub struct RaytracerScene {
    triangles: Vec<Triangle>,
    geometries: Vec<RaytracerGeometry>,
    max_distance: f32,
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

impl RaytracerScene {
    /// Build a raytracer scene from the given objects.
    ///
    /// Objects without a lightmap reference are still included as occluders
    /// under lightmap index 0 with zero UVs.
    pub fn build(scene: &Scene, object_indices: &[usize]) -> Self {
        let mut triangles = Vec::new();
        let mut geometries = Vec::new();
        let mut bounds = crate::types::Aabb::empty();

        for &object_index in object_indices {
            let object = &scene.objects[object_index];
            let geometry = geometries.len() as u32;
            geometries.push(RaytracerGeometry {
                object_index,
                lightmap_index: object.lightmap_index.unwrap_or(0),
            });
            Self::append_object(&mut triangles, &mut bounds, object, geometry);
        }

        let max_distance = if triangles.is_empty() {
            1.0
        } else {
            bounds.size().length().max(1.0)
        };

        Self {
            triangles,
            geometries,
            max_distance,
        }
    }

    fn append_object(
        triangles: &mut Vec<Triangle>,
        bounds: &mut crate::types::Aabb,
        object: &SceneObject,
        geometry: u32,
    ) {
        let matrix = object.world_matrix();
        let scale_offset = object.lightmap_scale_offset;

        for triangle in 0..object.triangle_count() {
            let mut positions = [Vec3::ZERO; 3];
            let mut lightmap_uvs = [Vec2::ZERO; 3];
            for corner in 0..3 {
                let index = object.indices[triangle * 3 + corner] as usize;
                positions[corner] = matrix.transform_point3(object.positions[index]);
                bounds.merge_point(positions[corner]);

                let uv = object.lightmap_uvs[index];
                lightmap_uvs[corner] = Vec2::new(
                    uv.x * scale_offset.x + scale_offset.z,
                    uv.y * scale_offset.y + scale_offset.w,
                );
            }
            triangles.push(Triangle {
                positions,
                lightmap_uvs,
                geometry,
            });
        }
    }

    /// Objects visible to rays, in geometry order.
    pub fn geometries(&self) -> &[RaytracerGeometry] {
        &self.geometries
    }

    /// Safe upper bound for ray length within this scene.
    pub fn max_distance(&self) -> f32 {
        self.max_distance
    }

    /// Number of triangles in the scene.
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Möller–Trumbore intersection. Returns (distance, u, v) on hit.
#[inline]
fn intersect_triangle(
    origin: Vec3,
    direction: Vec3,
    triangle: &Triangle,
    max_distance: f32,
) -> Option<(f32, f32, f32)> {
    const EPSILON: f32 = 1e-7;

    let edge1 = triangle.positions[1] - triangle.positions[0];
    let edge2 = triangle.positions[2] - triangle.positions[0];
    let h = direction.cross(edge2);
    let det = edge1.dot(h);
    if det.abs() < EPSILON {
        return None;
    }

    let inv_det = 1.0 / det;
    let s = origin - triangle.positions[0];
    let u = s.dot(h) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = direction.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let distance = edge2.dot(q) * inv_det;
    if distance <= EPSILON || distance > max_distance {
        return None;
    }
    Some((distance, u, v))
}

impl RaytracerScene {
    /// Closest hit along the ray, if any, within `max_distance`.
    pub fn intersect(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
        let mut best: Option<(f32, f32, f32, &Triangle)> = None;
        for triangle in &self.triangles {
            if let Some((distance, u, v)) =
                intersect_triangle(origin, direction, triangle, max_distance)
            {
                if best.map_or(true, |(d, ..)| distance < d) {
                    best = Some((distance, u, v, triangle));
                }
            }
        }

        best.map(|(distance, u, v, triangle)| {
            let w = 1.0 - u - v;
            let edge1 = triangle.positions[1] - triangle.positions[0];
            let edge2 = triangle.positions[2] - triangle.positions[0];
            let mut normal = edge1.cross(edge2).normalize_or_zero();
            if normal.dot(direction) > 0.0 {
                normal = -normal;
            }

            let geometry = self.geometries[triangle.geometry as usize];
            RayHit {
                distance,
                position: origin + direction * distance,
                normal,
                lightmap_index: geometry.lightmap_index,
                lightmap_uv: triangle.lightmap_uvs[0] * w
                    + triangle.lightmap_uvs[1] * u
                    + triangle.lightmap_uvs[2] * v,
            }
        })
    }

    /// Whether anything blocks the ray within `max_distance`.
    pub fn occluded(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> bool {
        self.triangles
            .iter()
            .any(|triangle| intersect_triangle(origin, direction, triangle, max_distance).is_some())
    }
}
