//! Indirect light baking
//!
//! Monte-Carlo gathering of bounced light. Rays leave the surface on a
//! cosine-weighted hemisphere and collect previously baked direct light at
//! every bounce, so indirect quality depends only on the direct pass that
//! already ran for the whole vicinity.
//!
//! Lights baked in mixed mode keep their direct term out of the lightmap;
//! their bounce contribution is evaluated analytically at each hit instead
//! of being read back from the direct buffers.
//!
//! Author: Moroya Sakamoto

use crate::geometry::GeometryBuffer;
use crate::scene::SceneLight;
use crate::settings::TracingSettings;
use crate::trace::direct::sample_light;
use crate::trace::{
    parallel_stripes, random_hemisphere_direction, BakedDirect, BakedIndirect, TexelRng,
};
use crate::vicinity::ChunkVicinity;
use glam::{Vec3, Vec4};
use std::collections::HashMap;
use std::sync::Arc;

/// Direct light buffers of every lightmap reachable from the vicinity,
/// keyed by lightmap index.
pub type DirectLightMaps = HashMap<u32, Arc<BakedDirect>>;

/// Radiance collected by one gather ray.
fn trace_gather_ray(
    origin: Vec3,
    direction: Vec3,
    vicinity: &ChunkVicinity,
    direct_maps: &DirectLightMaps,
    mixed_lights: &[&SceneLight],
    settings: &TracingSettings,
    rng: &mut TexelRng,
) -> Vec3 {
    let mut radiance = Vec3::ZERO;
    let mut origin = origin;
    let mut direction = direction;

    let bounces = settings.num_bounces.min(TracingSettings::MAX_BOUNCES);
    for _ in 0..bounces {
        let Some(hit) =
            vicinity
                .raytracer
                .intersect(origin, direction, vicinity.raytracer.max_distance())
        else {
            break;
        };

        if let Some(direct) = direct_maps.get(&hit.lightmap_index) {
            radiance += direct.sample_nearest(hit.lightmap_uv);
        }
        for light in mixed_lights {
            let lambert_position = hit.position + hit.normal * settings.ray_position_offset;
            radiance += sample_light(light, vicinity, lambert_position, hit.normal);
        }

        origin = hit.position + hit.normal * settings.ray_position_offset;
        direction = random_hemisphere_direction(hit.normal, rng);
    }
    radiance
}

/// Accumulate indirect light for every covered texel of `geometry`.
pub fn bake_indirect_light(
    indirect: &mut BakedIndirect,
    geometry: &GeometryBuffer,
    vicinity: &ChunkVicinity,
    direct_maps: &DirectLightMaps,
    settings: &TracingSettings,
) {
    if settings.num_indirect_samples == 0 {
        return;
    }
    let mixed_lights: Vec<&SceneLight> = vicinity
        .lights
        .iter()
        .filter(|light| light.bake_indirect && !light.bake_direct)
        .collect();

    parallel_stripes(&mut indirect.light, settings.num_tasks, |stripe, first| {
        for (offset, texel) in stripe.iter_mut().enumerate() {
            let index = first + offset;
            if geometry.geometry_ids[index] == 0 {
                continue;
            }

            let normal = geometry.smooth_normals[index];
            let origin = geometry.positions[index] + normal * settings.ray_position_offset;
            let mut rng = TexelRng::new(index as u64);

            let mut gathered = Vec3::ZERO;
            for _ in 0..settings.num_indirect_samples {
                let direction = random_hemisphere_direction(normal, &mut rng);
                gathered += trace_gather_ray(
                    origin,
                    direction,
                    vicinity,
                    direct_maps,
                    &mixed_lights,
                    settings,
                    &mut rng,
                );
            }
            *texel += Vec4::new(gathered.x, gathered.y, gathered.z, 0.0)
                + Vec4::new(0.0, 0.0, 0.0, settings.num_indirect_samples as f32);
        }
    });
}

/// Bake the irradiance of a single probe position by uniform gathering
/// over the sphere.
pub fn bake_probe_irradiance(
    position: Vec3,
    vicinity: &ChunkVicinity,
    direct_maps: &DirectLightMaps,
    settings: &TracingSettings,
) -> Vec3 {
    let samples = settings.num_indirect_samples.max(1) as usize;
    let mixed_lights: Vec<&SceneLight> = vicinity
        .lights
        .iter()
        .filter(|light| light.bake_indirect && !light.bake_direct)
        .collect();

    let mut rng = TexelRng::new(0x70b5);
    let mut gathered = Vec3::ZERO;
    for sample in 0..samples {
        let direction = fibonacci_sphere_direction(sample, samples);
        gathered += trace_gather_ray(
            position,
            direction,
            vicinity,
            direct_maps,
            &mixed_lights,
            settings,
            &mut rng,
        );
    }
    gathered / samples as f32
}

/// Direction `i` of `n` evenly distributed over the unit sphere.
fn fibonacci_sphere_direction(i: usize, n: usize) -> Vec3 {
    const GOLDEN_ANGLE: f32 = 2.399_963_2;
    let z = 1.0 - 2.0 * (i as f32 + 0.5) / n as f32;
    let radius = (1.0 - z * z).max(0.0).sqrt();
    let theta = GOLDEN_ANGLE * i as f32;
    Vec3::new(radius * theta.cos(), radius * theta.sin(), z)
}
