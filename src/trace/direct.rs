//! Direct light baking
//!
//! Accumulates single-bounce lighting per texel: a Lambert term per light,
//! gated by one shadow ray from the surface to the light. Lights add into
//! the buffer, so a lightmap touched by several chunks keeps earlier
//! contributions.
//!
//! Author: Moroya Sakamoto

use crate::geometry::GeometryBuffer;
use crate::scene::{LightType, SceneLight};
use crate::settings::TracingSettings;
use crate::trace::{parallel_stripes, BakedDirect};
use crate::vicinity::ChunkVicinity;
use glam::Vec3;

/// Incoming radiance of `light` at a surface point, zero when shadowed or
/// out of range.
pub(crate) fn sample_light(
    light: &SceneLight,
    vicinity: &ChunkVicinity,
    position: Vec3,
    normal: Vec3,
) -> Vec3 {
    let (direction, shadow_distance, attenuation) = match light.light_type {
        LightType::Directional => (
            -light.direction,
            vicinity.raytracer.max_distance(),
            1.0,
        ),
        LightType::Point | LightType::Spot => {
            let delta = light.position - position;
            let distance = delta.length();
            if distance >= light.range || distance <= 0.0 {
                return Vec3::ZERO;
            }
            let direction = delta / distance;
            if light.light_type == LightType::Spot
                && (-direction).dot(light.direction) < light.spot_cutoff
            {
                return Vec3::ZERO;
            }
            let falloff = 1.0 - distance / light.range;
            (direction, distance, falloff * falloff)
        }
    };

    let lambert = normal.dot(direction).max(0.0);
    if lambert <= 0.0 || attenuation <= 0.0 {
        return Vec3::ZERO;
    }
    if vicinity.raytracer.occluded(position, direction, shadow_distance) {
        return Vec3::ZERO;
    }
    light.color * (lambert * attenuation)
}

/// Bake all direct-capable vicinity lights into `direct`.
pub fn bake_direct_light(
    direct: &mut BakedDirect,
    geometry: &GeometryBuffer,
    vicinity: &ChunkVicinity,
    settings: &TracingSettings,
) {
    let lights: Vec<&SceneLight> = vicinity
        .lights
        .iter()
        .filter(|light| light.bake_direct)
        .collect();
    if lights.is_empty() {
        return;
    }

    parallel_stripes(&mut direct.light, settings.num_tasks, |stripe, first| {
        for (offset, texel) in stripe.iter_mut().enumerate() {
            let index = first + offset;
            if geometry.geometry_ids[index] == 0 {
                continue;
            }

            let normal = geometry.smooth_normals[index];
            let position = geometry.positions[index] + normal * settings.ray_position_offset;
            for light in &lights {
                *texel += sample_light(light, vicinity, position, normal);
            }
        }
    });
}
