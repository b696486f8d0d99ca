//! Edge-aware lightmap denoising
//!
//! Cross-bilateral Gauss filter over the indirect buffer. The kernel is
//! damped by luminance, world-position and normal differences taken from
//! the geometry buffer, so noise is smoothed without bleeding light across
//! geometric edges. Uncovered texels never contribute.
//!
//! Author: Moroya Sakamoto

use crate::geometry::GeometryBuffer;
use crate::settings::FilterSettings;
use crate::trace::{parallel_stripes, BakedIndirect};
use glam::{IVec2, Vec3, Vec4};

// ---------------------------------------------------------------------------
// Kernel
// ---------------------------------------------------------------------------

/// One-sided Gauss kernel of the given radius, up to 5.
fn gauss_kernel(radius: u32) -> &'static [f32] {
    const K0: [f32; 1] = [1.0];
    const K1: [f32; 2] = [0.684538, 0.157731];
    const K2: [f32; 3] = [0.38774, 0.24477, 0.06136];
    const K3: [f32; 4] = [0.266346, 0.215007, 0.113085, 0.038735];
    const K4: [f32; 5] = [0.20236, 0.179044, 0.124009, 0.067234, 0.028532];
    const K5: [f32; 6] = [0.163053, 0.150677, 0.118904, 0.080127, 0.046108, 0.022657];

    match radius {
        0 => &K0,
        1 => &K1,
        2 => &K2,
        3 => &K3,
        4 => &K4,
        _ => &K5,
    }
}

/// Rec. 601 luminance.
#[inline]
fn luminance(color: Vec4) -> f32 {
    color.x * 0.299 + color.y * 0.587 + color.z * 0.114
}

/// Edge-stopping weight between the kernel center and one neighbour.
fn edge_weight(
    luminance1: f32,
    luminance2: f32,
    luminance_sigma: f32,
    position1: Vec3,
    position2: Vec3,
    position_sigma: f32,
    normal1: Vec3,
    normal2: Vec3,
    normal_power: f32,
) -> f32 {
    let color_weight = (luminance1 - luminance2).abs() / luminance_sigma;
    let position_weight = if position_sigma > f32::EPSILON {
        position1.distance_squared(position2) / position_sigma
    } else {
        0.0
    };
    let normal_weight = normal1.dot(normal2).max(0.0).powf(normal_power);
    (-color_weight - position_weight).exp() * normal_weight
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

/// Run one filter pass over `indirect` and swap its buffers.
fn filter_pass(indirect: &mut BakedIndirect, geometry: &GeometryBuffer, settings: &FilterSettings, num_tasks: u32) {
    let kernel = gauss_kernel(settings.kernel_radius);
    let radius = kernel.len() as i32 - 1;
    let light = &indirect.light;

    parallel_stripes(&mut indirect.light_swap, num_tasks, |stripe, first| {
        for (offset, out) in stripe.iter_mut().enumerate() {
            let index = first + offset;
            if geometry.geometry_ids[index] == 0 {
                *out = light[index];
                continue;
            }

            let center_location = geometry.index_to_location(index);
            let center_color = light[index];
            let center_luminance = luminance(center_color);
            let center_position = geometry.positions[index];
            let center_normal = geometry.smooth_normals[index];

            let mut color_weight = kernel[0] * kernel[0];
            let mut color_sum = center_color * color_weight;
            for dy in -radius..=radius {
                for dx in -radius..=radius {
                    if dx == 0 && dy == 0 {
                        continue;
                    }

                    let other_location = center_location + IVec2::new(dx, dy);
                    if !geometry.is_valid_location(other_location) {
                        continue;
                    }
                    let other_index = geometry.location_to_index(other_location);
                    if geometry.geometry_ids[other_index] == 0 {
                        continue;
                    }

                    let dxdy = IVec2::new(dx, dy).as_vec2().length();
                    let kernel_weight =
                        kernel[dx.unsigned_abs() as usize] * kernel[dy.unsigned_abs() as usize];

                    let other_color = light[other_index];
                    let weight = edge_weight(
                        center_luminance,
                        luminance(other_color),
                        settings.color_sigma,
                        center_position,
                        geometry.positions[other_index],
                        dxdy * settings.position_sigma,
                        center_normal,
                        geometry.smooth_normals[other_index],
                        settings.normal_power,
                    );

                    color_sum += other_color * weight * kernel_weight;
                    color_weight += weight * kernel_weight;
                }
            }

            *out = color_sum / color_weight.max(f32::EPSILON);
        }
    });

    std::mem::swap(&mut indirect.light, &mut indirect.light_swap);
}

/// Denoise the normalized indirect buffer in place.
pub fn filter_indirect_light(
    indirect: &mut BakedIndirect,
    geometry: &GeometryBuffer,
    settings: &FilterSettings,
    num_tasks: u32,
) {
    if settings.kernel_radius == 0 || settings.num_iterations == 0 {
        return;
    }
    for _ in 0..settings.num_iterations {
        filter_pass(indirect, geometry, settings, num_tasks);
    }
}
