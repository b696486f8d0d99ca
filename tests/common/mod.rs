//! Shared helpers for integration tests
//!
//! Author: Moroya Sakamoto
#![allow(dead_code)]

use ember_bake::prelude::*;
use glam::{Vec2, Vec3};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};

/// Unique temp directory for lightmap output.
pub fn temp_output_dir(tag: &str) -> PathBuf {
    static COUNTER: AtomicU32 = AtomicU32::new(0);
    let unique = COUNTER.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!(
        "ember_bake_test_{}_{}_{}",
        tag,
        std::process::id(),
        unique
    ))
}

/// Horizontal quad of the given edge length, facing up, centered at
/// `position`, with a full 0..1 lightmap unwrap.
pub fn quad_object(position: Vec3, size: f32) -> SceneObject {
    let h = size * 0.5;
    let mut object = SceneObject::new(
        "quad",
        vec![
            Vec3::new(-h, 0.0, -h),
            Vec3::new(h, 0.0, -h),
            Vec3::new(h, 0.0, h),
            Vec3::new(-h, 0.0, h),
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
    object.position = position;
    object
}

/// White downward directional light in fully baked mode.
pub fn white_sun() -> SceneLightSource {
    SceneLightSource {
        light_type: LightType::Directional,
        mode: BakeMode::Baked,
        color: Vec3::ONE,
        position: Vec3::ZERO,
        direction: Vec3::NEG_Y,
        range: 0.0,
        spot_angle: 0.0,
    }
}

/// Small, fast settings: tiny charts, direct light only, no filtering or
/// stitching. Covered texels under a white sun come out exactly white.
pub fn direct_only_settings(tag: &str) -> BakeSettings {
    let mut settings = BakeSettings::default();
    settings.charting.chart_size = 32;
    settings.charting.max_region_size = 30;
    settings.tracing.num_indirect_samples = 0;
    settings.tracing.num_tasks = 2;
    settings.filter.kernel_radius = 0;
    settings.stitching.num_iterations = 0;
    settings.incremental.chunk_size = 8.0;
    settings.incremental.scene_padding = 4.0;
    settings.incremental.output_directory = temp_output_dir(tag);
    settings
}

/// Atlas texel at the center of the object's charted region.
pub fn region_center_texel(object: &SceneObject, chart_size: u32) -> (u32, u32) {
    let so = object.lightmap_scale_offset;
    let u = 0.5 * so.x + so.z;
    let v = 0.5 * so.y + so.w;
    (
        (u * chart_size as f32) as u32,
        (v * chart_size as f32) as u32,
    )
}
