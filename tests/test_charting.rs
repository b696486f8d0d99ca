//! Charting phase tests
//!
//! Author: Moroya Sakamoto

mod common;

use common::*;
use ember_bake::prelude::*;
use ember_bake::types::TexRect;
use glam::{UVec2, Vec3};

fn run_charting(scene: SharedScene, settings: BakeSettings) -> IncrementalLightmapper<DefaultSceneCollector, MemoryLightCache> {
    let collector = DefaultSceneCollector::new(scene.clone());
    let mut lightmapper =
        IncrementalLightmapper::initialize(settings, scene, collector, MemoryLightCache::new())
            .unwrap();
    while lightmapper.step_charting() == StepResult::Pending {}
    lightmapper
}

#[test]
fn every_object_receives_a_lightmap_reference() {
    let mut raw = Scene::default();
    for i in 0..5 {
        let mut object = quad_object(Vec3::new(i as f32 * 3.0, 0.0, 2.0), 1.0);
        object.lightmap_size_hint = UVec2::new(8, 8);
        raw.objects.push(object);
    }
    let scene = shared_scene(raw);

    let lightmapper = run_charting(scene.clone(), direct_only_settings("refs"));
    assert!(lightmapper.num_charts() > 0);

    let scene = scene.read().unwrap();
    for object in &scene.objects {
        let so = object.lightmap_scale_offset;
        assert!(object.lightmap_index.is_some());
        assert!(so.x > 0.0 && so.x <= 1.0);
        assert!(so.y > 0.0 && so.y <= 1.0);
        assert!(so.z >= 0.0 && so.z + so.x <= 1.0);
        assert!(so.w >= 0.0 && so.w + so.y <= 1.0);
    }
}

#[test]
fn padded_regions_within_a_chart_never_overlap() {
    let mut raw = Scene::default();
    // All in one chunk; small hints so several share one chart.
    for i in 0..6 {
        let mut object = quad_object(Vec3::new(2.0 + 0.2 * i as f32, 0.0, 2.0), 0.5);
        object.lightmap_size_hint = UVec2::new(6 + i, 9 - i);
        raw.objects.push(object);
    }
    let scene = shared_scene(raw);

    let settings = direct_only_settings("overlap");
    let chart_size = settings.charting.chart_size;
    let lightmapper = run_charting(scene.clone(), settings);

    let scene = scene.read().unwrap();
    let mut rects: Vec<(u32, TexRect)> = Vec::new();
    for object in &scene.objects {
        let so = object.lightmap_scale_offset;
        let rect = TexRect {
            x: (so.z * chart_size as f32).round() as u32,
            y: (so.w * chart_size as f32).round() as u32,
            width: (so.x * chart_size as f32).round() as u32,
            height: (so.y * chart_size as f32).round() as u32,
        };
        rects.push((object.lightmap_index.unwrap(), rect));
    }
    drop(scene);
    assert!(lightmapper.num_charts() >= 1);

    for (i, (chart_a, a)) in rects.iter().enumerate() {
        for (chart_b, b) in rects.iter().skip(i + 1) {
            if chart_a == chart_b {
                assert!(!a.overlaps(b), "Regions {a:?} and {b:?} overlap");
            }
        }
    }
}

#[test]
fn oversized_hint_is_downscaled_to_fit() {
    let mut raw = Scene::default();
    let mut object = quad_object(Vec3::new(2.0, 0.0, 2.0), 1.0);
    // Wildly larger than a 32-texel chart, with a 2:1 aspect.
    object.lightmap_size_hint = UVec2::new(4096, 2048);
    raw.objects.push(object);
    let scene = shared_scene(raw);

    let settings = direct_only_settings("oversized");
    let chart_size = settings.charting.chart_size as f32;
    let max_region = settings.charting.max_region_size as f32;
    run_charting(scene.clone(), settings);

    let scene = scene.read().unwrap();
    let so = scene.objects[0].lightmap_scale_offset;
    let width = so.x * chart_size;
    let height = so.y * chart_size;
    assert!(width <= max_region && height <= max_region);
    // Aspect ratio survives the downscale.
    assert!((width / height - 2.0).abs() < 0.1, "Got {width}x{height}");
}

#[test]
fn geometry_buffers_are_stored_per_chart() {
    let mut raw = Scene::default();
    raw.objects.push(quad_object(Vec3::new(2.0, 0.0, 2.0), 1.0));
    let scene = shared_scene(raw);

    let lightmapper = run_charting(scene, direct_only_settings("buffers"));
    for lightmap in 0..lightmapper.num_charts() {
        let buffer = lightmapper
            .cache()
            .load_geometry_buffer(lightmap)
            .expect("charting stores one geometry buffer per chart");
        assert!(buffer.covered_texels() > 0);
    }
}
