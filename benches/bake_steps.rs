//! Benchmarks for baking building blocks
//!
//! Author: Moroya Sakamoto

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use ember_bake::chart::AreaAllocator;
use ember_bake::chunks::{sort_chunks, swizzle};
use ember_bake::filter::filter_indirect_light;
use ember_bake::geometry::GeometryBuffer;
use ember_bake::prelude::*;
use ember_bake::raytrace::RaytracerScene;
use ember_bake::trace::BakedIndirect;
use glam::{Vec2, Vec3, Vec4};

fn bench_chunk_sorting(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunks");

    let base = ChunkCoord::new(-64, -64, -64);
    group.bench_function("swizzle", |b| {
        b.iter(|| swizzle(black_box(ChunkCoord::new(17, -5, 42)), black_box(base)))
    });

    let chunks: Vec<ChunkCoord> = (0..4096)
        .map(|i| ChunkCoord::new((i * 37 % 64) - 32, (i * 13 % 64) - 32, (i * 7 % 64) - 32))
        .collect();
    group.throughput(Throughput::Elements(chunks.len() as u64));
    group.bench_function("sort_4096", |b| {
        b.iter(|| {
            let mut chunks = chunks.clone();
            sort_chunks(&mut chunks);
            chunks
        })
    });

    group.finish();
}

fn bench_allocator(c: &mut Criterion) {
    let mut group = c.benchmark_group("charting");

    group.bench_function("allocator_fill_512", |b| {
        b.iter(|| {
            let mut allocator = AreaAllocator::new(512, 512);
            let mut allocated = 0u32;
            while allocator.allocate(black_box(18), black_box(14)).is_some() {
                allocated += 1;
            }
            allocated
        })
    });

    group.finish();
}

fn bench_raytrace(c: &mut Criterion) {
    let mut group = c.benchmark_group("raytrace");

    let mut scene = Scene::default();
    for i in 0..64 {
        let mut object = SceneObject::new(
            "quad",
            vec![
                Vec3::new(-1.0, 0.0, -1.0),
                Vec3::new(1.0, 0.0, -1.0),
                Vec3::new(1.0, 0.0, 1.0),
                Vec3::new(-1.0, 0.0, 1.0),
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
        object.position = Vec3::new((i % 8) as f32 * 3.0, (i / 8) as f32, (i / 8) as f32 * 3.0);
        scene.objects.push(object);
    }
    let objects: Vec<usize> = (0..scene.objects.len()).collect();
    let raytracer = RaytracerScene::build(&scene, &objects);

    group.bench_function("occluded_128_triangles", |b| {
        b.iter(|| {
            raytracer.occluded(
                black_box(Vec3::new(10.0, 20.0, 10.0)),
                black_box(Vec3::NEG_Y),
                black_box(100.0),
            )
        })
    });

    group.finish();
}

fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter");

    const SIZE: u32 = 128;
    let mut geometry = GeometryBuffer::new(0, SIZE);
    for index in 0..geometry.geometry_ids.len() {
        let location = geometry.index_to_location(index);
        geometry.geometry_ids[index] = 1;
        geometry.positions[index] = Vec3::new(location.x as f32, 0.0, location.y as f32) * 0.1;
        geometry.smooth_normals[index] = Vec3::Y;
    }

    let settings = FilterSettings::default();
    group.throughput(Throughput::Elements((SIZE * SIZE) as u64));
    group.bench_function("denoise_128x128", |b| {
        b.iter(|| {
            let mut indirect = BakedIndirect::new(SIZE);
            indirect.light.fill(Vec4::new(0.5, 0.4, 0.3, 1.0));
            filter_indirect_light(&mut indirect, &geometry, &settings, 4);
            indirect
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_chunk_sorting,
    bench_allocator,
    bench_raytrace,
    bench_filter
);
criterion_main!(benches);
