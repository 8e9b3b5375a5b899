use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::{Mat4, Vec2, Vec3};
use termrast::core::{
    pixel_space_2d, Camera, Material, PrimitiveSource, RenderConfig, Renderer, ScreenVertex,
};
use termrast::scene::{MeshData, NodeKind, SceneGraph, TextureData};
use termrast::term::{Strip, StripEmitter, StyleBits};
use termrast::types::{Rect, Rgb};

fn cube_scene(w: u16, h: u16, parallel: bool) -> (Renderer, Camera) {
    let mut renderer = Renderer::new(RenderConfig::new(w, h).with_parallel(parallel));
    let tex = TextureData::checkerboard(16, 4, Rgb::new(230, 120, 40), Rgb::new(40, 90, 200))
        .upload(&mut renderer)
        .unwrap();
    let material = renderer.add_material(Material::textured_front(tex)).unwrap();

    let mut scene = SceneGraph::new();
    let root = scene.root();
    for i in 0..8 {
        let node = scene
            .add_child(root, NodeKind::Mesh { mesh: MeshData::cube(0.6), material })
            .unwrap();
        let angle = i as f32 * std::f32::consts::FRAC_PI_4;
        let offset = Vec3::new(angle.cos() * 1.5, angle.sin() * 0.8, -1.0);
        scene
            .set_local(node, Mat4::from_translation(offset) * Mat4::from_rotation_y(angle))
            .unwrap();
    }
    scene.sync_into(&mut renderer).unwrap();
    (renderer, Camera::new(w, h))
}

fn bench_render_frame(c: &mut Criterion) {
    let (mut serial, camera) = cube_scene(160, 48, false);
    c.bench_function("render_cubes_160x48_serial", |b| {
        b.iter(|| black_box(serial.render(&camera)))
    });

    let (mut parallel, camera) = cube_scene(160, 48, true);
    c.bench_function("render_cubes_160x48_parallel", |b| {
        b.iter(|| black_box(parallel.render(&camera)))
    });
}

fn bench_rasterize_triangles(c: &mut Criterion) {
    let mut renderer = Renderer::new(RenderConfig::new(200, 60));
    renderer
        .transforms_mut()
        .set_view_matrix_2d(pixel_space_2d(200, 60));
    let m = renderer.add_material(Material::StaticColorBack(Rgb::WHITE)).unwrap();

    c.bench_function("rasterize_256_triangles", |b| {
        b.iter(|| {
            renderer.clear();
            renderer.primitives_mut().clear();
            for i in 0..256u32 {
                let x = (i % 32) as f32 * 6.0;
                let y = (i / 32) as f32 * 7.0;
                let z = (i % 7) as f32 * 0.1;
                let _ = renderer.primitives_mut().push_triangle(
                    ScreenVertex::new(x, y, z),
                    ScreenVertex::new(x + 9.0, y + 1.0, z),
                    ScreenVertex::new(x + 3.0, y + 10.0, z),
                    PrimitiveSource::material(m),
                );
            }
            black_box(renderer.rasterize())
        })
    });
}

fn bench_emit_strips(c: &mut Criterion) {
    let (mut renderer, camera) = cube_scene(160, 48, false);
    renderer.render(&camera);
    let mut emitter = StripEmitter::new(StyleBits::default());
    let mut strips: Vec<Strip> = Vec::new();

    c.bench_function("emit_strips_160x48", |b| {
        b.iter(|| {
            emitter
                .emit_into(renderer.drawing(), Rect::full(160, 48), &mut strips)
                .unwrap();
            black_box(strips.len())
        })
    });
}

fn bench_scene_sync(c: &mut Criterion) {
    let (mut renderer, _) = cube_scene(80, 24, false);
    let mut scene = SceneGraph::new();
    let root = scene.root();
    let quad = scene
        .add_child(
            root,
            NodeKind::Quad2D {
                min: Vec2::ZERO,
                max: Vec2::new(10.0, 4.0),
                z: 0.0,
                material: 0,
            },
        )
        .unwrap();
    scene.sync_into(&mut renderer).unwrap();

    let mut t = 0.0f32;
    c.bench_function("scene_sync_transform", |b| {
        b.iter(|| {
            t += 0.01;
            scene
                .set_local(quad, Mat4::from_translation(Vec3::new(t, 0.0, 0.0)))
                .unwrap();
            scene.sync_into(&mut renderer).unwrap();
        })
    });
}

criterion_group!(
    benches,
    bench_render_frame,
    bench_rasterize_triangles,
    bench_emit_strips,
    bench_scene_sync
);
criterion_main!(benches);
