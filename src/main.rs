//! Terminal viewer (default binary).
//!
//! Renders a spinning textured cube with a 2D overlay into the terminal. It
//! uses crossterm for input and the strip emitter for output.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::{Parser, ValueEnum};
use crossterm::event::{self, Event, KeyEventKind};
use glam::{Mat4, Vec2, Vec3};

use termrast::core::{BaseTextureFlags, Camera, GlyphMethod, Material, Renderer};
use termrast::input::{handle_key_event, should_quit};
use termrast::scene::{MeshData, NodeHandle, NodeKind, SceneGraph, TextureData};
use termrast::term::{FrameClock, Strip, StripEmitter, TerminalRenderer};
use termrast::types::{glyph, MaterialId, Rect, Rgb, ScaleMode};
use termrast::ViewerConfig;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Shading {
    /// Checkerboard albedo with luminance glyphs.
    Texture,
    /// Interpolated texture coordinates.
    Uv,
    /// Depth normalised over the frame.
    Depth,
    /// Barycentric weights.
    Weights,
}

#[derive(Parser, Debug)]
#[command(name = "termrast", version, about = "Software rasterizer for the terminal")]
struct Args {
    /// JSON viewer configuration.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the configured frame rate.
    #[arg(long)]
    fps: Option<u32>,

    /// Cube material.
    #[arg(long, value_enum, default_value_t = Shading::Texture)]
    material: Shading,

    /// Shade cells on the rayon pool.
    #[arg(long, default_value_t = false)]
    parallel: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => ViewerConfig::load(path)?,
        None => ViewerConfig::default(),
    };
    if let Some(fps) = args.fps {
        config.fps = fps;
    }
    config.render.parallel |= args.parallel;

    let mut term = TerminalRenderer::new();
    term.enter()?;

    let result = run(&mut term, &config, args.material);

    // Always try to restore terminal state.
    let _ = term.exit();
    result
}

struct Demo {
    scene: SceneGraph,
    cube: NodeHandle,
}

fn build_scene(renderer: &mut Renderer, shading: Shading) -> Result<Demo> {
    let checker = TextureData::checkerboard(
        8,
        4,
        Rgb::new(230, 120, 40),
        Rgb::new(40, 90, 200),
    )
    .upload(renderer)?;
    let gradient = TextureData::gradient(16, 1, Rgb::new(20, 20, 60), Rgb::new(90, 160, 220))
        .upload(renderer)?;

    let block = renderer.add_material(Material::StaticGlyph(glyph::FULL_BLOCK))?;
    let cube_material = match shading {
        Shading::Texture => renderer.add_material(Material::BaseTexture {
            albedo: checker,
            glyph_texture: None,
            flags: BaseTextureFlags::front().with_glyph(),
            glyph_method: GlyphMethod::Luminance,
        })?,
        Shading::Uv => debug_combo(renderer, Material::DebugUV, block)?,
        Shading::Depth => debug_combo(renderer, Material::DebugDepth, block)?,
        Shading::Weights => debug_combo(renderer, Material::DebugWeights, block)?,
    };
    let panel = renderer.add_material(Material::BaseTexture {
        albedo: gradient,
        glyph_texture: None,
        flags: BaseTextureFlags::back(),
        glyph_method: GlyphMethod::Static(glyph::GLYPH_SPACE),
    })?;
    let frame = renderer.add_material(Material::StaticAll {
        front: Rgb::WHITE,
        back: Rgb::new(20, 20, 60),
        glyph: glyph::glyph_index('*'),
    })?;

    let mut scene = SceneGraph::new();
    let root = scene.root();
    let cube = scene.add_child(
        root,
        NodeKind::Mesh {
            mesh: MeshData::cube(1.4),
            material: cube_material,
        },
    )?;
    let overlay = scene.add_child(root, NodeKind::Group)?;
    scene.add_child(
        overlay,
        NodeKind::Quad2D {
            min: Vec2::new(1.0, 1.0),
            max: Vec2::new(17.0, 4.0),
            z: 0.0,
            material: panel,
        },
    )?;
    scene.add_child(
        overlay,
        NodeKind::Polyline2D {
            points: vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(18.0, 0.0),
                Vec2::new(18.0, 5.0),
                Vec2::new(0.0, 5.0),
                Vec2::new(0.0, 0.0),
            ],
            z: 0.0,
            material: frame,
        },
    )?;
    Ok(Demo { scene, cube })
}

fn debug_combo(renderer: &mut Renderer, debug: Material, shape: MaterialId) -> Result<MaterialId> {
    let colour = renderer.add_material(debug)?;
    Ok(renderer.add_material(Material::combo(&[colour, shape])?)?)
}

fn run(term: &mut TerminalRenderer, config: &ViewerConfig, shading: Shading) -> Result<()> {
    let (w, h) = crossterm::terminal::size().unwrap_or((80, 24));
    let mut render_config = config.render.clone();
    render_config.width = w;
    render_config.height = h;

    let mut renderer = Renderer::new(render_config);
    let mut demo = build_scene(&mut renderer, shading)?;
    let mut camera = Camera::new(w, h).with_pose(Vec3::new(0.0, 0.6, 3.2), 0.0, -0.2);
    camera.scale_mode = ScaleMode::Stretch;
    camera.update();

    let mut emitter = StripEmitter::new(config.style);
    let mut strips: Vec<Strip> = Vec::new();
    let mut clock = FrameClock::from_fps(config.fps);
    let start = Instant::now();

    loop {
        let now_ms = start.elapsed().as_millis() as u64;

        if clock.should_render(now_ms) {
            let angle = now_ms as f32 / 1000.0 * 0.8;
            demo.scene.set_local(
                demo.cube,
                Mat4::from_rotation_y(angle) * Mat4::from_rotation_x(angle * 0.5),
            )?;
            demo.scene.sync_into(&mut renderer)?;

            let stats = renderer.render(&camera);
            log::trace!(
                "frame: {} primitives, {} dropped, {} fragments",
                stats.primitives(),
                stats.dropped(),
                stats.raster.fragments
            );

            emitter.emit_into(renderer.drawing(), Rect::full(camera.width, camera.height), &mut strips)?;
            term.draw_strips(&mut strips, emitter.styles())?;
        }

        // Input with timeout until the next frame.
        let timeout = Duration::from_millis(clock.time_until_next(start.elapsed().as_millis() as u64));
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if should_quit(key) {
                        return Ok(());
                    }
                    if let Some(action) = handle_key_event(key) {
                        camera.apply_action(action);
                    }
                }
                Event::Resize(w, h) => {
                    camera.recalc(w, h);
                    term.invalidate();
                }
                _ => {}
            }
        }
    }
}
