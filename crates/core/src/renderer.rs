//! The renderer: owns every store and runs the frame pipeline.
//!
//! Stores are written between frames through the `add_*` / `set_*` methods.
//! [`Renderer::render_frame`] runs build → rasterize → apply to completion and
//! does not allocate once the stores are populated.

use glam::{Mat4, Vec2, Vec3};

use crate::applier::apply_materials;
use crate::camera::Camera;
use crate::config::RenderConfig;
use crate::drawing::{CanvasCell, DrawingBuffer};
use crate::error::Result;
use crate::geometry::{Geometry, GeometryBuffer, GeometryContext};
use crate::material::{Material, MaterialStore};
use crate::primitive::{build_primitives, BuildStats, PrimitiveBuffer};
use crate::raster::{rasterize, RasterStats};
use crate::texture::TextureStore;
use crate::transform::TransformPack;
use crate::types::{GeometryId, MaterialId, NodeId, Rgb, TextureId};
use crate::vertex::{Space, Span, UvTriple, VertexBuffer};

/// Counters for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub build: BuildStats,
    pub raster: RasterStats,
}

impl FrameStats {
    pub fn primitives(&self) -> u32 {
        self.build.emitted
    }

    pub fn dropped(&self) -> u32 {
        self.build.dropped()
    }
}

#[derive(Debug, Clone)]
pub struct Renderer {
    config: RenderConfig,
    textures: TextureStore,
    materials: MaterialStore,
    vertices: VertexBuffer,
    transforms: TransformPack,
    geometry: GeometryBuffer,
    primitives: PrimitiveBuffer,
    drawing: DrawingBuffer,
    last_stats: FrameStats,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Self {
        let caps = config.capacities;
        log::info!(
            "renderer {}x{}, {} primitives max, parallel apply: {}",
            config.width,
            config.height,
            caps.primitives,
            config.parallel
        );
        Self {
            textures: TextureStore::new(caps.textures),
            materials: MaterialStore::new(caps.materials),
            vertices: VertexBuffer::new(&caps),
            transforms: TransformPack::new(caps.nodes),
            geometry: GeometryBuffer::new(caps.geometries),
            primitives: PrimitiveBuffer::new(caps.primitives),
            drawing: DrawingBuffer::new(
                config.width,
                config.height,
                config.clear_depth,
                config.clear_cell(),
            ),
            config,
            last_stats: FrameStats::default(),
        }
    }

    // Stores

    pub fn add_texture(
        &mut self,
        width: u32,
        height: u32,
        pixels: Vec<Rgb>,
        wrap_u: bool,
        wrap_v: bool,
    ) -> Result<TextureId> {
        self.textures.add_texture(width, height, pixels, wrap_u, wrap_v)
    }

    pub fn add_material(&mut self, material: Material) -> Result<MaterialId> {
        self.materials.add_material(material, &self.textures)
    }

    pub fn add_vertex_3d(&mut self, position: Vec3) -> Result<u32> {
        self.vertices.add_vertex_3d(position)
    }

    pub fn add_vertices_3d(&mut self, positions: &[Vec3]) -> Result<Span> {
        self.vertices.add_vertices_3d(positions)
    }

    pub fn add_vertex_2d(&mut self, position: Vec2, z: f32) -> Result<u32> {
        self.vertices.add_vertex_2d(position, z)
    }

    pub fn add_vertices_2d(&mut self, positions: &[Vec3]) -> Result<Span> {
        self.vertices.add_vertices_2d(positions)
    }

    pub fn add_uv_triple(&mut self, uv: UvTriple) -> Result<u32> {
        self.vertices.add_uv_triple(uv)
    }

    pub fn add_uv_triples(&mut self, uvs: &[UvTriple]) -> Result<Span> {
        self.vertices.add_uv_triples(uvs)
    }

    pub fn add_triangle(&mut self, space: Space, indices: [u32; 3], uv: u32) -> Result<u32> {
        self.vertices.add_triangle(space, indices, uv)
    }

    pub fn add_node_transform(&mut self, model: Mat4) -> Result<NodeId> {
        self.transforms.add_node_transform(model)
    }

    pub fn set_node_transform(&mut self, id: NodeId, model: Mat4) -> Result<()> {
        self.transforms.set_node_transform(id, model)
    }

    /// Validate and append a geometry record.
    pub fn add_geometry(&mut self, geometry: Geometry) -> Result<GeometryId> {
        let (buffer, ctx) = self.geometry_parts();
        buffer.add(geometry, &ctx)
    }

    /// Geometry buffer plus the context its typed `add_*` methods validate against.
    pub fn geometry_parts(&mut self) -> (&mut GeometryBuffer, GeometryContext<'_>) {
        let ctx = GeometryContext {
            vertices: &self.vertices,
            materials: self.materials.len(),
            nodes: self.transforms.node_count(),
        };
        (&mut self.geometry, ctx)
    }

    pub fn update_geometry_material(&mut self, id: GeometryId, material: MaterialId) -> Result<()> {
        self.geometry
            .update_geometry_material(id, material, self.materials.len())
    }

    // Frame

    /// Reset both depth layers and the canvas.
    pub fn clear(&mut self) {
        self.drawing.clear();
    }

    /// Resize the drawing buffer. A no-op when the size is unchanged.
    pub fn resize(&mut self, width: u16, height: u16) {
        if width == self.drawing.width() && height == self.drawing.height() {
            return;
        }
        log::info!("resize {}x{} -> {}x{}", self.drawing.width(), self.drawing.height(), width, height);
        self.config.width = width;
        self.config.height = height;
        self.drawing.resize(width, height);
    }

    pub fn set_clear_cell(&mut self, cell: CanvasCell) {
        self.config.clear_front = cell.front;
        self.config.clear_back = cell.back;
        self.config.clear_glyph = cell.glyph;
        self.drawing.set_clear_cell(cell);
    }

    /// Load the camera's matrices, matching its size, and render a frame.
    pub fn render(&mut self, camera: &Camera) -> FrameStats {
        self.resize(camera.width, camera.height);
        self.transforms.set_projection(camera.projection());
        self.transforms.set_view_matrix_3d(camera.view_3d());
        self.transforms.set_view_matrix_2d(camera.view_2d());
        self.render_frame()
    }

    /// Clear, build primitives, rasterize and apply materials.
    pub fn render_frame(&mut self) -> FrameStats {
        self.drawing.clear();
        let build = self.build();
        let raster = self.rasterize();
        self.apply();
        self.last_stats = FrameStats { build, raster };
        self.last_stats
    }

    /// Rebuild the primitive buffer from the geometry buffer.
    pub fn build(&mut self) -> BuildStats {
        build_primitives(
            &self.geometry,
            &mut self.vertices,
            &self.transforms,
            &self.drawing,
            &mut self.primitives,
            self.config.log_dropped,
        )
    }

    /// Rasterize the current primitives without clearing first.
    pub fn rasterize(&mut self) -> RasterStats {
        rasterize(&self.primitives, &mut self.drawing)
    }

    pub fn apply(&mut self) {
        apply_materials(
            &self.materials,
            &self.textures,
            &self.vertices,
            &self.primitives,
            &mut self.drawing,
            self.config.parallel,
        );
    }

    // Accessors

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn set_parallel(&mut self, parallel: bool) {
        self.config.parallel = parallel;
    }

    pub fn textures(&self) -> &TextureStore {
        &self.textures
    }

    pub fn materials(&self) -> &MaterialStore {
        &self.materials
    }

    pub fn vertices(&self) -> &VertexBuffer {
        &self.vertices
    }

    pub fn vertices_mut(&mut self) -> &mut VertexBuffer {
        &mut self.vertices
    }

    pub fn transforms(&self) -> &TransformPack {
        &self.transforms
    }

    pub fn transforms_mut(&mut self) -> &mut TransformPack {
        &mut self.transforms
    }

    pub fn geometry(&self) -> &GeometryBuffer {
        &self.geometry
    }

    pub fn primitives(&self) -> &PrimitiveBuffer {
        &self.primitives
    }

    /// Direct access for hosts that emit screen-space primitives themselves.
    pub fn primitives_mut(&mut self) -> &mut PrimitiveBuffer {
        &mut self.primitives
    }

    pub fn drawing(&self) -> &DrawingBuffer {
        &self.drawing
    }

    pub fn last_stats(&self) -> FrameStats {
        self.last_stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawing::FRONT;
    use crate::transform::pixel_space_2d;

    #[test]
    fn empty_scene_renders_the_clear_cell() {
        let mut r = Renderer::new(RenderConfig::new(4, 3));
        let stats = r.render_frame();
        assert_eq!(stats.primitives(), 0);
        let clear = r.config().clear_cell();
        assert!(r.drawing().canvas().iter().all(|c| *c == clear));
    }

    #[test]
    fn two_d_point_lands_in_its_cell() {
        let mut r = Renderer::new(RenderConfig::new(4, 4));
        r.transforms_mut().set_view_matrix_2d(pixel_space_2d(4, 4));
        let red = r.add_material(Material::StaticColorFront(Rgb::new(255, 0, 0))).unwrap();
        let v = r.add_vertex_2d(Vec2::new(2.0, 1.0), 0.5).unwrap();
        let (geo, ctx) = r.geometry_parts();
        geo.add_point_2d(&ctx, v, u32::MAX, 0, red).unwrap();

        let stats = r.render_frame();
        assert_eq!(stats.primitives(), 1);
        assert_eq!(r.drawing().cell(2, 1).unwrap().front, Rgb::new(255, 0, 0));
        assert_eq!(r.drawing().layer(2, 1, FRONT).unwrap().depth, 0.5);
    }

    #[test]
    fn clear_cell_change_reaches_config_and_canvas() {
        let mut r = Renderer::new(RenderConfig::new(3, 2).with_parallel(true));
        let cell = CanvasCell {
            front: Rgb::new(1, 2, 3),
            back: Rgb::new(0, 0, 40),
            glyph: 7,
        };
        r.set_clear_cell(cell);
        assert_eq!(r.config().clear_cell(), cell);
        assert!(r.config().parallel);

        r.render_frame();
        assert!(r.drawing().canvas().iter().all(|c| *c == cell));
    }

    #[test]
    fn render_follows_camera_size() {
        let mut r = Renderer::new(RenderConfig::new(4, 4));
        let camera = Camera::new(10, 5);
        r.render(&camera);
        assert_eq!(r.drawing().width(), 10);
        assert_eq!(r.config().height, 5);
    }

    #[test]
    fn material_rebinding_is_validated() {
        let mut r = Renderer::new(RenderConfig::new(2, 2));
        let m = r.add_material(Material::DebugUV).unwrap();
        let v = r.add_vertex_2d(Vec2::ZERO, 0.5).unwrap();
        let (geo, ctx) = r.geometry_parts();
        let g = geo.add_point_2d(&ctx, v, u32::MAX, 0, m).unwrap();
        assert!(r.update_geometry_material(g, m).is_ok());
        assert!(r.update_geometry_material(g, 7).is_err());
        assert!(r.update_geometry_material(99, m).is_err());
    }
}
