//! Software rasterizer for terminal character grids.
//!
//! The core turns 2D and 3D geometry into a grid of [`CanvasCell`]s: a
//! foreground colour, a background colour and a glyph index per character
//! cell. It has **no dependencies** on a terminal, so it runs headless in
//! tests and benchmarks.
//!
//! # Pipeline
//!
//! Each frame runs three stages over fixed-capacity stores:
//!
//! - [`primitive`]: geometry records are transformed, projected and expanded
//!   into screen-space points, lines and triangles
//! - [`raster`]: primitives are scan converted into two depth layers per cell
//! - [`applier`]: materials of the back then the front layer shape each cell
//!
//! The [`Renderer`] owns every store and drives the stages; hosts add data
//! between frames and read the [`DrawingBuffer`] afterwards.
//!
//! # Example
//!
//! ```
//! use glam::Vec2;
//! use termrast_core::{pixel_space_2d, Material, RenderConfig, Renderer};
//! use termrast_core::types::Rgb;
//!
//! let mut renderer = Renderer::new(RenderConfig::new(8, 4));
//! renderer.transforms_mut().set_view_matrix_2d(pixel_space_2d(8, 4));
//!
//! let red = renderer
//!     .add_material(Material::StaticColorFront(Rgb::new(255, 0, 0)))
//!     .unwrap();
//! let v = renderer.add_vertex_2d(Vec2::new(3.0, 2.0), 0.5).unwrap();
//! let (geometry, ctx) = renderer.geometry_parts();
//! geometry.add_point_2d(&ctx, v, u32::MAX, 0, red).unwrap();
//!
//! renderer.render_frame();
//! assert_eq!(renderer.drawing().cell(3, 2).unwrap().front, Rgb::new(255, 0, 0));
//! ```

pub mod applier;
pub mod camera;
pub mod config;
pub mod drawing;
pub mod error;
pub mod geometry;
pub mod material;
pub mod primitive;
pub mod raster;
pub mod renderer;
pub mod texture;
pub mod transform;
pub mod vertex;

pub use termrast_types as types;

pub use applier::apply_materials;
pub use camera::Camera;
pub use config::{Capacities, RenderConfig};
pub use drawing::{CanvasCell, CellState, DrawingBuffer, Fragment, PixInfo, WriteOutcome};
pub use error::{DropReason, IdKind, RasterError, Result};
pub use geometry::{Geometry, GeometryBuffer, GeometryContext, GeometryKind};
pub use material::{BaseTextureFlags, GlyphMethod, Material, MaterialStore};
pub use primitive::{
    build_primitives, BuildStats, Primitive, PrimitiveBuffer, PrimitiveKind, PrimitiveSource,
    ScreenVertex,
};
pub use raster::{rasterize, RasterStats};
pub use renderer::{FrameStats, Renderer};
pub use texture::{Texture, TextureStore};
pub use transform::{ndc_to_pixel, pixel_space_2d, TransformPack};
pub use vertex::{Space, Span, TriangleRecord, UvTriple, VertexBuffer};
