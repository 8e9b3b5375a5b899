//! Asset payloads and loaders.
//!
//! Loaders hand the scene plain data; uploading into the renderer's stores
//! happens in [`crate::SceneGraph::sync_into`] and [`TextureData::upload`].

use std::collections::HashMap;

use glam::{Vec2, Vec3};
use thiserror::Error;

use termrast_core::{RasterError, Renderer, UvTriple};
use termrast_types::{Rgb, TextureId};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AssetError {
    #[error("asset not found: {0}")]
    NotFound(String),

    #[error("invalid mesh: {0}")]
    InvalidMesh(&'static str),

    #[error(transparent)]
    Raster(#[from] RasterError),
}

/// Row-major RGB image plus its wrap flags.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Rgb>,
    pub wrap_u: bool,
    pub wrap_v: bool,
}

impl TextureData {
    pub fn new(width: u32, height: u32, pixels: Vec<Rgb>) -> Self {
        Self {
            width,
            height,
            pixels,
            wrap_u: true,
            wrap_v: true,
        }
    }

    pub fn with_wrap(mut self, wrap_u: bool, wrap_v: bool) -> Self {
        self.wrap_u = wrap_u;
        self.wrap_v = wrap_v;
        self
    }

    /// `size x size` checkerboard of `tiles x tiles` squares.
    pub fn checkerboard(size: u32, tiles: u32, a: Rgb, b: Rgb) -> Self {
        let tile = (size / tiles.max(1)).max(1);
        let pixels = (0..size * size)
            .map(|i| {
                let (x, y) = (i % size, i / size);
                if (x / tile + y / tile) % 2 == 0 {
                    a
                } else {
                    b
                }
            })
            .collect();
        Self::new(size, size, pixels)
    }

    /// Horizontal gradient from `from` (left) to `to` (right); clamped, not wrapped.
    pub fn gradient(width: u32, height: u32, from: Rgb, to: Rgb) -> Self {
        let lerp = |a: u8, b: u8, t: f32| a as f32 / 255.0 + (b as f32 - a as f32) / 255.0 * t;
        let pixels = (0..width * height)
            .map(|i| {
                let x = i % width.max(1);
                let t = if width > 1 {
                    x as f32 / (width - 1) as f32
                } else {
                    0.0
                };
                Rgb::from_unit(lerp(from.r, to.r, t), lerp(from.g, to.g, t), lerp(from.b, to.b, t))
            })
            .collect();
        Self::new(width, height, pixels).with_wrap(false, false)
    }

    /// Add the texture to the renderer's store.
    pub fn upload(&self, renderer: &mut Renderer) -> Result<TextureId, AssetError> {
        Ok(renderer.add_texture(
            self.width,
            self.height,
            self.pixels.clone(),
            self.wrap_u,
            self.wrap_v,
        )?)
    }
}

/// Indexed triangle mesh with one UV triple per triangle.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshData {
    pub positions: Vec<Vec3>,
    pub triangles: Vec<[u32; 3]>,
    pub uvs: Vec<UvTriple>,
}

impl MeshData {
    pub fn validate(&self) -> Result<(), AssetError> {
        if self.triangles.is_empty() {
            return Err(AssetError::InvalidMesh("no triangles"));
        }
        if self.uvs.len() != self.triangles.len() {
            return Err(AssetError::InvalidMesh("one uv triple per triangle required"));
        }
        let n = self.positions.len() as u32;
        if self.triangles.iter().flatten().any(|&i| i >= n) {
            return Err(AssetError::InvalidMesh("triangle index out of range"));
        }
        Ok(())
    }

    /// Axis-aligned cube centred on the origin, two triangles per face,
    /// each face mapped to the full texture.
    pub fn cube(size: f32) -> Self {
        let h = size * 0.5;
        // (normal axis, face corners counter-clockwise seen from outside)
        let faces: [[Vec3; 4]; 6] = [
            [Vec3::new(-h, -h, h), Vec3::new(h, -h, h), Vec3::new(h, h, h), Vec3::new(-h, h, h)],
            [Vec3::new(h, -h, -h), Vec3::new(-h, -h, -h), Vec3::new(-h, h, -h), Vec3::new(h, h, -h)],
            [Vec3::new(h, -h, h), Vec3::new(h, -h, -h), Vec3::new(h, h, -h), Vec3::new(h, h, h)],
            [Vec3::new(-h, -h, -h), Vec3::new(-h, -h, h), Vec3::new(-h, h, h), Vec3::new(-h, h, -h)],
            [Vec3::new(-h, h, h), Vec3::new(h, h, h), Vec3::new(h, h, -h), Vec3::new(-h, h, -h)],
            [Vec3::new(-h, -h, -h), Vec3::new(h, -h, -h), Vec3::new(h, -h, h), Vec3::new(-h, -h, h)],
        ];

        let mut mesh = MeshData::default();
        for corners in faces {
            let base = mesh.positions.len() as u32;
            mesh.positions.extend_from_slice(&corners);
            mesh.push_quad(base);
        }
        mesh
    }

    /// Unit-UV quad in the XY plane, centred on the origin.
    pub fn quad(size: f32) -> Self {
        let h = size * 0.5;
        let mut mesh = MeshData {
            positions: vec![
                Vec3::new(-h, -h, 0.0),
                Vec3::new(h, -h, 0.0),
                Vec3::new(h, h, 0.0),
                Vec3::new(-h, h, 0.0),
            ],
            ..Default::default()
        };
        mesh.push_quad(0);
        mesh
    }

    /// Two triangles over the four vertices starting at `base`.
    fn push_quad(&mut self, base: u32) {
        // v grows downwards in texture space, so the top edge gets v = 0.
        let (bl, br, tr, tl) = (Vec2::new(0.0, 1.0), Vec2::ONE, Vec2::new(1.0, 0.0), Vec2::ZERO);
        self.triangles.push([base, base + 1, base + 2]);
        self.uvs.push(UvTriple::new(bl, br, tr));
        self.triangles.push([base, base + 2, base + 3]);
        self.uvs.push(UvTriple::new(bl, tr, tl));
    }
}

/// Source of named textures and meshes.
pub trait AssetLoader {
    fn load_texture(&self, name: &str) -> Result<TextureData, AssetError>;
    fn load_mesh(&self, name: &str) -> Result<MeshData, AssetError>;
}

/// In-memory loader, mainly for tests and generated assets.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssets {
    textures: HashMap<String, TextureData>,
    meshes: HashMap<String, MeshData>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_texture(&mut self, name: impl Into<String>, texture: TextureData) {
        self.textures.insert(name.into(), texture);
    }

    pub fn insert_mesh(&mut self, name: impl Into<String>, mesh: MeshData) {
        self.meshes.insert(name.into(), mesh);
    }
}

impl AssetLoader for MemoryAssets {
    fn load_texture(&self, name: &str) -> Result<TextureData, AssetError> {
        self.textures
            .get(name)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(name.to_string()))
    }

    fn load_mesh(&self, name: &str) -> Result<MeshData, AssetError> {
        let mesh = self
            .meshes
            .get(name)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(name.to_string()))?;
        mesh.validate()?;
        Ok(mesh)
    }
}
