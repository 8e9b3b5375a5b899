//! Texture store and nearest-neighbour sampling.

use glam::Vec2;

use crate::error::{RasterError, Result};
use crate::types::{Rgb, TextureId};

/// Row-major RGB colour map. Wrap flags belong to the texture, not the sample site.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    width: u32,
    height: u32,
    pixels: Vec<Rgb>,
    wrap_u: bool,
    wrap_v: bool,
}

impl Texture {
    pub fn new(width: u32, height: u32, pixels: Vec<Rgb>, wrap_u: bool, wrap_v: bool) -> Result<Self> {
        let expected = width as usize * height as usize;
        if width == 0 || height == 0 || pixels.len() != expected {
            return Err(RasterError::InvalidTexture {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
            wrap_u,
            wrap_v,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    pub fn wrap_u(&self) -> bool {
        self.wrap_u
    }

    pub fn wrap_v(&self) -> bool {
        self.wrap_v
    }

    /// Texel at integer coordinates (no wrapping).
    pub fn texel(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get((y as usize) * (self.width as usize) + (x as usize))
            .copied()
    }

    /// Nearest-neighbour sample. Row 0 sits at `v = 0`.
    #[inline]
    pub fn sample(&self, uv: Vec2) -> Rgb {
        let x = texel_coord(wrap_coord(uv.x, self.wrap_u), self.width);
        let y = texel_coord(wrap_coord(uv.y, self.wrap_v), self.height);
        self.pixels[(y as usize) * (self.width as usize) + (x as usize)]
    }
}

#[inline]
fn wrap_coord(t: f32, wrap: bool) -> f32 {
    if !t.is_finite() {
        return 0.0;
    }
    if wrap {
        t - t.floor()
    } else {
        t.clamp(0.0, 1.0)
    }
}

#[inline]
fn texel_coord(t: f32, size: u32) -> u32 {
    ((t * size as f32) as u32).min(size - 1)
}

/// Append-only texture store with a fixed cap.
#[derive(Debug, Clone)]
pub struct TextureStore {
    textures: Vec<Texture>,
    capacity: usize,
}

impl TextureStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            textures: Vec::new(),
            capacity,
        }
    }

    pub fn add_texture(
        &mut self,
        width: u32,
        height: u32,
        pixels: Vec<Rgb>,
        wrap_u: bool,
        wrap_v: bool,
    ) -> Result<TextureId> {
        if self.textures.len() >= self.capacity {
            return Err(RasterError::CapacityExceeded {
                store: "texture store",
                capacity: self.capacity,
            });
        }
        let texture = Texture::new(width, height, pixels, wrap_u, wrap_v)?;
        self.textures.push(texture);
        Ok((self.textures.len() - 1) as TextureId)
    }

    pub fn get(&self, id: TextureId) -> Option<&Texture> {
        self.textures.get(id as usize)
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const R: Rgb = Rgb::new(255, 0, 0);
    const G: Rgb = Rgb::new(0, 255, 0);
    const B: Rgb = Rgb::new(0, 0, 255);

    fn rggb(wrap: bool) -> Texture {
        Texture::new(2, 2, vec![R, G, G, B], wrap, wrap).unwrap()
    }

    #[test]
    fn rejects_size_mismatch() {
        let err = Texture::new(2, 2, vec![R; 3], false, false).unwrap_err();
        assert_eq!(
            err,
            RasterError::InvalidTexture {
                width: 2,
                height: 2,
                expected: 4,
                actual: 3
            }
        );
        assert!(Texture::new(0, 0, Vec::new(), false, false).is_err());
    }

    #[test]
    fn samples_nearest_texel() {
        let tex = rggb(false);
        assert_eq!(tex.sample(Vec2::new(0.25, 0.25)), R);
        assert_eq!(tex.sample(Vec2::new(0.75, 0.25)), G);
        assert_eq!(tex.sample(Vec2::new(0.25, 0.75)), G);
        assert_eq!(tex.sample(Vec2::new(0.75, 0.75)), B);
    }

    #[test]
    fn wrap_at_one_matches_zero() {
        let tex = rggb(true);
        assert_eq!(tex.sample(Vec2::new(1.0, 0.0)), tex.sample(Vec2::new(0.0, 0.0)));
        assert_eq!(tex.sample(Vec2::new(1.25, 1.75)), tex.sample(Vec2::new(0.25, 0.75)));
        assert_eq!(tex.sample(Vec2::new(-0.25, 0.25)), G);
    }

    #[test]
    fn clamp_holds_the_edge_texel() {
        let tex = rggb(false);
        assert_eq!(tex.sample(Vec2::new(1.0, 0.0)), G);
        assert_eq!(tex.sample(Vec2::new(5.0, 5.0)), B);
        assert_eq!(tex.sample(Vec2::new(-3.0, -3.0)), R);
        assert_eq!(tex.sample(Vec2::new(f32::NAN, 0.0)), R);
    }

    #[test]
    fn store_enforces_capacity() {
        let mut store = TextureStore::new(1);
        assert_eq!(store.add_texture(1, 1, vec![R], false, false), Ok(0));
        assert!(matches!(
            store.add_texture(1, 1, vec![G], false, false),
            Err(RasterError::CapacityExceeded { capacity: 1, .. })
        ));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(0).and_then(|t| t.texel(0, 0)), Some(R));
    }
}
