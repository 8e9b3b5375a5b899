//! Material applier: turns the two depth layers of each cell into a canvas cell.
//!
//! Every cell starts from the clear cell. The back layer's material is applied
//! first and the front layer's second, so fields written by both come from
//! the front. The result depends only on the layers and the stores, so
//! applying twice without rasterizing in between is a no-op.

use glam::Vec2;
use rayon::prelude::*;

use crate::drawing::{CanvasCell, DrawingBuffer, LayerPlanes, LayerRef, BACK, FRONT};
use crate::material::{GlyphMethod, Material, MaterialStore};
use crate::primitive::PrimitiveBuffer;
use crate::texture::TextureStore;
use crate::types::{glyph, GlyphIndex, MaterialId, Rgb};
use crate::vertex::VertexBuffer;

/// Read-only inputs shared by every cell.
struct ShadeContext<'a> {
    materials: &'a MaterialStore,
    textures: &'a TextureStore,
    vertices: &'a VertexBuffer,
    primitives: &'a PrimitiveBuffer,
    clear: CanvasCell,
    depth_ranges: [Option<(f32, f32)>; 2],
}

/// Shade every cell of `drawing` from its depth layers.
///
/// With `parallel` set, cells are shaded on the rayon pool; the output is
/// identical to the serial path.
pub fn apply_materials(
    materials: &MaterialStore,
    textures: &TextureStore,
    vertices: &VertexBuffer,
    primitives: &PrimitiveBuffer,
    drawing: &mut DrawingBuffer,
    parallel: bool,
) {
    let clear = drawing.clear_cell();
    let (planes, canvas) = drawing.planes_mut();
    let ctx = ShadeContext {
        materials,
        textures,
        vertices,
        primitives,
        clear,
        depth_ranges: [planes.depth_range(FRONT), planes.depth_range(BACK)],
    };

    if parallel {
        canvas
            .par_iter_mut()
            .enumerate()
            .for_each(|(i, cell)| shade_cell(&ctx, &planes, i, cell));
    } else {
        for (i, cell) in canvas.iter_mut().enumerate() {
            shade_cell(&ctx, &planes, i, cell);
        }
    }
}

#[inline]
fn shade_cell(ctx: &ShadeContext<'_>, planes: &LayerPlanes<'_>, index: usize, cell: &mut CanvasCell) {
    *cell = ctx.clear;
    for layer in [BACK, FRONT] {
        if let Some(l) = planes.layer(index, layer) {
            apply_material(ctx, l.info.material_id, &l, layer, cell);
        }
    }
}

fn apply_material(
    ctx: &ShadeContext<'_>,
    id: MaterialId,
    l: &LayerRef<'_>,
    layer: usize,
    cell: &mut CanvasCell,
) {
    let Some(material) = ctx.materials.get(id) else {
        return;
    };
    match material {
        Material::StaticColorFront(c) => cell.front = *c,
        Material::StaticColorBack(c) => cell.back = *c,
        Material::StaticGlyph(g) => cell.glyph = *g,
        Material::StaticAll { front, back, glyph } => {
            cell.front = *front;
            cell.back = *back;
            cell.glyph = *glyph;
        }
        Material::DebugUV => {
            let uv = ctx.uv(l);
            cell.front = Rgb::from_unit(uv.x, uv.y, 0.0);
        }
        Material::DebugDepth => {
            let t = match ctx.depth_ranges[layer] {
                Some((lo, hi)) if hi > lo => (l.depth - lo) / (hi - lo),
                _ => 0.0,
            };
            cell.front = Rgb::from_unit(t, t, t);
        }
        Material::DebugWeights => {
            let [a, b, c] = l.info.weights;
            cell.front = Rgb::from_unit(a, b, c);
        }
        Material::BaseTexture {
            albedo,
            glyph_texture,
            flags,
            glyph_method,
        } => {
            let uv = ctx.uv(l);
            if let Some(tex) = ctx.textures.get(*albedo) {
                if flags.samples_front() {
                    cell.front = tex.sample(uv);
                }
                if flags.samples_back() {
                    cell.back = tex.sample(uv);
                }
            }
            if flags.glyph {
                let source = ctx.textures.get(glyph_texture.unwrap_or(*albedo));
                match (glyph_method, source) {
                    (GlyphMethod::Static(g), _) => cell.glyph = *g,
                    (GlyphMethod::TextureIndex, Some(tex)) if flags.glyph_uv_layer => {
                        cell.glyph = glyph_from_index(tex.sample(uv));
                    }
                    (GlyphMethod::Luminance, Some(tex)) if flags.glyph_uv_layer => {
                        cell.glyph = glyph::density_glyph(tex.sample(uv).luminance());
                    }
                    _ => {}
                }
            }
        }
        // Entries are strictly earlier ids, so the recursion terminates.
        Material::Combo(entries) => {
            for &entry in entries {
                if entry < id {
                    apply_material(ctx, entry, l, layer, cell);
                }
            }
        }
    }
}

/// Glyph index stored as `red | green << 8`; out-of-table values become a space.
fn glyph_from_index(c: Rgb) -> GlyphIndex {
    let index = c.r as GlyphIndex | (c.g as GlyphIndex) << 8;
    if glyph::is_valid(index) {
        index
    } else {
        glyph::GLYPH_SPACE
    }
}

impl ShadeContext<'_> {
    /// UV at a layer, interpolated with the perspective-corrected weights.
    /// Primitives without UVs sample at the origin.
    #[inline]
    fn uv(&self, l: &LayerRef<'_>) -> Vec2 {
        self.primitives
            .get(l.info.primitive_id)
            .and_then(|p| self.vertices.uv_triple(p.uv))
            .map(|t| t.interpolate(l.info.corrected))
            .unwrap_or(Vec2::ZERO)
    }
}
