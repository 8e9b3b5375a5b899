//! Material descriptors and the material store.
//!
//! Materials are tagged variants. The material applier is the single
//! dispatch point; nothing else interprets a variant.

use arrayvec::ArrayVec;

use crate::error::{check_id, IdKind, RasterError, Result};
use crate::texture::TextureStore;
use crate::types::{glyph, GlyphIndex, MaterialId, Rgb, TextureId, MAX_COMBO_ENTRIES};

/// Which canvas fields a [`Material::BaseTexture`] drives.
///
/// A field is written only when both its own flag and its `*_uv_layer` flag
/// are set. A cleared `*_uv_layer` flag means the field is not sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BaseTextureFlags {
    pub front: bool,
    pub back: bool,
    pub glyph: bool,
    pub front_uv_layer: bool,
    pub back_uv_layer: bool,
    pub glyph_uv_layer: bool,
}

impl BaseTextureFlags {
    /// Sample the albedo into the front colour only.
    pub const fn front() -> Self {
        Self {
            front: true,
            back: false,
            glyph: false,
            front_uv_layer: true,
            back_uv_layer: false,
            glyph_uv_layer: false,
        }
    }

    /// Sample the albedo into the back colour only.
    pub const fn back() -> Self {
        Self {
            front: false,
            back: true,
            glyph: false,
            front_uv_layer: false,
            back_uv_layer: true,
            glyph_uv_layer: false,
        }
    }

    /// Sample every field.
    pub const fn all() -> Self {
        Self {
            front: true,
            back: true,
            glyph: true,
            front_uv_layer: true,
            back_uv_layer: true,
            glyph_uv_layer: true,
        }
    }

    pub const fn with_glyph(mut self) -> Self {
        self.glyph = true;
        self.glyph_uv_layer = true;
        self
    }

    pub(crate) fn samples_front(&self) -> bool {
        self.front && self.front_uv_layer
    }

    pub(crate) fn samples_back(&self) -> bool {
        self.back && self.back_uv_layer
    }
}

/// How a [`Material::BaseTexture`] picks its glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlyphMethod {
    /// Constant glyph; no texture sample.
    Static(GlyphIndex),
    /// Glyph index stored in the sample: `red | green << 8`.
    TextureIndex,
    /// Sample luminance mapped onto the ASCII density ramp.
    Luminance,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Material {
    StaticColorFront(Rgb),
    StaticColorBack(Rgb),
    StaticGlyph(GlyphIndex),
    StaticAll {
        front: Rgb,
        back: Rgb,
        glyph: GlyphIndex,
    },
    /// Front = (u, v, 0) scaled to bytes.
    DebugUV,
    /// Grey front from the layer's depth normalised over the frame.
    DebugDepth,
    /// Front = the three barycentric weights scaled to bytes.
    DebugWeights,
    BaseTexture {
        albedo: TextureId,
        /// Texture for glyph methods that sample; the albedo is used when absent.
        glyph_texture: Option<TextureId>,
        flags: BaseTextureFlags,
        glyph_method: GlyphMethod,
    },
    /// Earlier materials applied in order; later entries overwrite field by field.
    Combo(ArrayVec<MaterialId, MAX_COMBO_ENTRIES>),
}

impl Material {
    /// Build a combo from a slice of earlier material ids.
    pub fn combo(entries: &[MaterialId]) -> Result<Self> {
        let mut list = ArrayVec::new();
        for &id in entries {
            list.try_push(id).map_err(|_| RasterError::CapacityExceeded {
                store: "combo material",
                capacity: MAX_COMBO_ENTRIES,
            })?;
        }
        Ok(Material::Combo(list))
    }

    /// Texture-backed material that writes the albedo into the front colour.
    pub fn textured_front(albedo: TextureId) -> Self {
        Material::BaseTexture {
            albedo,
            glyph_texture: None,
            flags: BaseTextureFlags::front(),
            glyph_method: GlyphMethod::Static(glyph::GLYPH_SPACE),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Material::StaticColorFront(_) => "static_color_front",
            Material::StaticColorBack(_) => "static_color_back",
            Material::StaticGlyph(_) => "static_glyph",
            Material::StaticAll { .. } => "static_all",
            Material::DebugUV => "debug_uv",
            Material::DebugDepth => "debug_depth",
            Material::DebugWeights => "debug_weights",
            Material::BaseTexture { .. } => "base_texture",
            Material::Combo(_) => "combo",
        }
    }
}

fn check_glyph(index: GlyphIndex) -> Result<()> {
    if glyph::is_valid(index) {
        Ok(())
    } else {
        Err(RasterError::invalid(
            IdKind::Glyph,
            index as u32,
            glyph::GLYPH_COUNT as usize,
        ))
    }
}

/// Append-only material store with a fixed cap.
#[derive(Debug, Clone)]
pub struct MaterialStore {
    materials: Vec<Material>,
    capacity: usize,
}

impl MaterialStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            materials: Vec::new(),
            capacity,
        }
    }

    /// Validate and append a material.
    ///
    /// Texture ids must exist in `textures`; combo entries must name
    /// materials already in the store.
    pub fn add_material(&mut self, material: Material, textures: &TextureStore) -> Result<MaterialId> {
        if self.materials.len() >= self.capacity {
            return Err(RasterError::CapacityExceeded {
                store: "material store",
                capacity: self.capacity,
            });
        }
        self.validate(&material, textures)?;
        self.materials.push(material);
        Ok((self.materials.len() - 1) as MaterialId)
    }

    fn validate(&self, material: &Material, textures: &TextureStore) -> Result<()> {
        match material {
            Material::StaticGlyph(g) => check_glyph(*g),
            Material::StaticAll { glyph, .. } => check_glyph(*glyph),
            Material::BaseTexture {
                albedo,
                glyph_texture,
                glyph_method,
                ..
            } => {
                check_id(IdKind::Texture, *albedo, textures.len())?;
                if let Some(id) = glyph_texture {
                    check_id(IdKind::Texture, *id, textures.len())?;
                }
                if let GlyphMethod::Static(g) = glyph_method {
                    check_glyph(*g)?;
                }
                Ok(())
            }
            // The combo's own id is `len`, so "strictly earlier" is `id < len`.
            Material::Combo(entries) => entries
                .iter()
                .try_for_each(|&id| check_id(IdKind::Material, id, self.materials.len())),
            Material::StaticColorFront(_)
            | Material::StaticColorBack(_)
            | Material::DebugUV
            | Material::DebugDepth
            | Material::DebugWeights => Ok(()),
        }
    }

    pub fn get(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id as usize)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combo_may_only_reference_earlier_materials() {
        let textures = TextureStore::new(0);
        let mut store = MaterialStore::new(8);
        let back = store
            .add_material(Material::StaticColorBack(Rgb::new(10, 20, 30)), &textures)
            .unwrap();
        let glyph = store.add_material(Material::StaticGlyph(42), &textures).unwrap();

        let combo = Material::combo(&[back, glyph]).unwrap();
        assert_eq!(store.add_material(combo, &textures), Ok(2));

        // A combo naming itself (id 3) is rejected.
        let cyclic = Material::combo(&[0, 3]).unwrap();
        assert_eq!(
            store.add_material(cyclic, &textures),
            Err(RasterError::InvalidId {
                kind: IdKind::Material,
                id: 3,
                len: 3
            })
        );
    }

    #[test]
    fn combo_is_bounded() {
        let ids: Vec<MaterialId> = (0..(MAX_COMBO_ENTRIES as u32 + 1)).collect();
        assert!(matches!(
            Material::combo(&ids),
            Err(RasterError::CapacityExceeded { .. })
        ));
    }

    #[test]
    fn base_texture_requires_existing_textures() {
        let mut textures = TextureStore::new(2);
        let mut store = MaterialStore::new(4);
        assert!(matches!(
            store.add_material(Material::textured_front(0), &textures),
            Err(RasterError::InvalidId {
                kind: IdKind::Texture,
                ..
            })
        ));

        let tex = textures
            .add_texture(1, 1, vec![Rgb::WHITE], true, true)
            .unwrap();
        assert_eq!(store.add_material(Material::textured_front(tex), &textures), Ok(0));

        let bad_glyph_tex = Material::BaseTexture {
            albedo: tex,
            glyph_texture: Some(9),
            flags: BaseTextureFlags::all(),
            glyph_method: GlyphMethod::TextureIndex,
        };
        assert!(store.add_material(bad_glyph_tex, &textures).is_err());
    }

    #[test]
    fn glyph_indices_are_checked() {
        let textures = TextureStore::new(0);
        let mut store = MaterialStore::new(4);
        assert!(store
            .add_material(Material::StaticGlyph(glyph::GLYPH_COUNT), &textures)
            .is_err());
        assert!(store
            .add_material(Material::StaticGlyph(glyph::FULL_BLOCK), &textures)
            .is_ok());
    }

    #[test]
    fn store_enforces_capacity() {
        let textures = TextureStore::new(0);
        let mut store = MaterialStore::new(1);
        store.add_material(Material::DebugUV, &textures).unwrap();
        assert!(matches!(
            store.add_material(Material::DebugDepth, &textures),
            Err(RasterError::CapacityExceeded { .. })
        ));
    }
}
