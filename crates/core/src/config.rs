//! Renderer configuration.
//!
//! All fields have defaults, so a partial JSON document (or none at all) is a
//! valid configuration.

use serde::{Deserialize, Serialize};

use crate::drawing::CanvasCell;
use crate::types::{GlyphIndex, Rgb, DEFAULT_CLEAR_DEPTH};

/// Per-store record caps. Stores reject records past their cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Capacities {
    pub textures: usize,
    pub materials: usize,
    pub vertices_3d: usize,
    pub vertices_2d: usize,
    pub uv_triples: usize,
    pub triangles: usize,
    pub nodes: usize,
    pub geometries: usize,
    pub primitives: usize,
}

impl Default for Capacities {
    fn default() -> Self {
        Self {
            textures: 64,
            materials: 256,
            vertices_3d: 16 * 1024,
            vertices_2d: 16 * 1024,
            uv_triples: 16 * 1024,
            triangles: 16 * 1024,
            nodes: 1024,
            geometries: 4096,
            primitives: 32 * 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Drawing buffer width in cells.
    pub width: u16,
    /// Drawing buffer height in cells.
    pub height: u16,
    /// Depth reported by empty layers; fragments farther than this are dropped.
    pub clear_depth: f32,
    pub clear_front: Rgb,
    pub clear_back: Rgb,
    pub clear_glyph: GlyphIndex,
    pub capacities: Capacities,
    /// Run the material applier on the rayon pool.
    pub parallel: bool,
    /// Log every dropped primitive at debug level.
    pub log_dropped: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 80,
            height: 24,
            clear_depth: DEFAULT_CLEAR_DEPTH,
            clear_front: Rgb::new(220, 220, 220),
            clear_back: Rgb::BLACK,
            clear_glyph: 0,
            capacities: Capacities::default(),
            parallel: false,
            log_dropped: false,
        }
    }
}

impl RenderConfig {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn with_clear_depth(mut self, clear_depth: f32) -> Self {
        self.clear_depth = clear_depth;
        self
    }

    pub fn with_clear_cell(mut self, cell: CanvasCell) -> Self {
        self.clear_front = cell.front;
        self.clear_back = cell.back;
        self.clear_glyph = cell.glyph;
        self
    }

    pub fn with_capacities(mut self, capacities: Capacities) -> Self {
        self.capacities = capacities;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn clear_cell(&self) -> CanvasCell {
        CanvasCell {
            front: self.clear_front,
            back: self.clear_back,
            glyph: self.clear_glyph,
        }
    }
}
