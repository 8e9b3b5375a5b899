//! Drawing buffer: two depth layers per cell plus the output canvas.
//!
//! Storage is split into planes. `depth` and `slots` are indexed by cell;
//! `pix` holds two [`PixInfo`] records per cell at `2 * cell + slot`, and
//! `slots[cell][layer]` says which record backs each layer. A closer fragment
//! rolls the slots instead of copying the front record into the back.

use serde::{Deserialize, Serialize};

use crate::types::{GeometryId, GlyphIndex, MaterialId, NodeId, PrimitiveId, Rgb, INVALID_ID};

pub const FRONT: usize = 0;
pub const BACK: usize = 1;

/// One output cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanvasCell {
    pub front: Rgb,
    pub back: Rgb,
    pub glyph: GlyphIndex,
}

impl Default for CanvasCell {
    fn default() -> Self {
        Self {
            front: Rgb::WHITE,
            back: Rgb::BLACK,
            glyph: 0,
        }
    }
}

/// Per-layer fragment payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixInfo {
    pub weights: [f32; 3],
    pub corrected: [f32; 3],
    pub node_id: NodeId,
    pub geometry_id: GeometryId,
    pub material_id: MaterialId,
    pub primitive_id: PrimitiveId,
}

impl PixInfo {
    pub const EMPTY: PixInfo = PixInfo {
        weights: [0.0; 3],
        corrected: [0.0; 3],
        node_id: INVALID_ID,
        geometry_id: INVALID_ID,
        material_id: INVALID_ID,
        primitive_id: INVALID_ID,
    };

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.primitive_id == INVALID_ID
    }
}

/// A candidate write produced by the rasterizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fragment {
    pub depth: f32,
    pub info: PixInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellState {
    Empty,
    OneLayer,
    TwoLayers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Became the front layer; the old front (if any) is now the back.
    Front,
    /// Became the back layer.
    Back,
    Rejected,
}

/// Read view of one layer at one cell.
#[derive(Debug, Clone, Copy)]
pub struct LayerRef<'a> {
    pub depth: f32,
    pub info: &'a PixInfo,
}

/// Read-only view of the depth layers, usable while the canvas is borrowed mutably.
#[derive(Debug, Clone, Copy)]
pub struct LayerPlanes<'a> {
    depth: &'a [[f32; 2]],
    slots: &'a [[u8; 2]],
    pix: &'a [PixInfo],
}

impl<'a> LayerPlanes<'a> {
    /// Layer `layer` (0 front, 1 back) at linear cell `index`; `None` when empty.
    #[inline]
    pub fn layer(&self, index: usize, layer: usize) -> Option<LayerRef<'a>> {
        let slot = self.slots[index][layer] as usize;
        let info = &self.pix[2 * index + slot];
        if info.is_empty() {
            None
        } else {
            Some(LayerRef {
                depth: self.depth[index][layer],
                info,
            })
        }
    }

    /// Min and max depth of a layer over all cells where it is written.
    pub fn depth_range(&self, layer: usize) -> Option<(f32, f32)> {
        (0..self.depth.len())
            .filter_map(|i| self.layer(i, layer))
            .fold(None, |acc, l| match acc {
                None => Some((l.depth, l.depth)),
                Some((lo, hi)) => Some((lo.min(l.depth), hi.max(l.depth))),
            })
    }

    pub fn len(&self) -> usize {
        self.depth.len()
    }

    pub fn is_empty(&self) -> bool {
        self.depth.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct DrawingBuffer {
    width: u16,
    height: u16,
    clear_depth: f32,
    clear_cell: CanvasCell,
    depth: Vec<[f32; 2]>,
    slots: Vec<[u8; 2]>,
    pix: Vec<PixInfo>,
    canvas: Vec<CanvasCell>,
}

impl DrawingBuffer {
    pub fn new(width: u16, height: u16, clear_depth: f32, clear_cell: CanvasCell) -> Self {
        let cells = width as usize * height as usize;
        Self {
            width,
            height,
            clear_depth,
            clear_cell,
            depth: vec![[clear_depth; 2]; cells],
            slots: vec![[0, 1]; cells],
            pix: vec![PixInfo::EMPTY; cells * 2],
            canvas: vec![clear_cell; cells],
        }
    }

    /// Reallocate for a new size. All layers and the canvas are cleared.
    pub fn resize(&mut self, width: u16, height: u16) {
        let cells = width as usize * height as usize;
        self.width = width;
        self.height = height;
        self.depth.resize(cells, [self.clear_depth; 2]);
        self.slots.resize(cells, [0, 1]);
        self.pix.resize(cells * 2, PixInfo::EMPTY);
        self.canvas.resize(cells, self.clear_cell);
        self.clear();
    }

    /// Reset both layers and the canvas to the clear values. Does not allocate.
    pub fn clear(&mut self) {
        self.depth.fill([self.clear_depth; 2]);
        self.slots.fill([0, 1]);
        self.pix.fill(PixInfo::EMPTY);
        self.canvas.fill(self.clear_cell);
    }

    pub fn set_clear_cell(&mut self, cell: CanvasCell) {
        self.clear_cell = cell;
    }

    #[inline]
    pub fn index(&self, x: u16, y: u16) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    pub fn cell_state(&self, index: usize) -> CellState {
        let planes = self.layers();
        match (planes.layer(index, FRONT), planes.layer(index, BACK)) {
            (None, _) => CellState::Empty,
            (Some(_), None) => CellState::OneLayer,
            (Some(_), Some(_)) => CellState::TwoLayers,
        }
    }

    /// Offer a fragment to a cell.
    ///
    /// Lower depth wins; bit-equal depths go to the lower primitive id. A
    /// fragment that beats the front pushes the old front into the back layer
    /// and the old back is discarded.
    #[inline]
    pub fn write(&mut self, index: usize, frag: &Fragment) -> WriteOutcome {
        let [s0, s1] = self.slots[index];
        let front = self.pix[2 * index + s0 as usize];
        let back = self.pix[2 * index + s1 as usize];
        let [d0, d1] = self.depth[index];
        let z = frag.depth;
        let id = frag.info.primitive_id;

        if front.is_empty() || wins(z, id, d0, front.primitive_id) {
            if !front.is_empty() {
                self.slots[index] = [s1, s0];
                self.depth[index] = [z, d0];
            } else {
                self.depth[index][FRONT] = z;
            }
            // The payload lands in whichever record is now the front.
            let slot = self.slots[index][FRONT] as usize;
            self.pix[2 * index + slot] = frag.info;
            WriteOutcome::Front
        } else if back.is_empty() || wins(z, id, d1, back.primitive_id) {
            self.depth[index][BACK] = z;
            self.pix[2 * index + s1 as usize] = frag.info;
            WriteOutcome::Back
        } else {
            WriteOutcome::Rejected
        }
    }

    /// Layer `layer` at `(x, y)`; `None` when out of range or empty.
    pub fn layer(&self, x: u16, y: u16, layer: usize) -> Option<LayerRef<'_>> {
        let index = self.index(x, y)?;
        self.layers().layer(index, layer)
    }

    /// Record backing a layer at `(x, y)`, returned even when the layer is empty.
    pub fn pix_info(&self, x: u16, y: u16, layer: usize) -> Option<&PixInfo> {
        let index = self.index(x, y)?;
        let slot = self.slots[index][layer] as usize;
        Some(&self.pix[2 * index + slot])
    }

    /// Depth of a layer, reporting the clear depth when empty.
    pub fn depth_at(&self, x: u16, y: u16, layer: usize) -> Option<f32> {
        self.index(x, y).map(|i| self.depth[i][layer])
    }

    pub fn layers(&self) -> LayerPlanes<'_> {
        LayerPlanes {
            depth: &self.depth,
            slots: &self.slots,
            pix: &self.pix,
        }
    }

    pub fn depth_range(&self, layer: usize) -> Option<(f32, f32)> {
        self.layers().depth_range(layer)
    }

    /// Split into read-only layers and the mutable canvas.
    pub fn planes_mut(&mut self) -> (LayerPlanes<'_>, &mut [CanvasCell]) {
        (
            LayerPlanes {
                depth: &self.depth,
                slots: &self.slots,
                pix: &self.pix,
            },
            &mut self.canvas,
        )
    }

    pub fn cell(&self, x: u16, y: u16) -> Option<&CanvasCell> {
        self.index(x, y).map(|i| &self.canvas[i])
    }

    pub fn canvas(&self) -> &[CanvasCell] {
        &self.canvas
    }

    /// One canvas row.
    pub fn row(&self, y: u16) -> &[CanvasCell] {
        let w = self.width as usize;
        let start = y as usize * w;
        self.canvas.get(start..start + w).unwrap_or(&[])
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn clear_depth(&self) -> f32 {
        self.clear_depth
    }

    pub fn clear_cell(&self) -> CanvasCell {
        self.clear_cell
    }
}

#[inline]
fn wins(z: f32, id: PrimitiveId, depth: f32, other: PrimitiveId) -> bool {
    z < depth || (z.to_bits() == depth.to_bits() && id < other)
}
