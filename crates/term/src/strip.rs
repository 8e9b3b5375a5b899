//! Strip emitter: turns canvas rows into styled text runs.
//!
//! Colours are bucketed to a configurable number of bits per channel before
//! they are looked up in the style cache, so nearby colours share one SGR
//! sequence and adjacent cells coalesce into longer runs.

use std::collections::HashMap;

use anyhow::Result;
use crossterm::{
    style::{Color, SetBackgroundColor, SetForegroundColor},
    QueueableCommand,
};
use serde::{Deserialize, Serialize};

use termrast_core::{CanvasCell, DrawingBuffer};
use termrast_types::{
    glyph, GlyphIndex, Rect, Rgb, DEFAULT_BACK_BITS, DEFAULT_FRONT_BITS, DEFAULT_GLYPH_BITS,
};

/// Bits kept per colour channel (front/back) and of the glyph index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleBits {
    pub front: u8,
    pub back: u8,
    pub glyph: u8,
}

impl Default for StyleBits {
    fn default() -> Self {
        Self {
            front: DEFAULT_FRONT_BITS,
            back: DEFAULT_BACK_BITS,
            glyph: DEFAULT_GLYPH_BITS,
        }
    }
}

impl StyleBits {
    /// Clamp colour bits to 1..=8 and glyph bits to 1..=16.
    pub fn clamped(self) -> Self {
        Self {
            front: self.front.clamp(1, 8),
            back: self.back.clamp(1, 8),
            glyph: self.glyph.clamp(1, 16),
        }
    }
}

/// Keep the top `bits` of a channel.
#[inline]
pub fn quantize_channel(v: u8, bits: u8) -> u8 {
    let shift = 8 - bits.clamp(1, 8);
    (v >> shift) << shift
}

#[inline]
pub fn quantize_rgb(c: Rgb, bits: u8) -> Rgb {
    Rgb::new(
        quantize_channel(c.r, bits),
        quantize_channel(c.g, bits),
        quantize_channel(c.b, bits),
    )
}

#[inline]
fn quantize_glyph(g: GlyphIndex, bits: u8) -> GlyphIndex {
    let shift = 16 - bits.clamp(1, 16) as u32;
    g.checked_shr(shift).map_or(0, |v| v << shift)
}

/// 64-bit style key: front in bits 0..24, back in 24..48, glyph in 48..64.
#[inline]
pub fn pack_key(front: Rgb, back: Rgb, glyph: GlyphIndex) -> u64 {
    let rgb = |c: Rgb| (c.r as u64) << 16 | (c.g as u64) << 8 | c.b as u64;
    rgb(front) | rgb(back) << 24 | (glyph as u64) << 48
}

pub type StyleId = u32;

/// A cached style with its precomputed escape sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedStyle {
    pub front: Rgb,
    pub back: Rgb,
    pub sgr: Vec<u8>,
}

/// Append-only map from style keys to ids and SGR bytes.
#[derive(Debug, Default, Clone)]
pub struct StyleCache {
    ids: HashMap<u64, StyleId>,
    styles: Vec<CachedStyle>,
}

impl StyleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id for the bucketed `(front, back, glyph)`, creating it on first use.
    pub fn intern(&mut self, front: Rgb, back: Rgb, glyph: GlyphIndex) -> Result<StyleId> {
        let key = pack_key(front, back, glyph);
        if let Some(&id) = self.ids.get(&key) {
            return Ok(id);
        }
        let mut sgr = Vec::with_capacity(40);
        sgr.queue(SetForegroundColor(to_color(front)))?;
        sgr.queue(SetBackgroundColor(to_color(back)))?;

        let id = self.styles.len() as StyleId;
        self.styles.push(CachedStyle { front, back, sgr });
        self.ids.insert(key, id);
        log::trace!("style cache: {} styles", self.styles.len());
        Ok(id)
    }

    pub fn get(&self, id: StyleId) -> Option<&CachedStyle> {
        self.styles.get(id as usize)
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}

fn to_color(c: Rgb) -> Color {
    Color::Rgb {
        r: c.r,
        g: c.g,
        b: c.b,
    }
}

/// Consecutive cells sharing one style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub style: StyleId,
    pub text: String,
}

/// One row of the crop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Strip {
    pub x: u16,
    pub y: u16,
    pub runs: Vec<Run>,
}

impl Strip {
    /// Cell count of the strip.
    pub fn width(&self) -> usize {
        self.runs.iter().map(|r| r.text.chars().count()).sum()
    }
}

/// Owns the style cache; one emitter per terminal.
#[derive(Debug, Clone, Default)]
pub struct StripEmitter {
    bits: StyleBits,
    cache: StyleCache,
}

impl StripEmitter {
    pub fn new(bits: StyleBits) -> Self {
        Self {
            bits: bits.clamped(),
            cache: StyleCache::new(),
        }
    }

    pub fn bits(&self) -> StyleBits {
        self.bits
    }

    pub fn styles(&self) -> &StyleCache {
        &self.cache
    }

    /// Emit one strip per row of `crop`, clipped to the buffer.
    pub fn emit(&mut self, drawing: &DrawingBuffer, crop: Rect) -> Result<Vec<Strip>> {
        let mut out = Vec::new();
        self.emit_into(drawing, crop, &mut out)?;
        Ok(out)
    }

    /// Like [`StripEmitter::emit`], reusing `out`.
    pub fn emit_into(&mut self, drawing: &DrawingBuffer, crop: Rect, out: &mut Vec<Strip>) -> Result<()> {
        out.clear();
        let crop = crop.clip_to(drawing.width(), drawing.height());
        if crop.is_empty() {
            return Ok(());
        }
        for y in crop.y..crop.bottom() {
            let row = drawing.row(y);
            let cells = &row[crop.x as usize..crop.right() as usize];
            let runs = self.row_runs(cells)?;
            out.push(Strip { x: crop.x, y, runs });
        }
        Ok(())
    }

    fn row_runs(&mut self, cells: &[CanvasCell]) -> Result<Vec<Run>> {
        let mut runs: Vec<Run> = Vec::new();
        for cell in cells {
            let style = self.style_of(cell)?;
            let ch = glyph::glyph_char(cell.glyph);
            match runs.last_mut() {
                Some(run) if run.style == style => run.text.push(ch),
                _ => runs.push(Run {
                    style,
                    text: ch.to_string(),
                }),
            }
        }
        Ok(runs)
    }

    fn style_of(&mut self, cell: &CanvasCell) -> Result<StyleId> {
        let front = quantize_rgb(cell.front, self.bits.front);
        let back = quantize_rgb(cell.back, self.bits.back);
        let glyph = quantize_glyph(cell.glyph, self.bits.glyph);
        self.cache.intern(front, back, glyph)
    }
}
