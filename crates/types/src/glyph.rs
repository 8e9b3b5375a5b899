//! Fixed glyph table.
//!
//! Canvas cells store a glyph *index*, not a `char`. The table is a fixed,
//! ordered concatenation of three families:
//!
//! | Range | Family | Characters |
//! |-------|--------|------------|
//! | 0..95 | printable ASCII | `' '..='~'` |
//! | 95..127 | block elements | U+2580..U+259F |
//! | 127..383 | Braille patterns | U+2800..U+28FF |
//!
//! Index 0 is the space character.

/// Index into the glyph table.
pub type GlyphIndex = u16;

/// Index of the space character.
pub const GLYPH_SPACE: GlyphIndex = 0;

/// Returned by [`find_by_char`] for characters outside the table.
pub const GLYPH_NOT_FOUND: GlyphIndex = u16::MAX;

const ASCII_FIRST: u32 = 0x20;
const ASCII_LEN: u16 = 95;

const BLOCK_FIRST: u32 = 0x2580;
const BLOCK_LEN: u16 = 32;

const BRAILLE_FIRST: u32 = 0x2800;
const BRAILLE_LEN: u16 = 256;

/// First index of the block-element family.
pub const BLOCK_START: GlyphIndex = ASCII_LEN;

/// First index of the Braille family.
pub const BRAILLE_START: GlyphIndex = ASCII_LEN + BLOCK_LEN;

/// Number of entries in the table.
pub const GLYPH_COUNT: GlyphIndex = ASCII_LEN + BLOCK_LEN + BRAILLE_LEN;

/// `▀`
pub const UPPER_HALF_BLOCK: GlyphIndex = BLOCK_START;
/// `▄`
pub const LOWER_HALF_BLOCK: GlyphIndex = BLOCK_START + 4;
/// `█`
pub const FULL_BLOCK: GlyphIndex = BLOCK_START + 8;

/// ASCII density ramp from empty to dense, used for luminance glyphs.
pub const DENSITY_RAMP: &[u8] = b" .:-=+*#%@";

/// Character at `index`, or a space when the index is outside the table.
pub fn glyph_char(index: GlyphIndex) -> char {
    let cp = if index < BLOCK_START {
        ASCII_FIRST + index as u32
    } else if index < BRAILLE_START {
        BLOCK_FIRST + (index - BLOCK_START) as u32
    } else if index < GLYPH_COUNT {
        BRAILLE_FIRST + (index - BRAILLE_START) as u32
    } else {
        ASCII_FIRST
    };
    char::from_u32(cp).unwrap_or(' ')
}

/// Look up a character, returning [`GLYPH_NOT_FOUND`] when it is not in the table.
pub fn find_by_char(ch: char) -> GlyphIndex {
    let cp = ch as u32;
    if (ASCII_FIRST..ASCII_FIRST + ASCII_LEN as u32).contains(&cp) {
        (cp - ASCII_FIRST) as GlyphIndex
    } else if (BLOCK_FIRST..BLOCK_FIRST + BLOCK_LEN as u32).contains(&cp) {
        BLOCK_START + (cp - BLOCK_FIRST) as GlyphIndex
    } else if (BRAILLE_FIRST..BRAILLE_FIRST + BRAILLE_LEN as u32).contains(&cp) {
        BRAILLE_START + (cp - BRAILLE_FIRST) as GlyphIndex
    } else {
        GLYPH_NOT_FOUND
    }
}

/// Look up a character, mapping unknown characters to the space glyph.
pub fn glyph_index(ch: char) -> GlyphIndex {
    match find_by_char(ch) {
        GLYPH_NOT_FOUND => GLYPH_SPACE,
        index => index,
    }
}

/// Braille glyph with the given dot mask (bit 0 = dot 1 ... bit 7 = dot 8).
pub fn braille(dots: u8) -> GlyphIndex {
    BRAILLE_START + dots as GlyphIndex
}

/// Whether `index` refers to an entry of the table.
pub fn is_valid(index: GlyphIndex) -> bool {
    index < GLYPH_COUNT
}

/// Map a luminance in [0, 1] onto [`DENSITY_RAMP`].
pub fn density_glyph(luma: f32) -> GlyphIndex {
    let luma = if luma.is_finite() {
        luma.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let last = DENSITY_RAMP.len() - 1;
    let slot = (luma * last as f32).round() as usize;
    glyph_index(DENSITY_RAMP[slot.min(last)] as char)
}
