//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used throughout the rasterizer.
//! All types are pure data structures with no required dependencies, making
//! them usable in any context (pipeline core, terminal host, scene graph).
//!
//! # Identifiers
//!
//! Every cross-store reference is a plain integer id. Stores hand ids out
//! sequentially and never reuse them, so an id stays valid for the lifetime
//! of the store that issued it.
//!
//! | Alias | Issued by |
//! |-------|-----------|
//! | `TextureId` | texture store |
//! | `MaterialId` | material store |
//! | `NodeId` | transform pack (slot 0 is the identity node) |
//! | `GeometryId` | geometry buffer (id 0 is the background sentinel) |
//! | `PrimitiveId` | primitive buffer, reassigned from 0 every frame |
//!
//! # Pipeline Defaults
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `DEFAULT_CLEAR_DEPTH` | 1000.0 | Depth reported by empty layers |
//! | `DEFAULT_FRONT_BITS` | 6 | Style-cache bits per front channel |
//! | `DEFAULT_BACK_BITS` | 6 | Style-cache bits per back channel |
//! | `DEFAULT_GLYPH_BITS` | 16 | Style-cache bits for the glyph index |
//! | `MAX_COMBO_ENTRIES` | 8 | Materials one combo can chain |
//!
//! # Examples
//!
//! ```
//! use termrast_types::{glyph, CameraAction, Rgb, ScaleMode};
//!
//! // Glyph indices are stable: index 0 is always a space.
//! assert_eq!(glyph::glyph_char(0), ' ');
//! assert_eq!(glyph::glyph_index('A'), 33);
//!
//! // Parse a scale mode (case-insensitive)
//! assert_eq!(ScaleMode::from_str("fit"), Some(ScaleMode::Fit));
//!
//! // Parse a camera action
//! assert_eq!(CameraAction::from_str("yawLeft"), Some(CameraAction::YawLeft));
//!
//! assert_eq!(Rgb::from_unit(1.0, 0.5, 0.0), Rgb::new(255, 128, 0));
//! ```

pub mod glyph;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use glyph::GlyphIndex;

/// Texture store index.
pub type TextureId = u32;

/// Material store index.
pub type MaterialId = u32;

/// Transform pack slot for one scene node.
pub type NodeId = u32;

/// Geometry buffer index.
pub type GeometryId = u32;

/// Per-frame primitive index.
pub type PrimitiveId = u32;

/// Sentinel for "no id" in any of the id spaces above.
pub const INVALID_ID: u32 = u32::MAX;

/// Depth reported by an empty depth layer.
pub const DEFAULT_CLEAR_DEPTH: f32 = 1000.0;

/// Default style-cache bit budget per front colour channel.
pub const DEFAULT_FRONT_BITS: u8 = 6;

/// Default style-cache bit budget per back colour channel.
pub const DEFAULT_BACK_BITS: u8 = 6;

/// Default style-cache bit budget for glyph indices (full resolution).
pub const DEFAULT_GLYPH_BITS: u8 = 16;

/// Maximum number of entries in a combo material.
pub const MAX_COMBO_ENTRIES: usize = 8;

/// 24-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build a color from unit-range channels, clamping and rounding each.
    ///
    /// Non-finite channels map to 0.
    pub fn from_unit(r: f32, g: f32, b: f32) -> Self {
        Self {
            r: unit_to_byte(r),
            g: unit_to_byte(g),
            b: unit_to_byte(b),
        }
    }

    /// Relative luminance in [0, 1] (Rec. 709 weights).
    pub fn luminance(&self) -> f32 {
        (0.2126 * self.r as f32 + 0.7152 * self.g as f32 + 0.0722 * self.b as f32) / 255.0
    }
}

#[inline]
fn unit_to_byte(v: f32) -> u8 {
    if !v.is_finite() {
        return 0;
    }
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Axis-aligned rectangle of cells (crop region for strip emission).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Rect {
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle covering a whole `width x height` grid.
    pub const fn full(width: u16, height: u16) -> Self {
        Self::new(0, 0, width, height)
    }

    /// One past the last column.
    pub fn right(&self) -> u16 {
        self.x.saturating_add(self.width)
    }

    /// One past the last row.
    pub fn bottom(&self) -> u16 {
        self.y.saturating_add(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Clip to a `width x height` grid anchored at the origin.
    pub fn clip_to(&self, width: u16, height: u16) -> Rect {
        let x = self.x.min(width);
        let y = self.y.min(height);
        Rect {
            x,
            y,
            width: self.right().min(width) - x,
            height: self.bottom().min(height) - y,
        }
    }
}

/// How the 2D view maps its design size onto the screen.
///
/// - **Fit**: uniform scale, whole design visible (letterbox)
/// - **Fill**: uniform scale, screen fully covered (crop)
/// - **Stretch**: independent scale per axis (ignores aspect)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ScaleMode {
    #[default]
    Fit,
    Fill,
    Stretch,
}

impl ScaleMode {
    /// Parse scale mode from string (case-insensitive)
    ///
    /// # Examples
    ///
    /// ```
    /// use termrast_types::ScaleMode;
    ///
    /// assert_eq!(ScaleMode::from_str("FILL"), Some(ScaleMode::Fill));
    /// assert_eq!(ScaleMode::from_str("stretch"), Some(ScaleMode::Stretch));
    /// assert_eq!(ScaleMode::from_str("zoom"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "fit" => Some(ScaleMode::Fit),
            "fill" => Some(ScaleMode::Fill),
            "stretch" => Some(ScaleMode::Stretch),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScaleMode::Fit => "fit",
            ScaleMode::Fill => "fill",
            ScaleMode::Stretch => "stretch",
        }
    }

    /// Next mode in the cycle Fit → Fill → Stretch → Fit.
    pub fn cycle(&self) -> Self {
        match self {
            ScaleMode::Fit => ScaleMode::Fill,
            ScaleMode::Fill => ScaleMode::Stretch,
            ScaleMode::Stretch => ScaleMode::Fit,
        }
    }
}

/// Coordinate-system handedness of the 3D camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Handedness {
    Left,
    #[default]
    Right,
}

/// Camera actions that the terminal host can apply between frames
///
/// These actions are produced by key mapping and consumed by the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraAction {
    /// Turn left around the vertical axis
    YawLeft,
    /// Turn right around the vertical axis
    YawRight,
    /// Tilt the view up
    PitchUp,
    /// Tilt the view down
    PitchDown,
    /// Move the eye along the view direction
    MoveForward,
    /// Move the eye against the view direction
    MoveBack,
    /// Move the eye sideways (left)
    StrafeLeft,
    /// Move the eye sideways (right)
    StrafeRight,
    /// Magnify the 2D view
    ZoomIn,
    /// Shrink the 2D view
    ZoomOut,
    /// Switch to the next 2D scale mode
    CycleScaleMode,
    /// Restore the initial camera pose
    Reset,
}

impl CameraAction {
    /// Parse action from string
    ///
    /// # Examples
    ///
    /// ```
    /// use termrast_types::CameraAction;
    ///
    /// assert_eq!(CameraAction::from_str("moveForward"), Some(CameraAction::MoveForward));
    /// assert_eq!(CameraAction::from_str("zoomout"), Some(CameraAction::ZoomOut));
    /// assert_eq!(CameraAction::from_str("unknown"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "yawleft" => Some(CameraAction::YawLeft),
            "yawright" => Some(CameraAction::YawRight),
            "pitchup" => Some(CameraAction::PitchUp),
            "pitchdown" => Some(CameraAction::PitchDown),
            "moveforward" => Some(CameraAction::MoveForward),
            "moveback" => Some(CameraAction::MoveBack),
            "strafeleft" => Some(CameraAction::StrafeLeft),
            "straferight" => Some(CameraAction::StrafeRight),
            "zoomin" => Some(CameraAction::ZoomIn),
            "zoomout" => Some(CameraAction::ZoomOut),
            "cyclescalemode" => Some(CameraAction::CycleScaleMode),
            "reset" => Some(CameraAction::Reset),
            _ => None,
        }
    }

    /// Convert to camelCase string
    pub fn as_str(&self) -> &'static str {
        match self {
            CameraAction::YawLeft => "yawLeft",
            CameraAction::YawRight => "yawRight",
            CameraAction::PitchUp => "pitchUp",
            CameraAction::PitchDown => "pitchDown",
            CameraAction::MoveForward => "moveForward",
            CameraAction::MoveBack => "moveBack",
            CameraAction::StrafeLeft => "strafeLeft",
            CameraAction::StrafeRight => "strafeRight",
            CameraAction::ZoomIn => "zoomIn",
            CameraAction::ZoomOut => "zoomOut",
            CameraAction::CycleScaleMode => "cycleScaleMode",
            CameraAction::Reset => "reset",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_defaults() {
        assert_eq!(DEFAULT_CLEAR_DEPTH, 1000.0);
        assert_eq!(DEFAULT_FRONT_BITS, 6);
        assert_eq!(DEFAULT_BACK_BITS, 6);
        assert_eq!(DEFAULT_GLYPH_BITS, 16);
        assert_eq!(MAX_COMBO_ENTRIES, 8);
    }

    #[test]
    fn from_unit_clamps_and_rounds() {
        assert_eq!(Rgb::from_unit(-1.0, 2.0, 0.5), Rgb::new(0, 255, 128));
        assert_eq!(Rgb::from_unit(f32::NAN, 0.0, 1.0), Rgb::new(0, 0, 255));
    }

    #[test]
    fn rect_clip_to_grid() {
        let r = Rect::new(2, 3, 10, 10).clip_to(8, 6);
        assert_eq!(r, Rect::new(2, 3, 6, 3));

        let outside = Rect::new(20, 20, 4, 4).clip_to(8, 6);
        assert!(outside.is_empty());
    }

    #[test]
    fn camera_action_round_trips_names() {
        for action in [
            CameraAction::YawLeft,
            CameraAction::PitchDown,
            CameraAction::StrafeRight,
            CameraAction::CycleScaleMode,
            CameraAction::Reset,
        ] {
            assert_eq!(CameraAction::from_str(action.as_str()), Some(action));
        }
    }

    #[test]
    fn scale_mode_cycles_through_all_modes() {
        let start = ScaleMode::Fit;
        assert_eq!(start.cycle(), ScaleMode::Fill);
        assert_eq!(start.cycle().cycle(), ScaleMode::Stretch);
        assert_eq!(start.cycle().cycle().cycle(), ScaleMode::Fit);
    }
}
