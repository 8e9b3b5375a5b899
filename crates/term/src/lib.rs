//! Terminal host for the rasterizer.
//!
//! The core writes into a canvas of cells; this crate turns canvas rows into
//! styled strips and flushes them to a terminal through crossterm.
//!
//! Goals:
//! - Keep `core` headless and testable
//! - Keep escape-sequence encoding pure so it can be tested without a tty
//! - Redraw only rows that changed since the previous frame

pub mod renderer;
pub mod strip;
pub mod throttle;

pub use termrast_core as core;
pub use termrast_types as types;

pub use renderer::{encode_diff_into, encode_strips_into, TerminalRenderer};
pub use strip::{
    pack_key, quantize_channel, quantize_rgb, CachedStyle, Run, Strip, StripEmitter, StyleBits,
    StyleCache, StyleId,
};
pub use throttle::FrameClock;
