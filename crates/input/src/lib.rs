//! Terminal input module.
//!
//! Maps `crossterm` key events onto [`crate::types::CameraAction`]s. The
//! mapping is stateless, so it works on terminals without key-release events.

pub mod map;

pub use termrast_types as types;

pub use map::{handle_key_event, should_quit};
