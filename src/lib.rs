//! termrast (workspace facade crate).
//!
//! Re-exports the workspace crates under one name so hosts and integration
//! tests can use `termrast::{core,input,scene,term,types}` while the
//! implementation lives in dedicated crates under `crates/`.

pub mod config;

pub use termrast_core as core;
pub use termrast_input as input;
pub use termrast_scene as scene;
pub use termrast_term as term;
pub use termrast_types as types;

pub use config::ViewerConfig;
