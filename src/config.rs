//! Viewer configuration, loaded from JSON.
//!
//! Every field has a default, so `{}` is a complete configuration:
//!
//! ```
//! use termrast::ViewerConfig;
//!
//! let cfg = ViewerConfig::from_json(r#"{ "fps": 15, "render": { "parallel": true } }"#).unwrap();
//! assert_eq!(cfg.fps, 15);
//! assert!(cfg.render.parallel);
//! assert_eq!(cfg.style.front, 6);
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::RenderConfig;
use crate::term::StyleBits;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub render: RenderConfig,
    pub style: StyleBits,
    /// Target frame rate of the viewer loop.
    pub fps: u32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            render: RenderConfig::default(),
            style: StyleBits::default(),
            fps: 30,
        }
    }
}

impl ViewerConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
