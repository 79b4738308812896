use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::SketchError;

/// Sketch settings, usually read from `<sketch>.toml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SketchConfig {
    pub width: u32,
    pub height: u32,
    pub frame_rate: f64,
    /// Fixed seed for `random`, `randomGaussian` and `noise`.
    pub seed: Option<u64>,
    /// Directory `loadImage`, `loadFont` and `loadStrings` resolve against.
    pub library_root: PathBuf,
}

impl Default for SketchConfig {
    fn default() -> Self {
        Self {
            width: 100,
            height: 100,
            frame_rate: 60.0,
            seed: None,
            library_root: PathBuf::from("."),
        }
    }
}

impl SketchConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, SketchError> {
        let config: Self = toml::from_str(text).map_err(|e| SketchError::Config(e.to_string()))?;
        if !(config.frame_rate > 0.0) {
            return Err(SketchError::Config(format!("frame_rate must be positive, got {}", config.frame_rate)));
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, SketchError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Frame interval in milliseconds.
    pub fn interval_ms(&self) -> f64 {
        1000.0 / self.frame_rate
    }
}
