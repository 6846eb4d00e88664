//! Canvas configuration.

use crate::expiry::{DEFAULT_STROKE_TTL, DEFAULT_TICK_INTERVAL};
use crate::viewport::CoordinateSpace;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Logical resolution of the school canvas.
pub const SCHOOL_CANVAS_WIDTH: f64 = 900.0;
pub const SCHOOL_CANVAS_HEIGHT: f64 = 520.0;

/// Brand orange used for ink and the wall watermark.
pub const DICE_ORANGE: &str = "#ff6a00";

/// Near-black canvas background.
pub const CANVAS_BACKGROUND: &str = "#0b0b0c";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Large faint text drawn behind the strokes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatermarkConfig {
    pub text: String,
    /// `#rrggbb` or `#rrggbbaa`.
    pub color: String,
    pub opacity: f32,
    /// Font size in canvas units.
    pub font_size: f32,
    /// CSS-style font family list.
    pub font_family: String,
    /// CSS font weight, 100-900.
    pub font_weight: f32,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            text: "DICE".to_string(),
            color: DICE_ORANGE.to_string(),
            opacity: 0.12,
            font_size: 200.0,
            font_family: "Helvetica Neue, Helvetica, Arial, sans-serif".to_string(),
            font_weight: 900.0,
        }
    }
}

/// How a canvas looks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub stroke_color: String,
    /// Line width in canvas units.
    pub stroke_width: f64,
    pub background: String,
    pub watermark: Option<WatermarkConfig>,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            stroke_color: DICE_ORANGE.to_string(),
            stroke_width: 2.0,
            background: CANVAS_BACKGROUND.to_string(),
            watermark: None,
        }
    }
}

/// The public wall.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WallConfig {
    /// Stroke lifetime in milliseconds.
    pub ttl_ms: u64,
    /// Expiry polling interval in milliseconds.
    pub tick_ms: u64,
    pub style: StyleConfig,
}

impl Default for WallConfig {
    fn default() -> Self {
        Self {
            ttl_ms: DEFAULT_STROKE_TTL.as_millis() as u64,
            tick_ms: DEFAULT_TICK_INTERVAL.as_millis() as u64,
            style: StyleConfig {
                stroke_width: 3.0,
                watermark: Some(WatermarkConfig::default()),
                ..StyleConfig::default()
            },
        }
    }
}

impl WallConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

/// Per-school annotation canvases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchoolConfig {
    pub logical_width: f64,
    pub logical_height: f64,
    pub style: StyleConfig,
}

impl Default for SchoolConfig {
    fn default() -> Self {
        Self {
            logical_width: SCHOOL_CANVAS_WIDTH,
            logical_height: SCHOOL_CANVAS_HEIGHT,
            style: StyleConfig::default(),
        }
    }
}

impl SchoolConfig {
    pub fn coordinate_space(&self) -> CoordinateSpace {
        CoordinateSpace::Logical {
            width: self.logical_width,
            height: self.logical_height,
        }
    }
}

/// Configuration for both canvas kinds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub wall: WallConfig,
    pub school: SchoolConfig,
}

impl CanvasConfig {
    /// Parse from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Read from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_wall_and_school() {
        let config = CanvasConfig::default();
        assert_eq!(config.wall.ttl(), Duration::from_secs(10));
        assert_eq!(config.wall.tick_interval(), Duration::from_millis(500));
        assert_eq!(config.wall.style.stroke_width, 3.0);
        assert!(config.wall.style.watermark.is_some());
        assert_eq!(config.school.style.stroke_width, 2.0);
        assert!(config.school.style.watermark.is_none());
        assert_eq!(
            config.school.coordinate_space(),
            CoordinateSpace::Logical { width: 900.0, height: 520.0 }
        );
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = CanvasConfig::from_json(r#"{"wall":{"ttl_ms":3000}}"#).unwrap();
        assert_eq!(config.wall.ttl(), Duration::from_secs(3));
        assert_eq!(config.wall.tick_ms, 500);
        assert_eq!(config.school, SchoolConfig::default());
    }

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("canvas.json");

        let mut config = CanvasConfig::default();
        config.school.style.stroke_color = "#00ff00".to_string();
        std::fs::write(&path, config.to_json().unwrap()).unwrap();

        assert_eq!(CanvasConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_load_missing_file() {
        let err = CanvasConfig::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
