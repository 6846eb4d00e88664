//! Application configuration.

use dice_core::access::{SchoolId, UserId};
use dice_core::config::{CanvasConfig, ConfigError, StyleConfig};
use dice_core::controller::CanvasMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the JSON config file.
pub const CONFIG_ENV: &str = "DICE_CONFIG";

/// Which canvas the window shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum CanvasSelection {
    #[default]
    Wall,
    School { school_id: SchoolId },
}

impl CanvasSelection {
    pub fn mode(&self) -> CanvasMode {
        match *self {
            CanvasSelection::Wall => CanvasMode::Ephemeral,
            CanvasSelection::School { school_id } => CanvasMode::Persistent { school_id },
        }
    }
}

/// The signed-in viewer, standing in for the identity service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub user_id: Option<UserId>,
    /// School recorded on the viewer's profile.
    pub school_id: Option<SchoolId>,
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub canvas: CanvasSelection,
    pub session: SessionConfig,
    /// Where school canvases are stored. Defaults to the platform data dir.
    pub storage_dir: Option<PathBuf>,
    pub canvases: CanvasConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "DICE".to_string(),
            width: 1280,
            height: 800,
            canvas: CanvasSelection::default(),
            session: SessionConfig::default(),
            storage_dir: None,
            canvases: CanvasConfig::default(),
        }
    }
}

impl AppConfig {
    /// Read from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Load from the file named by `DICE_CONFIG`, or use defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => {
                let path = PathBuf::from(path);
                log::info!("Loading configuration from {}", path.display());
                Self::load(&path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Style of the selected canvas.
    pub fn style(&self) -> &StyleConfig {
        match self.canvas {
            CanvasSelection::Wall => &self.canvases.wall.style,
            CanvasSelection::School { .. } => &self.canvases.school.style,
        }
    }
}
