use crate::camera::SceneCamera;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Top-level runtime configuration, loaded from JSON. Every field has a
/// default matching the built-in presentation, so a partial file only
/// overrides what it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub shadow: ShadowConfig,
    pub audio: AudioConfig,
    pub environment: EnvironmentPreset,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Upper bound on the HiDPI scale the offscreen target honors
    pub max_scale_factor: f32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "hero-shapes".to_string(),
            width: 1280,
            height: 720,
            max_scale_factor: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub fov_y_deg: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 25.0],
            fov_y_deg: 30.0,
            near: 1.0,
            far: 40.0,
        }
    }
}

impl CameraConfig {
    pub fn to_camera(&self) -> SceneCamera {
        SceneCamera {
            position: Vec3::from_array(self.position),
            fov_y_deg: self.fov_y_deg,
            near: self.near,
            far: self.far,
        }
    }
}

/// Soft blob shadows under the shapes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowConfig {
    /// Height of the receiving plane
    pub height: f32,
    pub opacity: f32,
    /// Side length of the receiving plane
    pub span: f32,
    pub blur: f32,
    /// Shapes further above the plane than this cast nothing
    pub reach: f32,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            height: -3.5,
            opacity: 0.65,
            span: 40.0,
            blur: 1.0,
            reach: 9.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub enabled: bool,
    pub volume: f32,
    pub sound_dir: PathBuf,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            volume: 1.0,
            sound_dir: PathBuf::from("assets/sounds"),
        }
    }
}

/// Lighting rig preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentPreset {
    /// Three-point softbox rig with a cool fill
    #[default]
    Studio,
    /// Ambient term only
    Flat,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Load `path` when given, falling back to defaults on any failure so
    /// a bad config file never blocks the window from opening
    pub fn load_or_default(path: Option<&Path>) -> Self {
        match path {
            Some(path) => match Self::load(path) {
                Ok(config) => {
                    log::info!("loaded config from {}", path.display());
                    config
                }
                Err(err) => {
                    log::warn!("config {} unusable: {err}; using defaults", path.display());
                    Self::default()
                }
            },
            None => Self::default(),
        }
    }
}
