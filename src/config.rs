//! Application settings.
//!
//! Read from an optional JSON file. Every field has a default, so a file only
//! needs the keys it changes:
//!
//! ```json
//! {
//!   "startup_preset": "Cloth",
//!   "seed": 42,
//!   "fixed_delta": 0.016666668
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::particles::MAX_PARTICLES;
use crate::presets::Preset;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "playground.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub window_width: u32,
    pub window_height: u32,
    /// Directory logical asset paths are resolved against.
    pub asset_root: PathBuf,
    pub startup_preset: Preset,
    /// Seed for particle spawning.
    pub seed: u64,
    /// Pool capacity for free-mode presets.
    pub capacity: usize,
    /// Constant simulation delta instead of wall-clock time.
    pub fixed_delta: Option<f32>,
    /// OBJ used by the mesh-surface preset.
    pub mesh_path: String,
    /// OBJ drawn for sphere colliders.
    pub sphere_mesh_path: String,
    /// Replaces every preset's own texture.
    pub particle_texture: Option<String>,
    /// Write the session's input to this file on exit.
    pub record_path: Option<PathBuf>,
    /// Replay a recorded session instead of live input.
    pub playback_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 720,
            asset_root: PathBuf::from("data"),
            startup_preset: Preset::SphereBurst,
            seed: 0x5eed,
            capacity: MAX_PARTICLES,
            fixed_delta: None,
            mesh_path: "models/surface.obj".to_string(),
            sphere_mesh_path: "models/sphere.obj".to_string(),
            particle_texture: None,
            record_path: None,
            playback_path: None,
        }
    }
}

impl AppConfig {
    /// Load `path`, or defaults if the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{ "startup_preset": "Cloth", "seed": 42, "fixed_delta": 0.02 }"#).unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.startup_preset, Preset::Cloth);
        assert_eq!(config.seed, 42);
        assert_eq!(config.fixed_delta, Some(0.02));
        assert_eq!(config.window_width, 1280);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "{ seed: ").unwrap();

        assert!(matches!(AppConfig::load(&path), Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let config = AppConfig {
            capacity: 5000,
            particle_texture: Some("textures/spark.png".to_string()),
            ..AppConfig::default()
        };

        config.save(&path).unwrap();
        assert_eq!(AppConfig::load(&path).unwrap(), config);
    }
}
