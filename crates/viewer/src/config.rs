use modelview_common::AssetLocation;
use modelview_render::CameraLimits;
use modelview_scene::ModelPlacement;
use serde::{Deserialize, Serialize};
use std::f32::consts::FRAC_PI_2;
use std::path::Path;

/// Where the bundled demo model is hosted.
pub const DEFAULT_ASSET_BASE: &str =
    "https://raw.githubusercontent.com/changhejeong/web-assets-hotlink/main/";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid camera limits: {0:?}")]
    InvalidLimits(CameraLimits),
}

/// Initial orbit of the camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSetup {
    pub alpha: f32,
    pub beta: f32,
    pub radius: f32,
    pub limits: CameraLimits,
}

impl Default for CameraSetup {
    fn default() -> Self {
        Self {
            alpha: -FRAC_PI_2,
            beta: FRAC_PI_2,
            radius: 1.5,
            limits: CameraLimits::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSetup {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowSetup {
    fn default() -> Self {
        Self {
            title: "Model Viewer".into(),
            width: 1280,
            height: 720,
        }
    }
}

/// Viewer settings. Every field is optional in the JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub asset: AssetLocation,
    pub placement: ModelPlacement,
    pub camera: CameraSetup,
    /// Start the first animation as soon as the model is loaded.
    pub autoplay: bool,
    pub looping: bool,
    pub show_ground: bool,
    pub window: WindowSetup,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            asset: AssetLocation::new(DEFAULT_ASSET_BASE, "m40-sniper-rifle.glb"),
            placement: ModelPlacement::default(),
            camera: CameraSetup::default(),
            autoplay: true,
            looping: true,
            show_ground: true,
            window: WindowSetup::default(),
        }
    }
}

impl ViewerConfig {
    /// Read a JSON config file. Camera limits must be finite and ordered.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path)?;
        let config: Self = serde_json::from_reader(file)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let limits = self.camera.limits;
        if !limits.is_valid() {
            return Err(ConfigError::InvalidLimits(limits));
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_viewer_layout() {
        let config = ViewerConfig::default();
        assert_eq!(config.asset.file_name, "m40-sniper-rifle.glb");
        assert!(config.asset.is_remote());
        assert_eq!(
            config.asset.to_string(),
            "https://raw.githubusercontent.com/changhejeong/web-assets-hotlink/main/m40-sniper-rifle.glb"
        );
        assert!(config.validate().is_ok());
        assert_eq!(config.camera.radius, 1.5);
        assert_eq!(config.camera.limits.lower_radius, 0.25);
        assert_eq!(config.camera.limits.upper_radius, 10.0);
        assert!(config.autoplay);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: ViewerConfig = serde_json::from_str(
            r#"{ "asset": { "base": "models", "file_name": "crate.glb" }, "autoplay": false }"#,
        )
        .unwrap();
        assert_eq!(config.asset, AssetLocation::new("models", "crate.glb"));
        assert!(!config.autoplay);
        assert_eq!(config.camera, CameraSetup::default());
        assert_eq!(config.window.width, 1280);
    }

    #[test]
    fn load_round_trips_through_file() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let mut config = ViewerConfig::default();
        config.camera.radius = 4.0;
        config.show_ground = false;
        std::fs::write(tmp.path(), config.to_json().unwrap()).unwrap();

        let loaded = ViewerConfig::load(tmp.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn load_reports_bad_json() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "{ not json").unwrap();
        assert!(matches!(
            ViewerConfig::load(tmp.path()),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn load_rejects_inverted_limits() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            tmp.path(),
            r#"{ "camera": { "limits": { "lower_radius": 5.0, "upper_radius": 1.0 } } }"#,
        )
        .unwrap();
        assert!(matches!(
            ViewerConfig::load(tmp.path()),
            Err(ConfigError::InvalidLimits(_))
        ));
    }

    #[test]
    fn validate_rejects_inverted_beta() {
        let mut config = ViewerConfig::default();
        config.camera.limits.lower_beta = 2.0;
        config.camera.limits.upper_beta = 1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidLimits(_))
        ));
    }
}
