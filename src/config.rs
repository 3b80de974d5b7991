//! Viewer settings. Every field has a default matching the reference scene, so
//! an empty JSON object (or no file at all) yields the stock viewer.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use glam::Vec3;
use serde::de::{self, Deserializer};
use serde::Deserialize;

use crate::camera::ScrollMode;
use crate::input::{KeyCode, NamedKey};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub frame: FrameConfig,
    pub lighting: LightingConfig,
    pub textures: TextureConfig,
    pub bindings: KeyBindings,
}

impl ViewerConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text).context("invalid viewer configuration")?;
        config.frame.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("failed to parse config {}", path.display()))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            title: "Desk Viewer".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub field_of_view: f32,
    pub near: f32,
    pub far: f32,
    pub movement_speed: f32,
    pub mouse_sensitivity: f32,
    pub scroll_step: f32,
    pub scroll_mode: ScrollMode,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            yaw: -90.0,
            pitch: 0.0,
            field_of_view: 45.0,
            near: 0.1,
            far: 100.0,
            movement_speed: 2.5,
            mouse_sensitivity: 0.1,
            scroll_step: 0.5,
            scroll_mode: ScrollMode::MovementSpeed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Upper bound for a single frame delta, in seconds.
    pub max_delta_seconds: f32,
}

/// Largest accepted `max_delta_seconds`.
pub const MAX_FRAME_DELTA_SECONDS: f32 = 60.0;

impl FrameConfig {
    fn validate(&self) -> Result<()> {
        let seconds = self.max_delta_seconds;
        ensure!(
            seconds.is_finite() && seconds > 0.0 && seconds <= MAX_FRAME_DELTA_SECONDS,
            "frame.max_delta_seconds must be in (0, {MAX_FRAME_DELTA_SECONDS}], got {seconds}"
        );
        Ok(())
    }

    pub fn max_delta(&self) -> Duration {
        Duration::try_from_secs_f32(self.max_delta_seconds.clamp(0.0, MAX_FRAME_DELTA_SECONDS))
            .unwrap_or_default()
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_delta_seconds: 0.25,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    pub light_position: Vec3,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            light_position: Vec3::new(1.2, 1.0, 2.0),
        }
    }
}

/// File names of the two texture assets, relative to the asset directory.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TextureConfig {
    pub bottle_label: String,
    pub leather: String,
}

impl Default for TextureConfig {
    fn default() -> Self {
        Self {
            bottle_label: "bottle.jpg".to_string(),
            leather: "leather.jpg".to_string(),
        }
    }
}

/// Key bindings, written as key names (`"W"`, `"Escape"`, `"F5"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    #[serde(deserialize_with = "key_by_name")]
    pub exit: KeyCode,
    #[serde(deserialize_with = "key_by_name")]
    pub forward: KeyCode,
    #[serde(deserialize_with = "key_by_name")]
    pub backward: KeyCode,
    #[serde(deserialize_with = "key_by_name")]
    pub strafe_left: KeyCode,
    #[serde(deserialize_with = "key_by_name")]
    pub strafe_right: KeyCode,
    #[serde(deserialize_with = "key_by_name")]
    pub up: KeyCode,
    #[serde(deserialize_with = "key_by_name")]
    pub down: KeyCode,
    #[serde(deserialize_with = "key_by_name")]
    pub toggle_projection: KeyCode,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            exit: KeyCode::Named(NamedKey::Escape),
            forward: KeyCode::Character('W'),
            backward: KeyCode::Character('S'),
            strafe_left: KeyCode::Character('A'),
            strafe_right: KeyCode::Character('D'),
            up: KeyCode::Character('Q'),
            down: KeyCode::Character('E'),
            toggle_projection: KeyCode::Character('P'),
        }
    }
}

fn key_by_name<'de, D>(deserializer: D) -> Result<KeyCode, D::Error>
where
    D: Deserializer<'de>,
{
    let name = String::deserialize(deserializer)?;
    KeyCode::from_name(&name).ok_or_else(|| de::Error::custom(format!("unknown key `{name}`")))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let config = ViewerConfig::from_json("{}").unwrap();
        assert_eq!(config, ViewerConfig::default());
        assert_eq!(config.window.width, 800);
        assert_eq!(config.camera.movement_speed, 2.5);
        assert_eq!(config.lighting.light_position, Vec3::new(1.2, 1.0, 2.0));
        assert_eq!(config.bindings.forward, KeyCode::Character('W'));
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = ViewerConfig::from_json(
            r#"{
                "camera": { "scroll_mode": "field_of_view", "position": [1.0, 2.0, 3.0] },
                "bindings": { "toggle_projection": "o", "exit": "Esc" }
            }"#,
        )
        .unwrap();
        assert_eq!(config.camera.scroll_mode, ScrollMode::FieldOfView);
        assert_eq!(config.camera.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(config.camera.yaw, -90.0);
        assert_eq!(config.bindings.toggle_projection, KeyCode::Character('O'));
        assert_eq!(config.bindings.exit, KeyCode::Named(NamedKey::Escape));
        assert_eq!(config.bindings.up, KeyCode::Character('Q'));
    }

    #[test]
    fn unknown_key_name_is_rejected() {
        let err = ViewerConfig::from_json(r#"{ "bindings": { "forward": "Hyper" } }"#)
            .unwrap_err();
        assert!(format!("{err:#}").contains("unknown key `Hyper`"));
    }

    #[test]
    fn out_of_range_frame_delta_is_rejected() {
        for text in [
            r#"{ "frame": { "max_delta_seconds": 1e20 } }"#,
            r#"{ "frame": { "max_delta_seconds": -0.5 } }"#,
            r#"{ "frame": { "max_delta_seconds": 0 } }"#,
        ] {
            let err = ViewerConfig::from_json(text).unwrap_err();
            assert!(format!("{err:#}").contains("frame.max_delta_seconds"), "{text}");
        }

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "frame": {{ "max_delta_seconds": 1e20 }} }}"#).unwrap();
        let err = ViewerConfig::load(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse config"));
    }

    #[test]
    fn frame_delta_converts_without_panicking() {
        let config = ViewerConfig::from_json(r#"{ "frame": { "max_delta_seconds": 0.5 } }"#).unwrap();
        assert_eq!(config.frame.max_delta(), Duration::from_millis(500));

        let oversized = FrameConfig {
            max_delta_seconds: 1e20,
        };
        assert_eq!(oversized.max_delta(), Duration::from_secs(60));
        let invalid = FrameConfig {
            max_delta_seconds: f32::NAN,
        };
        assert_eq!(invalid.max_delta(), Duration::ZERO);
    }

    #[test]
    fn load_reads_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "window": {{ "title": "Desk" }} }}"#).unwrap();
        let config = ViewerConfig::load(file.path()).unwrap();
        assert_eq!(config.window.title, "Desk");
        assert_eq!(config.window.height, 600);
    }
}
