use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Result};
use serde::Deserialize;

/// Optional player configuration. Every field has a default so a config file
/// is never required; an explicit file is validated strictly.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields, default)]
pub struct PlayerConfig {
    pub window: WindowConfig,
    pub audio: AudioConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 960,
            height: 540,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct AudioConfig {
    pub enabled: bool,
    /// Master gain target while playing unmuted, in `[0, 1]`.
    pub master_gain: f32,
    pub start_muted: bool,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            master_gain: 0.85,
            start_muted: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RenderConfig {
    /// Frame rate for offline PNG export.
    pub fps: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { fps: 30 }
    }
}

impl PlayerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.window.width == 0 || self.window.height == 0 {
            bail!(
                "window size must be positive, got {}x{}",
                self.window.width,
                self.window.height
            );
        }
        if !(0.0..=1.0).contains(&self.audio.master_gain) {
            bail!(
                "audio.master_gain must be within [0, 1], got {}",
                self.audio.master_gain
            );
        }
        if self.render.fps == 0 {
            bail!("render.fps must be > 0");
        }
        Ok(())
    }
}

/// Load the config from an optional path: defaults when absent, strict parse
/// and validation when given.
pub fn load_player_config(path: Option<&Path>) -> Result<PlayerConfig> {
    let Some(path) = path else {
        return Ok(PlayerConfig::default());
    };

    let contents = fs::read_to_string(path)
        .map_err(|error| anyhow!("failed to read config {}: {error}", path.display()))?;
    let config: PlayerConfig = serde_yaml::from_str(&contents).map_err(|error| {
        let location = error
            .location()
            .map(|location| format!("line {}, column {}", location.line(), location.column()))
            .unwrap_or_else(|| "unknown location".to_owned());
        anyhow!(
            "failed to parse yaml in {} at {}: {}",
            path.display(),
            location,
            error
        )
    })?;

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(yaml: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp config should create");
        file.write_all(yaml.as_bytes()).expect("config should write");
        file
    }

    #[test]
    fn missing_path_yields_defaults() {
        let config = load_player_config(None).expect("defaults should load");
        assert_eq!(config.window.width, 960);
        assert_eq!(config.window.height, 540);
        assert!(config.audio.enabled);
        assert!(!config.audio.start_muted);
        assert_eq!(config.render.fps, 30);
    }

    #[test]
    fn partial_config_fills_in_defaults() {
        let file = write_config("audio:\n  start_muted: true\n");
        let config = load_player_config(Some(file.path())).expect("config should load");
        assert!(config.audio.start_muted);
        assert_eq!(config.audio.master_gain, 0.85);
        assert_eq!(config.window.width, 960);
    }

    #[test]
    fn full_config_overrides_every_section() {
        let file = write_config(
            "window:\n  width: 1280\n  height: 720\naudio:\n  enabled: false\n  master_gain: 0.5\nrender:\n  fps: 60\n",
        );
        let config = load_player_config(Some(file.path())).expect("config should load");
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.window.height, 720);
        assert!(!config.audio.enabled);
        assert_eq!(config.audio.master_gain, 0.5);
        assert_eq!(config.render.fps, 60);
    }

    #[test]
    fn out_of_range_master_gain_is_rejected() {
        let file = write_config("audio:\n  master_gain: 1.5\n");
        let error = load_player_config(Some(file.path())).expect_err("gain should be rejected");
        assert!(error.to_string().contains("master_gain"));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let file = write_config("window:\n  width: 640\n  depth: 32\n");
        assert!(load_player_config(Some(file.path())).is_err());
    }

    #[test]
    fn zero_fps_is_rejected() {
        let file = write_config("render:\n  fps: 0\n");
        assert!(load_player_config(Some(file.path())).is_err());
    }
}
