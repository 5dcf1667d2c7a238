use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{MazeError, MazeResult};

const DEFAULT_WIDTH: i32 = 15;
const DEFAULT_HEIGHT: i32 = 10;
const DEFAULT_EXTRA_PASSAGES: usize = 20;
const DEFAULT_HUNTERS: usize = 2;
const DEFAULT_DETECTION_RANGE: u32 = 8;
const DEFAULT_HUNTER_TICK_INTERVAL: u32 = 2;
const DEFAULT_TICK_MS: u64 = 90;
const DEFAULT_RENDER_FPS: u64 = 60;

/// Session settings for one maze run. Every key is optional in the TOML file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MazeConfig {
    pub width: i32,
    pub height: i32,
    /// Walls knocked out after generation to add loops.
    pub extra_passages: usize,
    pub seed: Option<u64>,
    pub hunters: usize,
    /// Passage distance at which a hunter notices the player.
    pub detection_range: u32,
    /// Hunters decide once every this many game ticks.
    pub hunter_tick_interval: u32,
    pub tick_ms: u64,
    pub render_fps: u64,
}

impl Default for MazeConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            extra_passages: DEFAULT_EXTRA_PASSAGES,
            seed: None,
            hunters: DEFAULT_HUNTERS,
            detection_range: DEFAULT_DETECTION_RANGE,
            hunter_tick_interval: DEFAULT_HUNTER_TICK_INTERVAL,
            tick_ms: DEFAULT_TICK_MS,
            render_fps: DEFAULT_RENDER_FPS,
        }
    }
}

impl MazeConfig {
    pub fn load(path: impl AsRef<Path>) -> MazeResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| MazeError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> MazeResult<Self> {
        let config: MazeConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Overrides from `MAZE_HUNT_SEED`, `MAZE_HUNT_TICK_MS` and `MAZE_HUNT_FPS`.
    /// Unparsable or zero values are ignored.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(seed) = lookup("MAZE_HUNT_SEED").and_then(|v| v.parse::<u64>().ok()) {
            self.seed = Some(seed);
        }
        if let Some(tick_ms) = lookup("MAZE_HUNT_TICK_MS")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|v| *v > 0)
        {
            self.tick_ms = tick_ms;
        }
        if let Some(fps) = lookup("MAZE_HUNT_FPS")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|v| *v > 0)
        {
            self.render_fps = fps;
        }
    }

    pub fn validate(&self) -> MazeResult<()> {
        if self.width <= 0 || self.height <= 0 {
            return Err(MazeError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if self.tick_ms == 0 || self.render_fps == 0 {
            return Err(MazeError::InvalidConfig(
                "tick_ms and render_fps must be positive".to_string(),
            ));
        }
        if self.hunter_tick_interval == 0 {
            return Err(MazeError::InvalidConfig(
                "hunter_tick_interval must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = MazeConfig::from_toml_str("").unwrap();
        assert_eq!(config, MazeConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = MazeConfig::from_toml_str("width = 21\nheight = 21\nseed = 7\n").unwrap();
        assert_eq!(config.width, 21);
        assert_eq!(config.height, 21);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.extra_passages, DEFAULT_EXTRA_PASSAGES);
    }

    #[test]
    fn rejects_bad_dimensions() {
        let err = MazeConfig::from_toml_str("width = 0").unwrap_err();
        assert!(matches!(err, MazeError::InvalidDimensions { width: 0, .. }));
    }

    #[test]
    fn rejects_zero_cadence() {
        assert!(matches!(
            MazeConfig::from_toml_str("tick_ms = 0"),
            Err(MazeError::InvalidConfig(_))
        ));
        assert!(matches!(
            MazeConfig::from_toml_str("hunter_tick_interval = 0"),
            Err(MazeError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_unknown_keys_and_bad_types() {
        assert!(matches!(
            MazeConfig::from_toml_str("widht = 3"),
            Err(MazeError::ConfigParse(_))
        ));
        assert!(matches!(
            MazeConfig::from_toml_str("width = \"wide\""),
            Err(MazeError::ConfigParse(_))
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = MazeConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, MazeError::ConfigRead { .. }));
        assert!(err.to_string().contains("/definitely/not/here.toml"));
    }

    #[test]
    fn overrides_skip_garbage() {
        let mut config = MazeConfig::default();
        config.apply_overrides(|key| match key {
            "MAZE_HUNT_SEED" => Some("42".to_string()),
            "MAZE_HUNT_TICK_MS" => Some("0".to_string()),
            "MAZE_HUNT_FPS" => Some("fast".to_string()),
            _ => None,
        });
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.tick_ms, DEFAULT_TICK_MS);
        assert_eq!(config.render_fps, DEFAULT_RENDER_FPS);
    }
}
