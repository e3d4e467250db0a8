use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{MAX_FRAME_DELTA, MOUSE_SENSITIVITY};
use crate::logging::TracingConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
    #[error("render resolution {width}x{height} must be non-zero")]
    BadResolution { width: u32, height: u32 },
    #[error("max_frame_delta {0} must be a positive number of seconds")]
    BadFrameDelta(f32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Dungeon RNG seed; each new run continues the same stream
    pub seed: u64,
    /// Framebuffer resolution in pixels
    pub width: u32,
    pub height: u32,
    /// Window pixels per framebuffer pixel
    pub window_scale: f32,
    pub god_mode: bool,
    /// Radians per unit of mouse motion
    pub mouse_sensitivity: f32,
    /// Upper bound on one simulation step, in seconds
    pub max_frame_delta: f32,
    pub save_path: PathBuf,
    pub logging: TracingConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            width: 320,
            height: 200,
            window_scale: 3.0,
            god_mode: false,
            mouse_sensitivity: MOUSE_SENSITIVITY,
            max_frame_delta: MAX_FRAME_DELTA,
            save_path: PathBuf::from("kruptins_save.json"),
            logging: TracingConfig::default(),
        }
    }
}

impl GameConfig {
    /// Read a RON config; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let config: GameConfig = ron::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::BadResolution {
                width: self.width,
                height: self.height,
            });
        }
        if !self.max_frame_delta.is_finite() || self.max_frame_delta <= 0.0 {
            return Err(ConfigError::BadFrameDelta(self.max_frame_delta));
        }
        Ok(())
    }

    pub fn to_ron(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = GameConfig::load(&dir.path().join("absent.ron")).unwrap();
        assert_eq!(config, GameConfig::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.ron");
        fs::write(&path, "(seed: 7, god_mode: true)").unwrap();
        let config = GameConfig::load(&path).unwrap();
        assert_eq!(config.seed, 7);
        assert!(config.god_mode);
        assert_eq!(config.width, 320);
    }

    #[test]
    fn test_round_trip_through_ron() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.ron");
        let config = GameConfig {
            seed: 99,
            width: 160,
            ..Default::default()
        };
        fs::write(&path, config.to_ron().unwrap()).unwrap();
        assert_eq!(GameConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_bad_input_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.ron");
        fs::write(&path, "(seed: \"nope\")").unwrap();
        assert!(matches!(
            GameConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
        fs::write(&path, "(width: 0)").unwrap();
        assert!(matches!(
            GameConfig::load(&path),
            Err(ConfigError::BadResolution { .. })
        ));
    }

    #[test]
    fn test_frame_delta_must_be_positive() {
        for bad in [-1.0, 0.0, f32::NAN, f32::INFINITY] {
            let config = GameConfig {
                max_frame_delta: bad,
                ..Default::default()
            };
            assert!(
                matches!(config.validate(), Err(ConfigError::BadFrameDelta(_))),
                "{bad} accepted"
            );
        }
        assert!(GameConfig::default().validate().is_ok());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.ron");
        fs::write(&path, "(max_frame_delta: -1.0)").unwrap();
        assert!(matches!(
            GameConfig::load(&path),
            Err(ConfigError::BadFrameDelta(_))
        ));
    }
}
