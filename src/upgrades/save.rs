//! Versioned save file for [`Progress`].
//!
//! - Version 1 is the legacy layout: camelCase level keys, and an old
//!   `damage` track that became `projectileSpeed`. Files without a
//!   `version` field are treated as version 1.
//! - Version 2 is the current layout, a direct serde image of [`Progress`].
//! - Unknown future versions are rejected, never downgraded.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::Progress;

pub const CURRENT_SAVE_VERSION: u32 = 2;

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("failed to access save file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("save file is not valid: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("save version {found} is newer than supported version {supported}")]
    FutureVersion { found: u32, supported: u32 },
}

/// On-disk envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveFile {
    pub version: u32,
    #[serde(flatten)]
    pub progress: Progress,
}

impl SaveFile {
    pub fn new(progress: Progress) -> Self {
        Self {
            version: CURRENT_SAVE_VERSION,
            progress,
        }
    }

    pub fn to_json(&self) -> Result<String, SaveError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse any supported version and migrate it forward
    pub fn from_json(json: &str) -> Result<Self, SaveError> {
        let mut data: Value = serde_json::from_str(json)?;
        let version = data
            .get("version")
            .and_then(Value::as_u64)
            .map(|v| v as u32)
            .unwrap_or(1);
        if version > CURRENT_SAVE_VERSION {
            return Err(SaveError::FutureVersion {
                found: version,
                supported: CURRENT_SAVE_VERSION,
            });
        }
        let mut current = version;
        while current < CURRENT_SAVE_VERSION {
            migrate_step(&mut data, current);
            current += 1;
        }
        let mut file: SaveFile = serde_json::from_value(data)?;
        file.version = CURRENT_SAVE_VERSION;
        file.progress.levels = file.progress.levels.clamped();
        Ok(file)
    }
}

fn migrate_step(data: &mut Value, from: u32) {
    if from == 1 {
        migrate_v1_to_v2(data);
    }
}

/// v1 -> v2: snake_case level keys, `damage` folded into `projectile_speed`
fn migrate_v1_to_v2(data: &mut Value) {
    let Some(obj) = data.as_object_mut() else {
        return;
    };
    let legacy = match obj.remove("upgrades").or_else(|| obj.remove("levels")) {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };
    let mut levels = Map::new();
    let mut damage = None;
    for (key, value) in legacy {
        let renamed = match key.as_str() {
            "damage" => {
                damage = Some(value);
                continue;
            }
            "fireRate" => "fire_rate",
            "projectileSpeed" => "projectile_speed",
            "moveSpeed" => "move_speed",
            other => other,
        };
        levels.insert(renamed.to_string(), value);
    }
    // The old damage track wins over any projectileSpeed entry
    if let Some(value) = damage {
        tracing::info!("migrated legacy damage upgrade to projectile_speed");
        levels.insert("projectile_speed".to_string(), value);
    }
    obj.insert("levels".to_string(), Value::Object(levels));
    obj.entry("credits").or_insert(Value::from(0u64));
    obj.insert("version".to_string(), Value::from(2u32));
}

/// Load progress from `path`; a missing file is a fresh profile
pub fn load_progress(path: &Path) -> Result<Progress, SaveError> {
    let json = match fs::read_to_string(path) {
        Ok(json) => json,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no save file, starting fresh");
            return Ok(Progress::default());
        }
        Err(source) => {
            return Err(SaveError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let file = SaveFile::from_json(&json)?;
    tracing::info!(
        path = %path.display(),
        credits = file.progress.credits,
        "progress loaded"
    );
    Ok(file.progress)
}

pub fn save_progress(path: &Path, progress: &Progress) -> Result<(), SaveError> {
    let json = SaveFile::new(*progress).to_json()?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| SaveError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, json).map_err(|source| SaveError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "progress saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upgrades::UpgradeLevels;

    #[test]
    fn test_current_version_round_trip() {
        let progress = Progress {
            credits: 1234,
            levels: UpgradeLevels {
                fire_rate: 2,
                projectile_speed: 1,
                move_speed: 0,
                health: 3,
            },
        };
        let json = SaveFile::new(progress).to_json().unwrap();
        assert!(json.contains("\"version\": 2"));
        let back = SaveFile::from_json(&json).unwrap();
        assert_eq!(back.progress, progress);
    }

    #[test]
    fn test_legacy_damage_migrates() {
        let json = r#"{"credits": 500, "upgrades": {"fireRate": 1, "damage": 2, "moveSpeed": 3}}"#;
        let file = SaveFile::from_json(json).unwrap();
        assert_eq!(file.version, CURRENT_SAVE_VERSION);
        assert_eq!(file.progress.credits, 500);
        assert_eq!(file.progress.levels.fire_rate, 1);
        assert_eq!(file.progress.levels.projectile_speed, 2);
        assert_eq!(file.progress.levels.move_speed, 3);
        assert_eq!(file.progress.levels.health, 0);
    }

    #[test]
    fn test_future_version_rejected() {
        let json = r#"{"version": 9, "credits": 1, "levels": {}}"#;
        assert!(matches!(
            SaveFile::from_json(json),
            Err(SaveError::FutureVersion { found: 9, .. })
        ));
    }

    #[test]
    fn test_garbage_is_parse_error() {
        assert!(matches!(
            SaveFile::from_json("not json"),
            Err(SaveError::Parse(_))
        ));
    }

    #[test]
    fn test_out_of_range_levels_clamped() {
        let json = r#"{"version": 2, "credits": 0, "levels": {"health": 40}}"#;
        let file = SaveFile::from_json(json).unwrap();
        assert_eq!(file.progress.levels.health, 3);
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("save.json");
        assert_eq!(load_progress(&path).unwrap(), Progress::default());

        let mut progress = Progress::default();
        progress.add_credits(777);
        progress.levels.move_speed = 2;
        save_progress(&path, &progress).unwrap();
        assert_eq!(load_progress(&path).unwrap(), progress);
    }
}
