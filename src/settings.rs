//! Editor settings
//!
//! Where databases live on disk and which one the editor is looking at.
//! Persisted as a small JSON document wherever the host editor keeps its
//! preferences; the store itself never reads these implicitly - callers
//! load settings and pass the resulting paths around.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::snapshot::SnapshotError;

/// Name of the database a fresh install starts with
pub const DEFAULT_NAME: &str = "default";

/// Folder under the save path holding database snapshots
pub const DEFAULT_FOLDER: &str = "databases";

/// Root folder for saved content
pub const DEFAULT_PATH: &str = "content";

/// User-scoped editor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatabaseSettings {
    /// Reload the database window automatically after content changes
    pub live_reload: bool,
    /// The production database name
    pub database_name: String,
    /// The folder to save databases in, under `save_path`
    pub database_folder: String,
    /// Root folder for saved content
    pub save_path: String,
    /// The database the editor is currently viewing
    pub viewing_database: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            live_reload: true,
            database_name: DEFAULT_NAME.to_string(),
            database_folder: DEFAULT_FOLDER.to_string(),
            save_path: DEFAULT_PATH.to_string(),
            viewing_database: DEFAULT_NAME.to_string(),
        }
    }
}

impl DatabaseSettings {
    /// Load settings from a JSON file, falling back to defaults when the
    /// file does not exist yet
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Save settings to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// The snapshot path for a database called `filename`
    pub fn full_path(&self, filename: &str) -> PathBuf {
        PathBuf::from(&self.save_path)
            .join(&self.database_folder)
            .join(format!("{}.json", filename))
    }

    /// The snapshot path of the database the editor is viewing
    pub fn viewing_path(&self) -> PathBuf {
        self.full_path(&self.viewing_database)
    }

    /// The snapshot path of the production database
    pub fn production_path(&self) -> PathBuf {
        self.full_path(&self.database_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = DatabaseSettings::default();
        assert!(settings.live_reload);
        assert_eq!(settings.viewing_database, DEFAULT_NAME);
        assert_eq!(
            settings.full_path("default"),
            PathBuf::from("content/databases/default.json")
        );
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = DatabaseSettings::load(dir.path().join("settings.json")).unwrap();
        assert_eq!(settings, DatabaseSettings::default());
    }

    #[test]
    fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prefs").join("settings.json");

        let mut settings = DatabaseSettings::default();
        settings.viewing_database = "sandbox".to_string();
        settings.live_reload = false;
        settings.save(&path).unwrap();

        let back = DatabaseSettings::load(&path).unwrap();
        assert_eq!(back, settings);
        assert_eq!(back.viewing_path(), PathBuf::from("content/databases/sandbox.json"));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"viewingDatabase":"alt"}"#).unwrap();

        let settings = DatabaseSettings::load(&path).unwrap();
        assert_eq!(settings.viewing_database, "alt");
        assert_eq!(settings.database_name, DEFAULT_NAME);
        assert!(settings.live_reload);
    }
}
