// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Settings persistence.
//!
//! The session only relies on the get/set contract of [`SettingsStore`];
//! last-write-wins, no transactions. [`FileStore`] persists to a TOML
//! file under the platform config directory, [`MemoryStore`] keeps the
//! record in a process-local key-value map (the shape of an extension
//! storage area).

use crate::resolver::GlobalSettings;
use directories::ProjectDirs;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Fixed namespace key the settings record lives under.
pub const SETTINGS_KEY: &str = "tabtune.settings";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to determine config directory")]
    NoConfigDir,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Value error: {0}")]
    Value(#[from] serde_json::Error),
}

/// Get/set contract for the persisted [`GlobalSettings`] record.
pub trait SettingsStore: Send + Sync {
    /// Load the record. `Ok(None)` means nothing has been saved yet.
    fn load(&self) -> Result<Option<GlobalSettings>, StoreError>;

    /// Save the record, replacing any previous one.
    fn save(&self, settings: &GlobalSettings) -> Result<(), StoreError>;
}

/// TOML file persistence under the platform config directory.
pub struct FileStore {
    config_dir: PathBuf,
}

impl FileStore {
    /// Store under the standard per-user config location, creating the
    /// directory if needed.
    pub fn new() -> Result<Self, StoreError> {
        let project_dirs = ProjectDirs::from("", "", "tabtune").ok_or(StoreError::NoConfigDir)?;
        let config_dir = project_dirs.config_dir().to_path_buf();
        fs::create_dir_all(&config_dir)?;
        Ok(Self { config_dir })
    }

    /// Store under an explicit directory (tests, portable setups).
    pub fn at(dir: impl AsRef<Path>) -> Self {
        Self {
            config_dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Path of the settings file.
    pub fn settings_path(&self) -> PathBuf {
        self.config_dir.join("settings.toml")
    }
}

impl SettingsStore for FileStore {
    fn load(&self) -> Result<Option<GlobalSettings>, StoreError> {
        let path = self.settings_path();
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        Ok(Some(toml::from_str(&content)?))
    }

    fn save(&self, settings: &GlobalSettings) -> Result<(), StoreError> {
        let content = toml::to_string_pretty(settings)?;
        fs::write(self.settings_path(), content)?;
        debug!("Saved settings to {}", self.settings_path().display());
        Ok(())
    }
}

/// In-memory key-value store. Values are held as JSON, matching the
/// serialization shape of a browser storage area.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, serde_json::Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self) -> Result<Option<GlobalSettings>, StoreError> {
        let values = self.values.lock();
        match values.get(SETTINGS_KEY) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    fn save(&self, settings: &GlobalSettings) -> Result<(), StoreError> {
        let value = serde_json::to_value(settings)?;
        self.values.lock().insert(SETTINGS_KEY.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::at(dir.path());

        assert!(store.load().unwrap().is_none());

        let mut settings = GlobalSettings::default();
        settings.set_override("example.com", 2.0);
        store.save(&settings).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_file_store_overwrites_previous_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::at(dir.path());

        let mut settings = GlobalSettings::default();
        store.save(&settings).unwrap();
        settings.global_gain = 0.8;
        store.save(&settings).unwrap();

        assert_eq!(store.load().unwrap().unwrap().global_gain, 0.8);
    }

    #[test]
    fn test_file_store_corrupt_record_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::at(dir.path());
        fs::write(store.settings_path(), "global_gain = \"loud\"").unwrap();

        assert!(matches!(store.load(), Err(StoreError::TomlParse(_))));
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        assert!(store.load().unwrap().is_none());

        let mut settings = GlobalSettings::default();
        settings.set_override("example.com", 0.5);
        store.save(&settings).unwrap();

        assert_eq!(store.load().unwrap().unwrap(), settings);
    }
}
