use crate::{Error, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;

// Storage keys, shared by the language and theme controllers
pub const LANGUAGE_KEY: &str = "preferred-language";
pub const DIRECTION_KEY: &str = "preferred-direction";
pub const THEME_KEY: &str = "preferred-theme";
pub const FOLLOW_SYSTEM_KEY: &str = "prefers-system-theme";

/// Flat string-to-string preference storage, persisted as JSON.
///
/// Values are plain strings on purpose, so anything that can read the file
/// can read the preferences. Writes are best-effort: if the disk says no,
/// the in-memory value still wins and we log the complaint.
#[derive(Debug, Clone, Default)]
pub struct PreferenceStore {
    values: HashMap<String, String>,
    path: Option<PathBuf>,
}

impl PreferenceStore {
    /// In-memory only, nothing persisted
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from the default location, creating an empty store if the file
    /// doesn't exist yet
    pub fn load() -> Result<Self> {
        Self::load_from(Self::store_path()?)
    }

    /// Load from an explicit path. Handy for tests.
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            return Ok(Self {
                values: HashMap::new(),
                path: Some(path),
            });
        }

        let content = std::fs::read_to_string(&path)?;
        let values = serde_json::from_str(&content)?;
        Ok(Self {
            values,
            path: Some(path),
        })
    }

    fn store_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| Error::ConfigError("Could not find data directory".to_string()))?;
        Ok(data_dir.join("offsite").join("preferences.json"))
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|v| v.as_str())
    }

    /// Set a value and persist. The in-memory value sticks even when the
    /// write fails.
    pub fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
        if let Err(e) = self.save() {
            warn!("Could not persist preference {}: {}", key, e);
        }
    }

    pub fn remove(&mut self, key: &str) {
        self.values.remove(key);
        if let Err(e) = self.save() {
            warn!("Could not persist preference removal of {}: {}", key, e);
        }
    }

    fn save(&self) -> Result<()> {
        let path = match &self.path {
            Some(path) => path,
            // Nowhere to write is fine, that's the in-memory mode
            None => return Ok(()),
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.values)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
