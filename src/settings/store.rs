//! Key-value stores for persisted settings

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::warn;

use super::types::{Result, SettingsError};

/// Key under which the settings blob is stored
pub const SETTINGS_KEY: &str = "centerframe.settings";

/// Blob storage keyed by string
pub trait SettingsStore: Send + Sync {
    /// Read a blob; `Ok(None)` when the key is absent
    fn get(&self, key: &str) -> Result<Option<String>>;
    /// Write a blob, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

impl<S: SettingsStore + ?Sized> SettingsStore for &S {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}

/// In-process store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with one entry
    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::new();
        if let Ok(mut entries) = store.entries.write() {
            entries.insert(key.to_string(), value.to_string());
        }
        store
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Single JSON object file mapping keys to blobs
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default location under the user config directory
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|dir| dir.join("centerframe").join("settings.json"))
            .unwrap_or_else(|| PathBuf::from("centerframe-settings.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        match serde_json::from_str::<Value>(&content)? {
            Value::Object(map) => Ok(map),
            _ => Err(SettingsError::Corrupt(self.path.clone())),
        }
    }
}

impl SettingsStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let map = self.read_map()?;
        Ok(map.get(key).map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        // Corrupt files are overwritten
        let mut map = self.read_map().unwrap_or_else(|e| {
            warn!("Discarding unreadable settings file {}: {}", self.path.display(), e);
            Map::new()
        });
        map.insert(key.to_string(), Value::String(value.to_string()));

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(&Value::Object(map))?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_get_set() {
        let store = MemoryStore::new();
        assert_eq!(store.get(SETTINGS_KEY).unwrap(), None);

        store.set(SETTINGS_KEY, "{}").unwrap();
        assert_eq!(store.get(SETTINGS_KEY).unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn test_memory_store_with_entry() {
        let store = MemoryStore::with_entry("k", "v");
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_json_store_missing_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(temp_dir.path().join("settings.json"));
        assert_eq!(store.get(SETTINGS_KEY).unwrap(), None);
    }

    #[test]
    fn test_json_store_persists_across_instances() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("settings.json");

        JsonFileStore::new(&path).set(SETTINGS_KEY, "{\"a\":1}").unwrap();
        JsonFileStore::new(&path).set("other", "x").unwrap();

        let store = JsonFileStore::new(&path);
        assert_eq!(
            store.get(SETTINGS_KEY).unwrap().as_deref(),
            Some("{\"a\":1}")
        );
        assert_eq!(store.get("other").unwrap().as_deref(), Some("x"));
    }

    #[test]
    fn test_json_store_corrupt_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("settings.json");
        std::fs::write(&path, "not json at all").unwrap();

        let store = JsonFileStore::new(&path);
        assert!(matches!(
            store.get(SETTINGS_KEY),
            Err(SettingsError::Serialization(_))
        ));

        // Saving recovers the file
        store.set(SETTINGS_KEY, "{}").unwrap();
        assert_eq!(store.get(SETTINGS_KEY).unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn test_json_store_non_object_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("settings.json");
        std::fs::write(&path, "[1,2]").unwrap();

        let store = JsonFileStore::new(&path);
        assert!(matches!(
            store.get(SETTINGS_KEY),
            Err(SettingsError::Corrupt(_))
        ));
    }
}
