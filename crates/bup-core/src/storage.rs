//! Client storage
//!
//! Flat string key/value pairs, persisted as one JSON object. Keys mirror
//! what the web client kept in local storage.

use crate::Result;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

pub const THEME_KEY: &str = "bup-theme-preference";
pub const TOKEN_KEY: &str = "bup-token";
pub const CURRENT_USER_KEY: &str = "bup-current-user";

const STORAGE_FILE: &str = "storage.json";

/// Key/value client storage
pub struct Storage {
    path: Option<PathBuf>,
    entries: RwLock<BTreeMap<String, String>>,
}

impl Storage {
    /// Open the storage file in the state directory
    pub fn open_default() -> Result<Self> {
        let dir = crate::config::state_dir()?;
        Self::open(&dir.join(STORAGE_FILE))
    }

    /// Open (or lazily create) a storage file
    pub fn open(path: &Path) -> Result<Self> {
        let entries = if path.exists() {
            let content = fs::read_to_string(path)?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path: Some(path.to_path_buf()),
            entries: RwLock::new(entries),
        })
    }

    /// Storage that never touches disk
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.read().get(key).cloned()
    }

    pub fn set(&self, key: &str, value: impl Into<String>) -> Result<()> {
        let mut entries = self.write();
        entries.insert(key.to_string(), value.into());
        self.flush(&entries)
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.write();
        if entries.remove(key).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(entries)?)?;
        Ok(())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<String, String>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, BTreeMap<String, String>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(STORAGE_FILE);

        let storage = Storage::open(&path).unwrap();
        storage.set(THEME_KEY, "dark").unwrap();
        storage.set(TOKEN_KEY, "abc").unwrap();
        storage.remove(TOKEN_KEY).unwrap();

        let reopened = Storage::open(&path).unwrap();
        assert_eq!(reopened.get(THEME_KEY).as_deref(), Some("dark"));
        assert_eq!(reopened.get(TOKEN_KEY), None);
    }

    #[test]
    fn test_in_memory_has_no_path() {
        let storage = Storage::in_memory();
        storage.set(THEME_KEY, "light").unwrap();
        assert!(storage.path().is_none());
        assert_eq!(storage.get(THEME_KEY).as_deref(), Some("light"));
    }
}
