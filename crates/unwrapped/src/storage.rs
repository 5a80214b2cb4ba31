//! Preference storage: a handful of named string slots persisted as one
//! JSON file under the user config directory.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Key-value slots backing the API key, the serialized playlist and the
/// blur preference.
#[derive(Debug)]
pub struct Storage {
    path: PathBuf,
    slots: BTreeMap<String, String>,
}

impl Storage {
    /// Open the default store under the user config dir.
    pub fn open_default() -> Result<Self> {
        let dir = dirs::config_dir()
            .context("no user config directory")?
            .join("unwrapped");
        fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
        Ok(Self::open(dir.join("storage.json")))
    }

    /// Open a store at an explicit path. A missing or corrupt file is
    /// treated as empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let slots = match fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(slots) => slots,
                Err(e) => {
                    log::warn!("storage file {} unreadable, starting empty: {e}", path.display());
                    BTreeMap::new()
                }
            },
            Err(_) => BTreeMap::new(),
        };
        Self { path, slots }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.slots.get(key).map(String::as_str)
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.get(key) {
            Some("true") => true,
            Some("false") => false,
            _ => default,
        }
    }

    /// Set a slot and persist immediately. Persist failures are logged,
    /// never fatal; the in-memory value is kept either way.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.slots.insert(key.to_owned(), value.into());
        self.flush();
    }

    pub fn set_bool(&mut self, key: &str, value: bool) {
        self.set(key, if value { "true" } else { "false" });
    }

    pub fn remove(&mut self, key: &str) {
        if self.slots.remove(key).is_some() {
            self.flush();
        }
    }

    fn flush(&self) {
        let payload = match serde_json::to_string_pretty(&self.slots) {
            Ok(p) => p,
            Err(e) => {
                log::error!("storage serialize failed: {e}");
                return;
            }
        };
        if let Err(e) = fs::write(&self.path, payload) {
            log::error!("storage write to {} failed: {e}", self.path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn slots_round_trip_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");

        let mut storage = Storage::open(&path);
        assert!(storage.get("ytApiKey").is_none());
        storage.set("ytApiKey", "secret");
        storage.set_bool("blurEnabled", false);

        let reopened = Storage::open(&path);
        assert_eq!(reopened.get("ytApiKey"), Some("secret"));
        assert!(!reopened.get_bool("blurEnabled", true));
    }

    #[test]
    fn corrupt_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, "{{{{not json").unwrap();

        let storage = Storage::open(&path);
        assert!(storage.get("ytPlaylist").is_none());
        assert!(storage.get_bool("blurEnabled", true));
    }

    #[test]
    fn remove_deletes_the_slot() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");

        let mut storage = Storage::open(&path);
        storage.set("ytApiKey", "secret");
        storage.remove("ytApiKey");
        assert!(Storage::open(&path).get("ytApiKey").is_none());
    }
}
