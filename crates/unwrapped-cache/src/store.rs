//! On-disk cache generations.
//!
//! A generation is a directory named after its cache version. Each entry is
//! a pair of files keyed by the md5 digest of the request URL: a small JSON
//! sidecar with the URL, status and content type, and the raw body bytes.
//! Generations are superseded wholesale: a version bump creates a new
//! directory and the old one is deleted on activation.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::response::StoredResponse;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("cache io error: {0}")]
    Io(#[from] io::Error),
    #[error("cache entry metadata error: {0}")]
    Meta(#[from] serde_json::Error),
}

/// Sidecar metadata written next to each body file.
#[derive(Debug, Serialize, Deserialize)]
struct EntryMeta {
    url: String,
    status: u16,
    content_type: String,
}

/// A set of named cache generations rooted at one directory.
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn generation_dir(&self, generation: &str) -> PathBuf {
        self.root.join(generation)
    }

    fn entry_paths(&self, generation: &str, url: &str) -> (PathBuf, PathBuf) {
        let digest = format!("{:x}", md5::compute(url.as_bytes()));
        let dir = self.generation_dir(generation);
        (dir.join(format!("{digest}.json")), dir.join(format!("{digest}.bin")))
    }

    /// Store a response under `generation`, creating the generation on
    /// first use.
    pub fn put(
        &self,
        generation: &str,
        url: &str,
        response: &StoredResponse,
    ) -> Result<(), StoreError> {
        let (meta_path, body_path) = self.entry_paths(generation, url);
        fs::create_dir_all(self.generation_dir(generation))?;
        let meta = EntryMeta {
            url: url.to_owned(),
            status: response.status,
            content_type: response.content_type.clone(),
        };
        fs::write(&body_path, &response.body)?;
        fs::write(&meta_path, serde_json::to_vec(&meta)?)?;
        Ok(())
    }

    /// Look a URL up in one generation. Corrupt or half-written entries
    /// read as misses.
    pub fn get(&self, generation: &str, url: &str) -> Option<StoredResponse> {
        let (meta_path, body_path) = self.entry_paths(generation, url);
        let meta_bytes = fs::read(&meta_path).ok()?;
        let meta: EntryMeta = serde_json::from_slice(&meta_bytes).ok()?;
        if meta.url != url {
            // Digest collision; treat as a miss rather than serving the
            // wrong resource.
            return None;
        }
        let body = fs::read(&body_path).ok()?;
        Some(StoredResponse::new(meta.status, meta.content_type, body))
    }

    /// Look a URL up across the given generations, first match wins.
    pub fn get_any(&self, generations: &[&str], url: &str) -> Option<StoredResponse> {
        generations.iter().find_map(|name| self.get(name, url))
    }

    pub fn contains(&self, generation: &str, url: &str) -> bool {
        let (meta_path, _) = self.entry_paths(generation, url);
        meta_path.exists()
    }

    /// Names of all generations currently on disk.
    pub fn generation_names(&self) -> Result<Vec<String>, StoreError> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Ok(name) = entry.file_name().into_string() {
                    names.push(name);
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Delete one generation wholesale. Deleting a generation that does not
    /// exist is a no-op.
    pub fn delete_generation(&self, generation: &str) -> Result<(), StoreError> {
        let dir = self.generation_dir(generation);
        match fs::remove_dir_all(&dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete every generation.
    pub fn clear(&self) -> Result<(), StoreError> {
        for name in self.generation_names()? {
            self.delete_generation(&name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, CacheStore) {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::open(dir.path()).unwrap();
        (dir, store)
    }

    fn jpeg(bytes: &[u8]) -> StoredResponse {
        StoredResponse::new(200, "image/jpeg", bytes.to_vec())
    }

    #[test]
    fn put_then_get_round_trips() {
        let (_dir, store) = store();
        let url = "https://images.unsplash.com/photo-1?w=1200";
        store.put("runtime", url, &jpeg(b"pixels")).unwrap();
        let got = store.get("runtime", url).unwrap();
        assert_eq!(got.status, 200);
        assert_eq!(got.content_type, "image/jpeg");
        assert_eq!(got.body, b"pixels");
    }

    #[test]
    fn miss_on_unknown_url_and_generation() {
        let (_dir, store) = store();
        store
            .put("runtime", "https://a.example/x", &jpeg(b"x"))
            .unwrap();
        assert!(store.get("runtime", "https://a.example/y").is_none());
        assert!(store.get("v2", "https://a.example/x").is_none());
    }

    #[test]
    fn get_any_prefers_earlier_generations() {
        let (_dir, store) = store();
        let url = "https://a.example/shell";
        store.put("v1", url, &jpeg(b"old")).unwrap();
        store.put("runtime", url, &jpeg(b"new")).unwrap();
        let got = store.get_any(&["runtime", "v1"], url).unwrap();
        assert_eq!(got.body, b"new");
    }

    #[test]
    fn generations_are_listed_and_deleted_wholesale() {
        let (_dir, store) = store();
        store.put("v1", "https://a.example/1", &jpeg(b"1")).unwrap();
        store.put("v2", "https://a.example/2", &jpeg(b"2")).unwrap();
        assert_eq!(store.generation_names().unwrap(), vec!["v1", "v2"]);

        store.delete_generation("v1").unwrap();
        assert_eq!(store.generation_names().unwrap(), vec!["v2"]);
        assert!(store.get("v1", "https://a.example/1").is_none());

        // Already gone: no-op.
        store.delete_generation("v1").unwrap();
    }

    #[test]
    fn clear_removes_everything() {
        let (_dir, store) = store();
        store.put("v1", "https://a.example/1", &jpeg(b"1")).unwrap();
        store.put("v2", "https://a.example/2", &jpeg(b"2")).unwrap();
        store.clear().unwrap();
        assert!(store.generation_names().unwrap().is_empty());
    }

    #[test]
    fn corrupt_meta_reads_as_miss() {
        let (_dir, store) = store();
        let url = "https://a.example/corrupt";
        store.put("runtime", url, &jpeg(b"ok")).unwrap();
        let (meta_path, _) = store.entry_paths("runtime", url);
        fs::write(&meta_path, b"not json").unwrap();
        assert!(store.get("runtime", url).is_none());
    }
}
