//! Playlist state: an ordered list of videos persisted to the playlist
//! storage slot, plus the current-selection index.

use serde::{Deserialize, Serialize};

use crate::config::{self, KEY_PLAYLIST};
use crate::storage::Storage;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PlaylistError {
    #[error("Invalid video ID")]
    InvalidId,
    #[error("Video already in playlist")]
    Duplicate,
    #[error("Cannot remove the last video")]
    LastEntry,
    #[error("Invalid playlist index: {0}")]
    OutOfRange(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistEntry {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub thumbnail: String,
}

impl PlaylistEntry {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        thumbnail: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            thumbnail: thumbnail.into(),
        }
    }

    /// True when the title is the empty string or an auto-generated
    /// `Video N` placeholder, i.e. worth enriching from the metadata
    /// endpoint.
    pub fn has_placeholder_title(&self) -> bool {
        self.title.is_empty() || self.title.starts_with("Video ")
    }
}

/// The playlist plus the currently selected index. `None` means detached:
/// a video outside the playlist is playing.
#[derive(Debug, Clone)]
pub struct Playlist {
    entries: Vec<PlaylistEntry>,
    current: Option<usize>,
}

impl Playlist {
    /// Load from storage; an absent, empty or corrupt slot seeds the fixed
    /// default list. The first entry becomes current.
    pub fn load(storage: &Storage) -> Self {
        let entries = storage
            .get(KEY_PLAYLIST)
            .and_then(|raw| match serde_json::from_str::<Vec<PlaylistEntry>>(raw) {
                Ok(list) => Some(list),
                Err(e) => {
                    log::warn!("persisted playlist unreadable, using defaults: {e}");
                    None
                }
            })
            .filter(|list| !list.is_empty())
            .unwrap_or_else(|| {
                log::info!("using default playlist");
                config::default_playlist()
            });
        log::info!("playlist loaded: {} videos", entries.len());
        Self {
            current: if entries.is_empty() { None } else { Some(0) },
            entries,
        }
    }

    /// Persist the entries to the playlist slot.
    pub fn save(&self, storage: &mut Storage) {
        match serde_json::to_string(&self.entries) {
            Ok(raw) => {
                storage.set(KEY_PLAYLIST, raw);
                log::debug!("playlist saved: {} videos", self.entries.len());
            }
            Err(e) => log::error!("failed to serialize playlist: {e}"),
        }
    }

    pub fn entries(&self) -> &[PlaylistEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_entry(&self) -> Option<&PlaylistEntry> {
        self.current.and_then(|i| self.entries.get(i))
    }

    /// Select an entry, clamping into bounds. Returns the index actually
    /// selected.
    pub fn select(&mut self, index: usize) -> Option<usize> {
        if self.entries.is_empty() {
            self.current = None;
            return None;
        }
        let clamped = index.min(self.entries.len() - 1);
        self.current = Some(clamped);
        Some(clamped)
    }

    /// Detach the selection: something outside the playlist is playing.
    pub fn detach(&mut self) {
        self.current = None;
    }

    /// Append a video. Duplicate ids are rejected and the list is left
    /// unchanged. An empty title gets a `Video N` placeholder.
    pub fn add(&mut self, id: &str, title: &str, thumbnail: &str) -> Result<(), PlaylistError> {
        if id.is_empty() {
            return Err(PlaylistError::InvalidId);
        }
        if self.entries.iter().any(|e| e.id == id) {
            return Err(PlaylistError::Duplicate);
        }
        let title = if title.is_empty() {
            format!("Video {}", self.entries.len() + 1)
        } else {
            title.to_owned()
        };
        self.entries.push(PlaylistEntry::new(id, title, thumbnail));
        log::info!("video added: {id}");
        Ok(())
    }

    /// Remove the entry at `index`. The last remaining entry cannot be
    /// removed. A current index past the new end is clamped to the last
    /// valid position.
    pub fn remove(&mut self, index: usize) -> Result<PlaylistEntry, PlaylistError> {
        if self.entries.len() <= 1 {
            return Err(PlaylistError::LastEntry);
        }
        if index >= self.entries.len() {
            return Err(PlaylistError::OutOfRange(index));
        }
        let removed = self.entries.remove(index);
        if let Some(current) = self.current {
            if current >= self.entries.len() {
                self.current = Some(self.entries.len() - 1);
            }
        }
        log::info!("video removed at index: {index}");
        Ok(removed)
    }

    /// Ids of entries whose titles still need the metadata lookup.
    pub fn ids_needing_enrichment(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.has_placeholder_title())
            .map(|e| e.id.clone())
            .collect()
    }

    /// Patch an entry in place from a metadata lookup. Returns true when
    /// something changed.
    pub fn apply_enrichment(&mut self, id: &str, title: &str, thumbnail: &str) -> bool {
        let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) else {
            return false;
        };
        let mut changed = false;
        if !title.is_empty() && entry.title != title {
            entry.title = title.to_owned();
            changed = true;
        }
        if !thumbnail.is_empty() && entry.thumbnail != thumbnail {
            entry.thumbnail = thumbnail.to_owned();
            changed = true;
        }
        changed
    }
}
