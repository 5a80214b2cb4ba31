//! Application constants and the fixed default content.

use std::time::Duration;

use crate::playlist::PlaylistEntry;

/// How long an inactive search panel stays open.
pub const AUTO_CLOSE_DELAY: Duration = Duration::from_secs(6);

/// Interval between backdrop image swaps.
pub const BACKGROUND_SHUFFLE_INTERVAL: Duration = Duration::from_secs(300);

/// Clock refresh cadence.
pub const CLOCK_UPDATE_INTERVAL: Duration = Duration::from_secs(1);

/// Quiet period after the last keystroke before a search is dispatched.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(400);

/// How long a transient error banner stays visible.
pub const ERROR_BANNER_TTL: Duration = Duration::from_secs(5);

/// Results requested per search.
pub const SEARCH_MAX_RESULTS: u32 = 8;

/// Storage slot names.
pub const KEY_API_KEY: &str = "ytApiKey";
pub const KEY_PLAYLIST: &str = "ytPlaylist";
pub const KEY_BLUR_STATE: &str = "blurEnabled";

/// Seed playlist used whenever nothing valid is persisted.
pub fn default_playlist() -> Vec<PlaylistEntry> {
    [
        ("uX5twbuJVKI", "RANJHEYA VE - Anime Mix [Hindi AMV]"),
        ("8kfP22meDL0", "Love Story - Genshin Impact"),
        ("3tmd-ClpJxA", "Ed Sheeran - Shape of You"),
        ("NNjTFXk_UC4", "POV: You are up at 3AM missing someone"),
        ("hT_nvWreIhg", "Maroon 5 - Sugar"),
        ("fRh_vgS2dFE", "Justin Bieber - Sorry"),
    ]
    .into_iter()
    .map(|(id, title)| PlaylistEntry::new(id, title, ""))
    .collect()
}

/// Backdrop rotation pool.
pub const BACKGROUND_IMAGES: [&str; 12] = [
    "https://images.unsplash.com/photo-1470225620780-dba8ba36b745?w=1200&h=800&fit=crop",
    "https://images.unsplash.com/photo-1493225457124-a3eb161ffa5f?w=1200&h=800&fit=crop",
    "https://images.unsplash.com/photo-1459749411175-04bf5292ceea?w=1200&h=800&fit=crop",
    "https://images.unsplash.com/photo-1514525253161-7a46d19cd819?w=1200&h=800&fit=crop",
    "https://images.unsplash.com/photo-1487180144351-b8472da7d491?w=1200&h=800&fit=crop",
    "https://images.unsplash.com/photo-1471922694622-e98a03b12b21?w=1200&h=800&fit=crop",
    "https://images.unsplash.com/photo-1506744038136-46273834b3fb?w=1200&h=800&fit=crop",
    "https://images.unsplash.com/photo-1468071174046-657d9da3e3a7?w=1200&h=800&fit=crop",
    "https://images.unsplash.com/photo-1500534623283-312aade485b7?w=1200&h=800&fit=crop",
    "https://images.unsplash.com/photo-1496307042754-b4aa456c3a2d?w=1200&h=800&fit=crop",
    "https://images.unsplash.com/photo-1504384308090-c894fdcc538d?w=1200&h=800&fit=crop",
    "https://images.unsplash.com/photo-1470770841072-f978cf4d019e?w=1200&h=800&fit=crop",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_playlist_has_six_unique_entries() {
        let list = default_playlist();
        assert_eq!(list.len(), 6);
        let mut ids: Vec<_> = list.iter().map(|e| e.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 6);
    }
}
