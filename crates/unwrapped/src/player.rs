//! The video frame: tracks what is loaded and builds the embed URL.

use crate::playlist::Playlist;

/// The embedded player surface. Holds the embed URL of whatever was loaded
/// last; the shell opens it externally.
#[derive(Debug, Default)]
pub struct Player {
    embed_url: Option<String>,
    now_playing: Option<String>,
}

pub fn embed_url(video_id: &str) -> String {
    format!("https://www.youtube.com/embed/{video_id}?autoplay=1&rel=0&modestbranding=1")
}

/// Predictable per-video frame thumbnail, used when no enriched thumbnail
/// URL is known.
pub fn frame_thumbnail_url(video_id: &str) -> String {
    format!("https://i.ytimg.com/vi/{video_id}/mqdefault.jpg")
}

impl Player {
    /// Load the playlist entry at `index` (clamped into bounds). Returns
    /// the index actually loaded.
    pub fn load_video(&mut self, playlist: &mut Playlist, index: usize) -> Option<usize> {
        let selected = playlist.select(index)?;
        let entry = playlist.current_entry()?;
        log::info!("loading video: {}", entry.title);
        self.embed_url = Some(embed_url(&entry.id));
        self.now_playing = Some(entry.id.clone());
        Some(selected)
    }

    /// Play a video outside the playlist; the selection detaches.
    pub fn play_now(&mut self, playlist: &mut Playlist, video_id: &str) {
        if video_id.is_empty() {
            return;
        }
        log::info!("playing video: {video_id}");
        playlist.detach();
        self.embed_url = Some(embed_url(video_id));
        self.now_playing = Some(video_id.to_owned());
    }

    pub fn embed_url_ref(&self) -> Option<&str> {
        self.embed_url.as_deref()
    }

    pub fn now_playing(&self) -> Option<&str> {
        self.now_playing.as_deref()
    }
}
