//! Application state and the per-frame update loop.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use crossbeam::channel::{unbounded, Receiver, Sender};
use eframe::egui;
use unwrapped_cache::{CacheHandle, Notification, Request, ServiceEvent, StoredResponse};

use crate::background::Background;
use crate::clock::Clock;
use crate::config::{
    CLOCK_UPDATE_INTERVAL, ERROR_BANNER_TTL, KEY_API_KEY, KEY_BLUR_STATE, SEARCH_MAX_RESULTS,
};
use crate::player::Player;
use crate::playlist::Playlist;
use crate::search::{Dispatch, SearchPanel};
use crate::storage::Storage;
use crate::youtube::{SearchFilters, SearchResult, VideoDetails, YouTubeClient};

/// Results delivered from worker threads back to the UI thread.
pub enum WorkerEvent {
    SearchFinished {
        seq: u64,
        result: Result<Vec<SearchResult>, String>,
    },
    DetailsFetched {
        id: String,
        details: Option<VideoDetails>,
        /// Add the video to the playlist once details arrive (search "Add"
        /// flow); otherwise patch an existing entry in place (enrichment).
        then_add: bool,
    },
    ImageLoaded {
        url: String,
        response: StoredResponse,
    },
    CacheVersion(Option<String>),
}

pub struct UnwrappedApp {
    pub storage: Storage,
    pub playlist: Playlist,
    pub player: Player,
    pub search: SearchPanel,
    pub clock: Clock,
    pub background: Background,

    // UI preferences and transient flags; only the blur state persists.
    pub blur_enabled: bool,
    pub playlist_open: bool,
    pub api_key_input: String,
    pub video_input: String,
    pub search_filters: SearchFilters,
    pub player_pos: Option<egui::Pos2>,
    pub dragging: bool,

    pub errors: Vec<(String, Instant)>,
    pub notifications: Vec<Notification>,
    pub cache_version: Option<String>,

    cache: CacheHandle,
    cache_events: Receiver<ServiceEvent>,
    worker_tx: Sender<WorkerEvent>,
    worker_rx: Receiver<WorkerEvent>,

    /// Decoded-bytes cache for thumbnails and backdrops; `None` marks a
    /// fetch that failed so it is not re-attempted.
    pub images: HashMap<String, Option<Arc<[u8]>>>,
    pending_images: HashSet<String>,
}

impl UnwrappedApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        storage: Storage,
        cache: CacheHandle,
        cache_events: Receiver<ServiceEvent>,
    ) -> Self {
        egui_extras::install_image_loaders(&cc.egui_ctx);

        let playlist = Playlist::load(&storage);
        let blur_enabled = storage.get_bool(KEY_BLUR_STATE, true);
        let api_key_input = storage.get(KEY_API_KEY).unwrap_or_default().to_owned();
        let (worker_tx, worker_rx) = unbounded();

        // The service may still be busy precaching; ask for its version
        // off-thread rather than stalling the first frame.
        {
            let cache = cache.clone();
            let tx = worker_tx.clone();
            std::thread::spawn(move || {
                let _ = tx.send(WorkerEvent::CacheVersion(cache.version()));
            });
        }

        let mut player = Player::default();
        let mut playlist = playlist;
        if !playlist.is_empty() {
            player.load_video(&mut playlist, 0);
        }

        let mut app = Self {
            storage,
            playlist,
            player,
            search: SearchPanel::default(),
            clock: Clock::default(),
            background: Background::default(),
            blur_enabled,
            playlist_open: false,
            api_key_input,
            video_input: String::new(),
            search_filters: SearchFilters::default(),
            player_pos: None,
            dragging: false,
            errors: Vec::new(),
            notifications: Vec::new(),
            cache_version: None,
            cache,
            cache_events,
            worker_tx,
            worker_rx,
            images: HashMap::new(),
            pending_images: HashSet::new(),
        };
        app.enrich_playlist();
        app
    }

    fn client(&self) -> YouTubeClient {
        YouTubeClient::new(self.api_key_input.trim())
    }

    /// Transient dismissible banner plus a log line.
    pub fn show_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{message}");
        self.errors.push((message, Instant::now()));
    }

    pub fn save_playlist(&mut self) {
        self.playlist.save(&mut self.storage);
    }

    pub fn set_api_key(&mut self, key: String) {
        self.api_key_input = key;
        let trimmed = self.api_key_input.trim().to_owned();
        self.storage.set(KEY_API_KEY, trimmed);
    }

    pub fn set_blur(&mut self, enabled: bool) {
        self.blur_enabled = enabled;
        self.storage.set_bool(KEY_BLUR_STATE, enabled);
    }

    /// Toggle the search panel; the playlist panel yields (and vice versa).
    pub fn toggle_search(&mut self) {
        if self.search.toggle() {
            self.playlist_open = false;
        }
    }

    pub fn toggle_playlist(&mut self) {
        self.playlist_open = !self.playlist_open;
        if self.playlist_open {
            self.search.close();
        }
    }

    pub fn play_index(&mut self, index: usize) {
        self.player.load_video(&mut self.playlist, index);
    }

    pub fn play_now(&mut self, video_id: &str) {
        let id = video_id.to_owned();
        self.player.play_now(&mut self.playlist, &id);
        self.search.close();
    }

    /// Add whatever is in the video input field: a URL or a bare id.
    pub fn add_video_from_input(&mut self) {
        let raw = self.video_input.trim().to_owned();
        if raw.is_empty() {
            return;
        }
        let Some(id) = crate::youtube::extract_video_id(&raw) else {
            self.show_error("Invalid YouTube URL or Video ID");
            return;
        };
        match self.playlist.add(&id, "", "") {
            Ok(()) => {
                self.video_input.clear();
                self.save_playlist();
                // Backfill the placeholder title when a key is available.
                if self.client().has_key() {
                    self.fetch_details(&id, false);
                }
            }
            Err(e) => self.show_error(e.to_string()),
        }
    }

    /// Search "Add": look details up first so the entry lands with a real
    /// title, then add.
    pub fn add_search_result(&mut self, result: &SearchResult) {
        if self.client().has_key() && result.title.is_empty() {
            self.fetch_details(&result.id, true);
            return;
        }
        match self
            .playlist
            .add(&result.id, &result.title, &result.thumbnail)
        {
            Ok(()) => self.save_playlist(),
            Err(e) => self.show_error(e.to_string()),
        }
    }

    pub fn remove_index(&mut self, index: usize) {
        match self.playlist.remove(index) {
            Ok(removed) => {
                log::debug!("removed {}", removed.id);
                self.save_playlist();
                // Keep the frame on a valid entry, as the original shell
                // reloads the (possibly clamped) current video.
                if let Some(current) = self.playlist.current_index() {
                    self.player.load_video(&mut self.playlist, current);
                }
            }
            Err(e) => self.show_error(e.to_string()),
        }
    }

    /// Best-effort title backfill for placeholder entries.
    pub fn enrich_playlist(&mut self) {
        let client = self.client();
        if !client.has_key() {
            return;
        }
        let ids = self.playlist.ids_needing_enrichment();
        if ids.is_empty() {
            return;
        }
        let tx = self.worker_tx.clone();
        std::thread::spawn(move || {
            for id in ids {
                let details = match client.video_details(&id) {
                    Ok(details) => details,
                    Err(e) => {
                        // Silent by design at the UI; placeholder stays.
                        log::debug!("enrichment lookup failed for {id}: {e}");
                        None
                    }
                };
                let _ = tx.send(WorkerEvent::DetailsFetched {
                    id,
                    details,
                    then_add: false,
                });
            }
        });
    }

    fn fetch_details(&self, video_id: &str, then_add: bool) {
        let client = self.client();
        let id = video_id.to_owned();
        let tx = self.worker_tx.clone();
        std::thread::spawn(move || {
            let details = match client.video_details(&id) {
                Ok(details) => details,
                Err(e) => {
                    log::warn!("video details lookup failed for {id}: {e}");
                    None
                }
            };
            let _ = tx.send(WorkerEvent::DetailsFetched {
                id,
                details,
                then_add,
            });
        });
    }

    pub fn dispatch_search(&mut self, dispatch: Dispatch) {
        let client = self.client();
        let filters = self.search_filters.clone();
        let tx = self.worker_tx.clone();
        std::thread::spawn(move || {
            let result = client
                .search(&dispatch.query, SEARCH_MAX_RESULTS, &filters)
                .map_err(|e| e.to_string());
            let _ = tx.send(WorkerEvent::SearchFinished {
                seq: dispatch.seq,
                result,
            });
        });
    }

    /// Kick off an image fetch through the cache engine unless it is
    /// already resolved or in flight.
    pub fn request_image(&mut self, url: &str) {
        if url.is_empty()
            || self.images.contains_key(url)
            || self.pending_images.contains(url)
        {
            return;
        }
        self.pending_images.insert(url.to_owned());
        let cache = self.cache.clone();
        let tx = self.worker_tx.clone();
        let url = url.to_owned();
        std::thread::spawn(move || {
            let response = cache.fetch(Request::get(url.clone()));
            let _ = tx.send(WorkerEvent::ImageLoaded { url, response });
        });
    }

    pub fn image_bytes(&self, url: &str) -> Option<Arc<[u8]>> {
        self.images.get(url).and_then(Clone::clone)
    }

    pub fn clear_caches(&mut self) {
        if self.cache.clear_caches() {
            log::info!("all caches cleared");
            self.images.clear();
        } else {
            self.show_error("Failed to clear caches");
        }
    }

    fn drain_events(&mut self, now: Instant) {
        while let Ok(event) = self.worker_rx.try_recv() {
            match event {
                WorkerEvent::SearchFinished { seq, result } => match result {
                    Ok(results) => {
                        self.search.finish(seq, results, now);
                    }
                    Err(e) => {
                        self.search.finish(seq, Vec::new(), now);
                        self.show_error(format!("Search failed: {e}"));
                    }
                },
                WorkerEvent::DetailsFetched {
                    id,
                    details,
                    then_add,
                } => {
                    let (title, thumbnail) = details
                        .map(|d| (d.title, d.thumbnail))
                        .unwrap_or_default();
                    if then_add {
                        match self.playlist.add(&id, &title, &thumbnail) {
                            Ok(()) => self.save_playlist(),
                            Err(e) => self.show_error(e.to_string()),
                        }
                    } else if self.playlist.apply_enrichment(&id, &title, &thumbnail) {
                        self.save_playlist();
                    }
                }
                WorkerEvent::ImageLoaded { url, response } => {
                    self.pending_images.remove(&url);
                    let bytes = if response.is_success() && !response.body.is_empty() {
                        Some(Arc::from(response.body))
                    } else {
                        log::debug!("image fetch degraded for {url}: {}", response.status);
                        None
                    };
                    self.images.insert(url, bytes);
                }
                WorkerEvent::CacheVersion(version) => {
                    self.cache_version = version;
                }
            }
        }
        while let Ok(event) = self.cache_events.try_recv() {
            let ServiceEvent::Notification(note) = event;
            log::info!("notification: {}", note.body);
            self.notifications.push(note);
        }
    }
}

impl eframe::App for UnwrappedApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();

        if self.clock.update() {
            ctx.request_repaint_after(CLOCK_UPDATE_INTERVAL);
        }
        if let Some(url) = self.background.tick(now) {
            let url = url.to_owned();
            self.request_image(&url);
        }
        if let Some(dispatch) = self.search.poll(now) {
            self.dispatch_search(dispatch);
        }
        self.search.tick(now);
        self.errors
            .retain(|(_, shown)| now.duration_since(*shown) < ERROR_BANNER_TTL);
        self.drain_events(now);

        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.search.close();
        }

        self.draw(ctx, now);

        // Keep timers honest even when nothing else repaints.
        ctx.request_repaint_after(CLOCK_UPDATE_INTERVAL);
    }
}

/// Wrapper so an initialization failure still puts a window on screen with
/// the error message instead of dying silently.
pub enum ShellApp {
    Running(Box<UnwrappedApp>),
    Failed(String),
}

impl eframe::App for ShellApp {
    fn update(&mut self, ctx: &egui::Context, frame: &mut eframe::Frame) {
        match self {
            Self::Running(app) => eframe::App::update(app.as_mut(), ctx, frame),
            Self::Failed(message) => {
                let message = message.clone();
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("UnWrapped failed to start");
                    ui.label(message);
                    ui.label("Please restart the application.");
                });
            }
        }
    }
}
