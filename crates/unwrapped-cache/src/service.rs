//! The cache service: lifecycle, fetch routing and the message protocol.
//!
//! The service owns the on-disk store and a network fetcher and runs on its
//! own thread. Two generations are live at any time: the versioned
//! generation holding the precached shell assets, and the runtime
//! generation populated as resources are first seen. Activation deletes
//! every other generation.

use crossbeam::channel::{bounded, unbounded, Receiver, Sender};

use crate::fetch::Fetcher;
use crate::response::StoredResponse;
use crate::store::{CacheStore, StoreError};
use crate::strategy::{self, Strategy};

/// Name of the versioned generation. Bumping this supersedes the previous
/// install wholesale.
pub const CACHE_NAME: &str = "unwrapped-v1.0.0";

/// Name of the runtime generation, populated on first use.
pub const RUNTIME_CACHE: &str = "unwrapped-runtime";

/// A request as seen by the cache layer.
#[derive(Debug, Clone)]
pub struct Request {
    pub url: String,
    pub is_get: bool,
    /// Navigation requests fall back to the cached document shell when both
    /// network and cache miss.
    pub is_navigation: bool,
}

impl Request {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            is_get: true,
            is_navigation: false,
        }
    }

    pub fn navigation(url: impl Into<String>) -> Self {
        Self {
            is_navigation: true,
            ..Self::get(url)
        }
    }
}

/// Service configuration, passed in explicitly rather than read from
/// ambient globals.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Versioned generation name.
    pub version: String,
    /// Runtime generation name.
    pub runtime: String,
    /// Shell assets fetched into the versioned generation on install.
    pub precache: Vec<String>,
    /// Document shell served to navigation requests when offline.
    pub shell_url: Option<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            version: CACHE_NAME.to_owned(),
            runtime: RUNTIME_CACHE.to_owned(),
            precache: Vec::new(),
            shell_url: None,
        }
    }
}

/// Requests accepted over the service channel.
pub enum Message {
    /// Skip the update wait and activate immediately.
    SkipWaiting,
    /// Delete every generation; acknowledged over the reply port.
    ClearCaches { reply: Sender<bool> },
    /// Report the active cache version name.
    GetVersion { reply: Sender<String> },
    /// Serve one request through the routed strategy.
    Fetch {
        request: Request,
        reply: Sender<StoredResponse>,
    },
    /// A push payload arrived; surface it as a notification.
    Push { body: Option<String> },
}

/// Events the service emits back to the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceEvent {
    Notification(Notification),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationAction {
    Open,
    Close,
}

/// Push/notification payload: plain text body, fixed icon and badge, two
/// actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub tag: String,
    pub actions: [NotificationAction; 2],
}

impl Notification {
    pub fn push(body: Option<String>) -> Self {
        Self {
            body: body.unwrap_or_else(|| "New update available!".to_owned()),
            icon: "icons/icon-192x192.png".to_owned(),
            badge: "icons/icon-72x72.png".to_owned(),
            tag: "unwrapped-notification".to_owned(),
            actions: [NotificationAction::Open, NotificationAction::Close],
        }
    }
}

/// Handle held by the application; clones share one service.
#[derive(Clone)]
pub struct CacheHandle {
    tx: Sender<Message>,
}

impl CacheHandle {
    /// Serve a request through the cache. A dead service degrades to the
    /// synthesized offline response.
    pub fn fetch(&self, request: Request) -> StoredResponse {
        let (reply, rx) = bounded(1);
        if self.tx.send(Message::Fetch { request, reply }).is_err() {
            return StoredResponse::offline();
        }
        rx.recv().unwrap_or_else(|_| StoredResponse::offline())
    }

    /// Clear all caches; returns the acknowledgment from the reply port.
    pub fn clear_caches(&self) -> bool {
        let (reply, rx) = bounded(1);
        if self.tx.send(Message::ClearCaches { reply }).is_err() {
            return false;
        }
        rx.recv().unwrap_or(false)
    }

    /// Active cache version, if the service is still running.
    pub fn version(&self) -> Option<String> {
        let (reply, rx) = bounded(1);
        self.tx.send(Message::GetVersion { reply }).ok()?;
        rx.recv().ok()
    }

    pub fn skip_waiting(&self) {
        let _ = self.tx.send(Message::SkipWaiting);
    }

    pub fn push(&self, body: Option<String>) {
        let _ = self.tx.send(Message::Push { body });
    }
}

/// The cache service state machine. Single-threaded; all state mutation
/// happens on the service thread.
pub struct CacheService<F: Fetcher> {
    store: CacheStore,
    fetcher: F,
    config: CacheConfig,
    events: Sender<ServiceEvent>,
    waiting: bool,
}

impl<F: Fetcher + 'static> CacheService<F> {
    pub fn new(
        store: CacheStore,
        fetcher: F,
        config: CacheConfig,
        events: Sender<ServiceEvent>,
    ) -> Self {
        Self {
            store,
            fetcher,
            config,
            events,
            waiting: true,
        }
    }

    /// Spawn the service on its own thread. Returns the handle plus the
    /// event stream the service reports notifications on.
    pub fn spawn(
        store: CacheStore,
        fetcher: F,
        config: CacheConfig,
    ) -> (CacheHandle, Receiver<ServiceEvent>) {
        let (tx, rx) = unbounded::<Message>();
        let (event_tx, event_rx) = unbounded();
        let mut service = Self::new(store, fetcher, config, event_tx);
        std::thread::Builder::new()
            .name("unwrapped-cache".into())
            .spawn(move || {
                service.install();
                service.activate();
                while let Ok(msg) = rx.recv() {
                    service.handle(msg);
                }
                log::debug!("cache service channel closed, stopping");
            })
            .expect("failed to spawn cache service thread");
        (CacheHandle { tx }, event_rx)
    }

    /// Precache the shell assets into the versioned generation. Individual
    /// failures are logged and skipped; install itself never fails.
    pub fn install(&mut self) {
        log::info!("cache install: precaching {} assets", self.config.precache.len());
        for url in &self.config.precache {
            match self.fetcher.fetch(url) {
                Ok(resp) if resp.is_cacheable() => {
                    if let Err(e) = self.store.put(&self.config.version, url, &resp) {
                        log::warn!("precache store failed for {url}: {e}");
                    }
                }
                Ok(resp) => log::warn!("precache skipped {url}: status {}", resp.status),
                Err(e) => log::warn!("precache fetch failed for {url}: {e}"),
            }
        }
        // Install-time skip: the fresh version takes over immediately.
        self.waiting = false;
    }

    /// Delete every generation not matching the two current names. Emits an
    /// update notification when a stale install was superseded.
    pub fn activate(&mut self) {
        let known = [self.config.version.as_str(), self.config.runtime.as_str()];
        let names = match self.store.generation_names() {
            Ok(names) => names,
            Err(e) => {
                log::warn!("cache activate: listing generations failed: {e}");
                return;
            }
        };
        let mut deleted = 0usize;
        for name in names {
            if known.contains(&name.as_str()) {
                continue;
            }
            log::info!("cache activate: deleting stale generation {name}");
            match self.store.delete_generation(&name) {
                Ok(()) => deleted += 1,
                Err(e) => log::warn!("cache activate: delete {name} failed: {e}"),
            }
        }
        if deleted > 0 {
            self.notify(Notification::push(None));
        }
    }

    /// Handle one protocol message.
    pub fn handle(&mut self, msg: Message) {
        match msg {
            Message::SkipWaiting => {
                log::debug!("skip waiting requested");
                self.waiting = false;
            }
            Message::ClearCaches { reply } => {
                let ok = match self.store.clear() {
                    Ok(()) => true,
                    Err(e) => {
                        log::warn!("clear caches failed: {e}");
                        false
                    }
                };
                let _ = reply.send(ok);
            }
            Message::GetVersion { reply } => {
                let _ = reply.send(self.config.version.clone());
            }
            Message::Fetch { request, reply } => {
                let _ = reply.send(self.fetch(&request));
            }
            Message::Push { body } => {
                self.notify(Notification::push(body));
            }
        }
    }

    pub fn is_waiting(&self) -> bool {
        self.waiting
    }

    /// Serve one request through its routed strategy.
    pub fn fetch(&mut self, request: &Request) -> StoredResponse {
        match strategy::route(request) {
            Strategy::PassThrough => self.pass_through(request),
            Strategy::CacheFirst => self.cache_first(request),
            Strategy::NetworkFirst => self.network_first(request),
        }
    }

    fn pass_through(&mut self, request: &Request) -> StoredResponse {
        match self.fetcher.fetch(&request.url) {
            Ok(resp) => resp,
            Err(e) => {
                log::warn!("pass-through fetch failed for {}: {e}", request.url);
                StoredResponse::offline()
            }
        }
    }

    fn cache_first(&mut self, request: &Request) -> StoredResponse {
        if let Some(hit) = self.lookup(&request.url) {
            log::debug!("cache hit: {}", request.url);
            return hit;
        }
        log::debug!("cache miss, fetching: {}", request.url);
        match self.fetcher.fetch(&request.url) {
            Ok(resp) => {
                self.populate_runtime(&request.url, &resp);
                resp
            }
            Err(e) => {
                log::warn!("cache-first fetch failed for {}: {e}", request.url);
                StoredResponse::unavailable()
            }
        }
    }

    fn network_first(&mut self, request: &Request) -> StoredResponse {
        match self.fetcher.fetch(&request.url) {
            Ok(resp) => {
                self.populate_runtime(&request.url, &resp);
                resp
            }
            Err(e) => {
                log::debug!("network failed, trying cache: {} ({e})", request.url);
                if let Some(hit) = self.lookup(&request.url) {
                    return hit;
                }
                if request.is_navigation {
                    if let Some(shell) = self.shell_fallback() {
                        return shell;
                    }
                }
                StoredResponse::offline()
            }
        }
    }

    fn shell_fallback(&self) -> Option<StoredResponse> {
        let shell = self.config.shell_url.as_deref()?;
        self.lookup(shell)
    }

    fn lookup(&self, url: &str) -> Option<StoredResponse> {
        self.store
            .get_any(&[&self.config.runtime, &self.config.version], url)
    }

    fn populate_runtime(&mut self, url: &str, resp: &StoredResponse) {
        if !resp.is_cacheable() {
            return;
        }
        if let Err(e) = self.store.put(&self.config.runtime, url, resp) {
            log::warn!("cache populate failed for {url}: {e}");
        }
    }

    fn notify(&self, notification: Notification) {
        let _ = self.events.send(ServiceEvent::Notification(notification));
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }
}

/// Convenience for opening the store and spawning the live service in one
/// call.
pub fn spawn_default(
    root: impl Into<std::path::PathBuf>,
    config: CacheConfig,
) -> Result<(CacheHandle, Receiver<ServiceEvent>), StoreError> {
    let store = CacheStore::open(root)?;
    Ok(CacheService::spawn(
        store,
        crate::fetch::UreqFetcher,
        config,
    ))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::fetch::stub::StubFetcher;
    use tempfile::TempDir;

    const CDN_URL: &str = "https://images.unsplash.com/photo-1470225620780?w=1200";
    const THUMB_URL: &str = "https://i.ytimg.com/vi/abc123/default.jpg";
    const SHELL_URL: &str = "https://unwrapped.example/index.html";

    fn image(bytes: &[u8]) -> StoredResponse {
        StoredResponse::new(200, "image/jpeg", bytes.to_vec())
    }

    fn service(
        fetcher: Arc<StubFetcher>,
        config: CacheConfig,
    ) -> (TempDir, CacheService<Arc<StubFetcher>>, Receiver<ServiceEvent>) {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::open(dir.path()).unwrap();
        let (events, event_rx) = unbounded();
        (dir, CacheService::new(store, fetcher, config, events), event_rx)
    }

    #[test]
    fn cache_first_populates_then_serves_without_network() {
        let fetcher = Arc::new(StubFetcher::new().with(CDN_URL, image(b"pixels")));
        let (_dir, mut svc, _events) = service(fetcher.clone(), CacheConfig::default());

        let first = svc.fetch(&Request::get(CDN_URL));
        assert_eq!(first.body, b"pixels");
        assert_eq!(fetcher.call_count(), 1);

        // The network now dies; the cached copy still serves.
        fetcher.remove(CDN_URL);
        let second = svc.fetch(&Request::get(CDN_URL));
        assert_eq!(second.body, b"pixels");
        assert_eq!(fetcher.call_count(), 1);
    }

    #[test]
    fn cache_first_miss_with_dead_network_is_empty_503() {
        let fetcher = Arc::new(StubFetcher::new());
        let (_dir, mut svc, _events) = service(fetcher, CacheConfig::default());

        let resp = svc.fetch(&Request::get(CDN_URL));
        assert_eq!(resp.status, 503);
        assert!(resp.body.is_empty());
    }

    #[test]
    fn network_first_falls_back_to_cached_copy() {
        let fetcher = Arc::new(StubFetcher::new().with(THUMB_URL, image(b"fresh")));
        let (_dir, mut svc, _events) = service(fetcher.clone(), CacheConfig::default());

        assert_eq!(svc.fetch(&Request::get(THUMB_URL)).body, b"fresh");

        fetcher.remove(THUMB_URL);
        let stale = svc.fetch(&Request::get(THUMB_URL));
        assert_eq!(stale.body, b"fresh");
        assert_eq!(stale.status, 200);
    }

    #[test]
    fn network_first_without_cache_synthesizes_offline_503() {
        let fetcher = Arc::new(StubFetcher::new());
        let (_dir, mut svc, _events) = service(fetcher, CacheConfig::default());

        let resp = svc.fetch(&Request::get(THUMB_URL));
        assert_eq!(resp.status, 503);
        assert_eq!(resp.body_text(), "Offline - Unable to fetch resource");
    }

    #[test]
    fn offline_navigation_falls_back_to_precached_shell() {
        let fetcher = Arc::new(StubFetcher::new().with(SHELL_URL, StoredResponse::new(
            200,
            "text/html",
            b"<html>shell</html>".to_vec(),
        )));
        let config = CacheConfig {
            precache: vec![SHELL_URL.to_owned()],
            shell_url: Some(SHELL_URL.to_owned()),
            ..CacheConfig::default()
        };
        let (_dir, mut svc, _events) = service(fetcher.clone(), config);
        svc.install();

        fetcher.remove(SHELL_URL);
        let resp = svc.fetch(&Request::navigation("https://unwrapped.example/somewhere"));
        assert_eq!(resp.body, b"<html>shell</html>");
    }

    #[test]
    fn non_200_responses_are_served_but_not_cached() {
        let fetcher = Arc::new(StubFetcher::new().with(
            THUMB_URL,
            StoredResponse::new(404, "text/plain", b"gone".to_vec()),
        ));
        let (_dir, mut svc, _events) = service(fetcher.clone(), CacheConfig::default());

        assert_eq!(svc.fetch(&Request::get(THUMB_URL)).status, 404);
        fetcher.remove(THUMB_URL);
        // Nothing was cached, so the failure degrades to offline.
        assert_eq!(svc.fetch(&Request::get(THUMB_URL)).status, 503);
    }

    #[test]
    fn pass_through_is_never_cached() {
        let api = "https://www.googleapis.com/youtube/v3/search?q=x";
        let fetcher = Arc::new(StubFetcher::new().with(
            api,
            StoredResponse::new(200, "application/json", b"{}".to_vec()),
        ));
        let (_dir, mut svc, _events) = service(fetcher.clone(), CacheConfig::default());

        assert_eq!(svc.fetch(&Request::get(api)).status, 200);
        fetcher.remove(api);
        assert_eq!(svc.fetch(&Request::get(api)).status, 503);
    }

    #[test]
    fn activation_deletes_exactly_the_stale_generations() {
        let fetcher = Arc::new(StubFetcher::new());
        let (_dir, mut svc, _events) = service(fetcher, CacheConfig::default());

        let store = svc.store().clone();
        for name in ["unwrapped-v0.9.0", CACHE_NAME, RUNTIME_CACHE] {
            store.put(name, "https://a.example/x", &image(b"x")).unwrap();
        }
        svc.activate();
        assert_eq!(
            store.generation_names().unwrap(),
            vec![RUNTIME_CACHE.to_owned(), CACHE_NAME.to_owned()]
        );
    }

    #[test]
    fn superseding_an_old_install_emits_an_update_notification() {
        let fetcher = Arc::new(StubFetcher::new());
        let (_dir, mut svc, events) = service(fetcher, CacheConfig::default());

        svc.store()
            .put("unwrapped-v0.9.0", "https://a.example/x", &image(b"x"))
            .unwrap();
        svc.activate();

        let ServiceEvent::Notification(note) = events.try_recv().unwrap();
        assert_eq!(note.body, "New update available!");
        assert_eq!(
            note.actions,
            [NotificationAction::Open, NotificationAction::Close]
        );
    }

    #[test]
    fn install_clears_the_waiting_flag() {
        let fetcher = Arc::new(StubFetcher::new());
        let (_dir, mut svc, _events) = service(fetcher, CacheConfig::default());
        assert!(svc.is_waiting());
        svc.install();
        assert!(!svc.is_waiting());
    }

    #[test]
    fn protocol_round_trip_over_the_spawned_service() {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::open(dir.path()).unwrap();
        store.put(RUNTIME_CACHE, CDN_URL, &image(b"pixels")).unwrap();

        let fetcher = Arc::new(StubFetcher::new());
        let (handle, events) =
            CacheService::spawn(store.clone(), fetcher, CacheConfig::default());

        assert_eq!(handle.version().as_deref(), Some(CACHE_NAME));

        // Cached CDN image serves even with a dead network.
        let resp = handle.fetch(Request::get(CDN_URL));
        assert_eq!(resp.body, b"pixels");

        // Clearing is acknowledged over the reply port and empties the store.
        assert!(handle.clear_caches());
        assert!(store.generation_names().unwrap().is_empty());

        // Push payloads surface as notifications.
        handle.push(Some("hello".to_owned()));
        let ServiceEvent::Notification(note) = events
            .recv_timeout(std::time::Duration::from_secs(5))
            .unwrap();
        assert_eq!(note.body, "hello");
    }
}
