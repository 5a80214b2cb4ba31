//! Offline cache engine for the UnWrapped player shell.
//!
//! The engine owns a set of named, atomically-replaceable cache
//! *generations* on disk and serves fetches through one of a small set of
//! HTTP caching strategies (pass-through, cache-first, network-first). It
//! runs on its own thread with single-threaded state; the application talks
//! to it exclusively through [`CacheHandle`], a message channel with
//! optional reply ports.

pub mod fetch;
pub mod response;
pub mod service;
pub mod store;
pub mod strategy;

pub use fetch::{Fetcher, UreqFetcher};
pub use response::StoredResponse;
pub use service::{
    spawn_default, CacheConfig, CacheHandle, CacheService, Notification, NotificationAction,
    Request, ServiceEvent, CACHE_NAME, RUNTIME_CACHE,
};
pub use store::{CacheStore, StoreError};
pub use strategy::Strategy;
