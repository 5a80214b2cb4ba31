mod app;
mod background;
mod clock;
mod config;
mod player;
mod playlist;
mod search;
mod storage;
mod ui;
mod youtube;

use anyhow::Context as _;
use crossbeam::channel::Receiver;
use eframe::NativeOptions;
use unwrapped_cache::{CacheConfig, CacheHandle, ServiceEvent};

use crate::app::{ShellApp, UnwrappedApp};
use crate::storage::Storage;

fn main() -> eframe::Result<()> {
    env_logger::init();
    log::info!("UnWrapped - initializing...");

    let native_options = NativeOptions::default();
    eframe::run_native(
        "UnWrapped",
        native_options,
        Box::new(|cc| {
            let shell = match setup() {
                Ok((storage, cache, cache_events)) => {
                    log::info!("UnWrapped - initialized successfully");
                    ShellApp::Running(Box::new(UnwrappedApp::new(
                        cc,
                        storage,
                        cache,
                        cache_events,
                    )))
                }
                Err(e) => {
                    log::error!("initialization failed: {e:#}");
                    ShellApp::Failed(format!("Failed to initialize application: {e:#}"))
                }
            };
            Ok(Box::new(shell))
        }),
    )
}

/// Open storage and spin the cache service up. Everything here is
/// fallible; a failure surfaces in-window rather than killing the process.
fn setup() -> anyhow::Result<(Storage, CacheHandle, Receiver<ServiceEvent>)> {
    let storage = Storage::open_default()?;
    let cache_root = dirs::cache_dir()
        .context("no user cache directory")?
        .join("unwrapped");
    let cache_config = CacheConfig {
        // Warm the versioned generation with the backdrop pool so a fresh
        // start still paints offline.
        precache: config::BACKGROUND_IMAGES
            .iter()
            .map(|&url| url.to_owned())
            .collect(),
        ..CacheConfig::default()
    };
    let (cache, cache_events) = unwrapped_cache::spawn_default(cache_root, cache_config)
        .context("opening cache store")?;
    Ok((storage, cache, cache_events))
}
