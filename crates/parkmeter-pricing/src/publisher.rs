// Copyright 2025 Parkmeter Contributors
// SPDX-License-Identifier: Apache-2.0

//! # Cache Publisher
//!
//! Keeps the shared pricing region in step with the pricing store: publish
//! once at startup, then block on file-change notifications and republish
//! whenever the store is written.
//!
//! The watch covers the store's parent directory rather than the file, so
//! replacing the file (a `Create` event) is noticed as well as writes to it
//! (`Access(Close(Write))`). Bursts of events are coalesced into a single
//! reload. A reload that fails leaves the previous snapshot in place.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Receiver, Sender};
use notify::event::{AccessKind, AccessMode};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use tracing::{debug, error, info, warn};

use crate::error::{PricingError, Result};
use crate::shared_cache::SharedPricingCache;
use crate::store::load_table;

/// Outcome of one reload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishReport {
    pub zones: usize,
    pub generation: u64,
    pub elapsed: Duration,
}

/// Shutdown signal for [`CachePublisher::watch`]
///
/// Sending on, or dropping, the sender stops the loop.
pub fn shutdown_channel() -> (Sender<()>, Receiver<()>) {
    channel::bounded(1)
}

/// Rebuilds the shared region from the pricing store
pub struct CachePublisher {
    store_path: PathBuf,
    store_file_name: OsString,
    cache: SharedPricingCache,
}

impl CachePublisher {
    pub fn new(store_path: &Path, cache: SharedPricingCache) -> Self {
        let store_file_name = store_path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        Self {
            store_path: store_path.to_path_buf(),
            store_file_name,
            cache,
        }
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    pub fn cache(&self) -> &SharedPricingCache {
        &self.cache
    }

    pub fn into_cache(self) -> SharedPricingCache {
        self.cache
    }

    /// Load the store and publish it
    pub fn reload_and_publish(&self) -> Result<PublishReport> {
        let started = Instant::now();
        let table = load_table(&self.store_path)?;
        let generation = self.cache.publish(&table)?;
        let report = PublishReport {
            zones: table.len(),
            generation,
            elapsed: started.elapsed(),
        };
        info!(
            "Published {} pricing zones from {:?} (generation {}, {:?})",
            report.zones, self.store_path, report.generation, report.elapsed
        );
        Ok(report)
    }

    /// Watch the pricing store until `shutdown` fires
    ///
    /// Does not publish on entry; call [`Self::reload_and_publish`] first.
    pub fn watch(&self, shutdown: &Receiver<()>) -> Result<()> {
        let (event_tx, event_rx) = channel::unbounded();
        let mut watcher = notify::recommended_watcher(move |event: notify::Result<Event>| {
            // Receiver gone means the loop already exited
            let _ = event_tx.send(event);
        })?;

        let watch_dir = self.watch_dir();
        watcher.watch(&watch_dir, RecursiveMode::NonRecursive)?;
        info!(
            "Watching {:?} for changes to {:?}",
            watch_dir, self.store_file_name
        );

        let result = self.run_watch_loop(&event_rx, shutdown);
        if let Err(e) = watcher.unwatch(&watch_dir) {
            debug!("Failed to remove watch on {:?}: {}", watch_dir, e);
        }
        result
    }

    /// Event loop behind [`Self::watch`], fed by any event channel
    pub fn run_watch_loop(
        &self,
        events: &Receiver<notify::Result<Event>>,
        shutdown: &Receiver<()>,
    ) -> Result<()> {
        loop {
            channel::select! {
                recv(shutdown) -> _ => {
                    info!("Pricing store watch stopped");
                    return Ok(());
                }
                recv(events) -> message => {
                    let event = match message {
                        Ok(event) => event,
                        Err(_) => {
                            return Err(PricingError::Watch(notify::Error::generic(
                                "change notification channel closed",
                            )));
                        }
                    };
                    if !self.should_reload(&event) {
                        continue;
                    }
                    let coalesced = events.try_iter().count();
                    if coalesced > 0 {
                        debug!("Coalesced {} queued change events", coalesced);
                    }
                    if let Err(e) = self.reload_and_publish() {
                        error!("Pricing reload failed, keeping previous snapshot: {}", e);
                    }
                }
            }
        }
    }

    fn should_reload(&self, event: &notify::Result<Event>) -> bool {
        match event {
            Ok(event) => {
                let relevant = is_reload_trigger(event, &self.store_file_name);
                if relevant {
                    debug!("Pricing store changed: {:?}", event.kind);
                }
                relevant
            }
            Err(e) => {
                warn!("Change notification error: {}", e);
                false
            }
        }
    }

    fn watch_dir(&self) -> PathBuf {
        match self.store_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

/// Whether `event` means the store file was written or replaced
pub fn is_reload_trigger(event: &Event, store_file_name: &std::ffi::OsStr) -> bool {
    let kind_matches = matches!(
        event.kind,
        EventKind::Access(AccessKind::Close(AccessMode::Write)) | EventKind::Create(_)
    );
    kind_matches
        && event
            .paths
            .iter()
            .any(|path| path.file_name() == Some(store_file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, ModifyKind};
    use std::ffi::OsStr;

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn test_close_write_on_store_triggers() {
        let close_write = EventKind::Access(AccessKind::Close(AccessMode::Write));
        assert!(is_reload_trigger(
            &event(close_write, "/var/lib/parkmeter/pricing.db"),
            OsStr::new("pricing.db")
        ));
    }

    #[test]
    fn test_recreate_triggers() {
        assert!(is_reload_trigger(
            &event(EventKind::Create(CreateKind::File), "/data/pricing.db"),
            OsStr::new("pricing.db")
        ));
    }

    #[test]
    fn test_other_files_and_kinds_ignored() {
        let close_write = EventKind::Access(AccessKind::Close(AccessMode::Write));
        assert!(!is_reload_trigger(
            &event(close_write, "/data/pricing.db-journal"),
            OsStr::new("pricing.db")
        ));
        assert!(!is_reload_trigger(
            &event(EventKind::Modify(ModifyKind::Any), "/data/pricing.db"),
            OsStr::new("pricing.db")
        ));
        assert!(!is_reload_trigger(
            &event(EventKind::Access(AccessKind::Close(AccessMode::Read)), "/data/pricing.db"),
            OsStr::new("pricing.db")
        ));
    }

    #[test]
    fn test_shutdown_sender_drop_stops_loop() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("pricing.db");
        crate::store::PricingStore::open(&store).unwrap();
        let cache = SharedPricingCache::create(&dir.path().join("region"), 4864).unwrap();
        let publisher = CachePublisher::new(&store, cache);

        let (_events_tx, events_rx) = channel::unbounded();
        let (shutdown_tx, shutdown_rx) = shutdown_channel();
        drop(shutdown_tx);

        publisher.run_watch_loop(&events_rx, &shutdown_rx).unwrap();
    }

    #[test]
    fn test_watch_dir_for_bare_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SharedPricingCache::create(&dir.path().join("region"), 4864).unwrap();
        let publisher = CachePublisher::new(Path::new("pricing.db"), cache);
        assert_eq!(publisher.watch_dir(), PathBuf::from("."));
    }
}
