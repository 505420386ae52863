//! File watch wiring for hot reloads.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{info, warn};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::error::Result;

use super::store::SettingsStore;

/// Keeps the underlying watcher alive; dropping it stops the watch.
pub struct WatchGuard {
    _watcher: RecommendedWatcher,
}

/// Starts watching the store's config, FAQ, and banned-word files,
/// reloading the store whenever one of them changes on disk.
///
/// The watch set is resolved once, from the snapshot current when the watch
/// starts. Reload serialization lives in [`SettingsStore::load`], so events
/// arriving close together cannot interleave.
pub fn watch(store: Arc<SettingsStore>) -> Result<WatchGuard> {
    let watched: HashSet<PathBuf> = store
        .watched_paths()
        .iter()
        .map(|path| absolute(path))
        .collect();

    let directories: HashSet<PathBuf> = watched
        .iter()
        .map(|path| {
            path.parent()
                .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
        })
        .collect();

    let callback_watched = watched.clone();
    let callback_store = Arc::clone(&store);
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) => {
            if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                return;
            }
            if event
                .paths
                .iter()
                .any(|path| callback_watched.contains(&absolute(path)))
            {
                info!("Detected change in {:?}, reloading configuration", event.paths);
                callback_store.load();
            }
        }
        Err(e) => warn!("File watch error: {}", e),
    })?;

    for directory in &directories {
        watcher.watch(directory, RecursiveMode::NonRecursive)?;
    }

    info!(
        "File watch started for hot reload, watching {} files",
        watched.len()
    );

    Ok(WatchGuard { _watcher: watcher })
}

/// Event paths arrive absolute; normalize ours the same way so comparison
/// is reliable. Falls back to the path as given when the process cwd is
/// unavailable.
fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
