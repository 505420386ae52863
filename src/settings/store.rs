//! Atomic settings snapshot store with partial reloads.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;
use log::{error, info};

use super::schema::Settings;

/// One committed view of all reloadable state.
///
/// Replaced wholesale on reload; readers holding an `Arc<Snapshot>` keep a
/// consistent view for as long as they need it.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub settings: Settings,
    pub faq: String,
    pub banned_words: HashSet<String>,
}

/// Outcome of one reload. Per-resource failures are recorded here rather
/// than propagated; the resource keeps its previous value.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub errors: Vec<String>,
}

impl LoadReport {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    fn record(&mut self, resource: &str, path: &Path, err: &str) {
        let message = format!("Failed to load {} from {}: {}", resource, path.display(), err);
        error!("{}", message);
        self.errors.push(message);
    }
}

pub struct SettingsStore {
    config_path: PathBuf,
    snapshot: ArcSwap<Snapshot>,
    reload_lock: Mutex<()>,
}

impl SettingsStore {
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            snapshot: ArcSwap::from_pointee(Snapshot::default()),
            reload_lock: Mutex::new(()),
        }
    }

    /// Latest committed snapshot. A lock-free pointer load, safe to call
    /// from the event loop.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.load_full()
    }

    /// Current settings, cloned out of the snapshot.
    pub fn settings(&self) -> Settings {
        self.snapshot.load().settings.clone()
    }

    /// The files a watcher should track: the config document plus the FAQ
    /// and banned-word paths it currently names.
    pub fn watched_paths(&self) -> Vec<PathBuf> {
        let snapshot = self.snapshot();
        vec![
            self.config_path.clone(),
            snapshot.settings.faq_file.clone(),
            snapshot.settings.banned_words_file.clone(),
        ]
    }

    /// Reloads the config document, FAQ text, and banned-word list, then
    /// commits a new snapshot. The three loads are independent: a resource
    /// that fails to load keeps its previous value. Reloads are serialized
    /// so concurrent file events cannot interleave.
    pub fn load(&self) -> LoadReport {
        let _guard = self
            .reload_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let previous = self.snapshot.load_full();
        let mut report = LoadReport::default();

        let settings = match read_settings(&self.config_path) {
            Ok(settings) => {
                info!("Loaded settings from {}", self.config_path.display());
                settings
            }
            Err(e) => {
                report.record("settings", &self.config_path, &e);
                previous.settings.clone()
            }
        };

        // The FAQ and banned-word paths come from the settings just loaded,
        // so a path change in the config document takes effect on the same
        // reload.
        let faq = match fs::read_to_string(&settings.faq_file) {
            Ok(text) => {
                info!("Loaded FAQ from {}", settings.faq_file.display());
                text
            }
            Err(e) => {
                report.record("FAQ", &settings.faq_file, &e.to_string());
                previous.faq.clone()
            }
        };

        let banned_words = match fs::read_to_string(&settings.banned_words_file) {
            Ok(text) => {
                let words = parse_banned_words(&text);
                info!(
                    "Loaded {} banned words from {}",
                    words.len(),
                    settings.banned_words_file.display()
                );
                words
            }
            Err(e) => {
                report.record("banned words", &settings.banned_words_file, &e.to_string());
                previous.banned_words.clone()
            }
        };

        self.snapshot.store(Arc::new(Snapshot {
            settings,
            faq,
            banned_words,
        }));

        report
    }
}

fn read_settings(path: &Path) -> std::result::Result<Settings, String> {
    let document = fs::read_to_string(path).map_err(|e| e.to_string())?;
    Settings::parse(&document).map_err(|e| e.to_string())
}

/// One word per line, blank lines skipped, lowercased for matching.
fn parse_banned_words(text: &str) -> HashSet<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_lowercase)
        .collect()
}
