//! Hot-reloadable configuration store.

mod schema;
mod store;
mod watcher;

pub use schema::Settings;
pub use store::{LoadReport, SettingsStore, Snapshot};
pub use watcher::{WatchGuard, watch};
