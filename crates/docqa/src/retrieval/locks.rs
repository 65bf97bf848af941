//! Per-location write locks

use dashmap::DashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Serializes ingestion calls that target the same persist location
///
/// Different locations proceed in parallel. Queries never take these locks.
#[derive(Debug, Default, Clone)]
pub struct LocationLocks {
    locks: Arc<DashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl LocationLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `location`; released when the guard drops
    pub async fn acquire(&self, location: &Path) -> OwnedMutexGuard<()> {
        let key = normalize(location);
        let lock = self
            .locks
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }
}

/// Lexically absolute key, so `a/idx` and `./a/idx` share a lock whether or not the directory exists yet
fn normalize(location: &Path) -> PathBuf {
    let absolute = if location.is_absolute() {
        location.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(location))
            .unwrap_or_else(|_| location.to_path_buf())
    };
    absolute
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}
