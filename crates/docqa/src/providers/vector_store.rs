//! Vector index backend trait for persisting and searching embeddings

use async_trait::async_trait;
use std::path::Path;

use crate::error::Result;
use crate::types::{IndexEntry, RetrievedFragment};

/// Trait for a persistent vector index keyed by a filesystem location
///
/// Implementations:
/// - `SqliteVectorIndex`: single SQLite file per location, brute-force cosine search
#[async_trait]
pub trait VectorIndexBackend: Send + Sync {
    /// Whether an index has been created at `location`
    async fn exists(&self, location: &Path) -> Result<bool>;

    /// Vector dimension recorded by the index, `None` if it holds no entries yet
    async fn dimensions(&self, location: &Path) -> Result<Option<usize>>;

    /// Replace everything at `location` with `entries`
    ///
    /// On failure the previous index must remain readable.
    async fn replace(&self, location: &Path, entries: Vec<IndexEntry>) -> Result<()>;

    /// Add `entries` to the index at `location`, creating it if needed
    async fn append(&self, location: &Path, entries: Vec<IndexEntry>) -> Result<()>;

    /// Top `k` entries by descending similarity to `query`
    async fn search(&self, location: &Path, query: &[f32], k: usize)
        -> Result<Vec<RetrievedFragment>>;

    /// Number of stored entries
    async fn len(&self, location: &Path) -> Result<usize>;

    /// Get backend name for logging
    fn name(&self) -> &str;
}
