//! Vector index bound to one persist location

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::providers::{EmbeddingProvider, VectorIndexBackend};
use crate::types::{Fragment, IndexEntry, IngestMode, RetrievedFragment};

/// A [`VectorIndexBackend`] pinned to a location
#[derive(Clone)]
pub struct VectorIndex {
    backend: Arc<dyn VectorIndexBackend>,
    location: PathBuf,
}

impl VectorIndex {
    /// Bind without checking that anything exists yet (ingestion)
    pub fn new(backend: Arc<dyn VectorIndexBackend>, location: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            location: location.into(),
        }
    }

    /// Bind to an existing, readable index (queries)
    pub async fn open(
        backend: Arc<dyn VectorIndexBackend>,
        location: impl Into<PathBuf>,
    ) -> Result<Self> {
        let index = Self::new(backend, location);
        let location = index.location.display().to_string();

        let exists = index
            .backend
            .exists(&index.location)
            .await
            .map_err(|e| Error::index_unavailable(&location, e.to_string()))?;
        if !exists {
            return Err(Error::index_unavailable(
                &location,
                "the index has not been initialized",
            ));
        }

        let entries = index
            .backend
            .len(&index.location)
            .await
            .map_err(|e| Error::index_unavailable(&location, e.to_string()))?;
        tracing::debug!("Opened index at {} ({} entries)", location, entries);

        Ok(index)
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub async fn exists(&self) -> Result<bool> {
        self.backend.exists(&self.location).await
    }

    pub async fn len(&self) -> Result<usize> {
        self.backend.len(&self.location).await
    }

    /// Embed every fragment, then write them all with `mode`
    ///
    /// Nothing is written unless every embedding succeeded. `Append` on a
    /// location without an index behaves like `Reset`.
    pub async fn ingest(
        &self,
        fragments: Vec<Fragment>,
        mode: IngestMode,
        embedder: &dyn EmbeddingProvider,
        batch_size: usize,
    ) -> Result<usize> {
        let texts: Vec<String> = fragments.iter().map(|f| f.text.clone()).collect();
        let mut vectors = Vec::with_capacity(texts.len());

        for batch in texts.chunks(batch_size.max(1)) {
            let embedded = embedder.embed_batch(batch).await?;
            if embedded.len() != batch.len() {
                return Err(Error::provider(
                    embedder.name(),
                    format!("Expected {} embeddings, got {}", batch.len(), embedded.len()),
                ));
            }
            vectors.extend(embedded);
        }
        tracing::debug!("Embedded {} fragments with {}", vectors.len(), embedder.name());

        let entries: Vec<IndexEntry> = fragments
            .into_iter()
            .zip(vectors)
            .map(|(fragment, vector)| IndexEntry::new(fragment, vector))
            .collect();
        let count = entries.len();

        let effective = match mode {
            IngestMode::Append if !self.exists().await? => IngestMode::Reset,
            other => other,
        };

        match effective {
            IngestMode::Reset => self.backend.replace(&self.location, entries).await?,
            IngestMode::Append => self.backend.append(&self.location, entries).await?,
        }

        tracing::info!(
            "Wrote {} entries to {} ({:?}, {} backend)",
            count,
            self.location.display(),
            effective,
            self.backend.name()
        );
        Ok(count)
    }

    /// Top `k` fragments by similarity to `query`
    pub async fn search(&self, query: &[f32], k: usize) -> Result<Vec<RetrievedFragment>> {
        self.backend.search(&self.location, query, k).await
    }
}
