//! Ingestion pipeline: load, chunk, embed, persist

use std::collections::BTreeSet;
use std::sync::Arc;

use super::chunker::TextChunker;
use super::loader::DocumentLoader;
use crate::error::{Error, Result};
use crate::providers::{ProviderFactory, ProviderSettings, VectorIndexBackend};
use crate::retrieval::{LocationLocks, VectorIndex};
use crate::types::{IngestReport, IngestRequest};

/// Runs one ingestion call end to end
pub struct IngestionOrchestrator {
    loader: DocumentLoader,
    backend: Arc<dyn VectorIndexBackend>,
    factory: Arc<dyn ProviderFactory>,
    locks: LocationLocks,
}

impl IngestionOrchestrator {
    pub fn new(
        backend: Arc<dyn VectorIndexBackend>,
        factory: Arc<dyn ProviderFactory>,
        locks: LocationLocks,
    ) -> Self {
        Self {
            loader: DocumentLoader::new(),
            backend,
            factory,
            locks,
        }
    }

    /// Ingest `request.sources` into `request.persist_location`
    ///
    /// Chunk parameters and credentials are checked before any file or index
    /// is touched. The location stays locked until the write completes.
    pub async fn ingest_documents(
        &self,
        request: IngestRequest,
        settings: &ProviderSettings,
    ) -> Result<IngestReport> {
        let chunker = TextChunker::new(request.chunking)?;
        settings.require_credentials()?;

        let _guard = self.locks.acquire(&request.persist_location).await;
        tracing::info!(
            "Ingesting {} source(s) into {} ({:?})",
            request.sources.len(),
            request.persist_location.display(),
            request.mode
        );

        let loader = self.loader;
        let sources = request.sources.clone();
        let documents = tokio::task::spawn_blocking(move || loader.load(&sources)).await??;
        if documents.is_empty() {
            return Err(Error::NoDocuments);
        }

        let fragments = chunker.split_documents(&documents);
        if fragments.is_empty() {
            return Err(Error::NoFragments);
        }

        // Documents that produced no fragments are not reported
        let sources: Vec<String> = fragments
            .iter()
            .map(|f| f.source().to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let embedder = self.factory.embedder(settings)?;
        let index = VectorIndex::new(self.backend.clone(), &request.persist_location);
        let fragment_count = index
            .ingest(fragments, request.mode, embedder.as_ref(), settings.embed_batch_size)
            .await?;

        tracing::info!(
            "Ingested {} documents as {} fragments into {}",
            documents.len(),
            fragment_count,
            request.persist_location.display()
        );

        Ok(IngestReport {
            fragment_count,
            document_count: documents.len(),
            sources,
        })
    }
}
