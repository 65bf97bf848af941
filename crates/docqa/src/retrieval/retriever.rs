//! Question to top-k fragments

use std::sync::Arc;

use super::index::VectorIndex;
use crate::error::Result;
use crate::providers::EmbeddingProvider;
use crate::types::RetrievedFragment;

/// Embeds a question and returns the `k` most similar fragments
pub struct Retriever {
    index: VectorIndex,
    embedder: Arc<dyn EmbeddingProvider>,
    k: usize,
}

impl Retriever {
    pub fn new(index: VectorIndex, embedder: Arc<dyn EmbeddingProvider>, k: usize) -> Self {
        Self { index, embedder, k }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// At most `k` fragments, most similar first
    pub async fn retrieve(&self, question: &str) -> Result<Vec<RetrievedFragment>> {
        let query = self.embedder.embed(question).await?;
        let hits = self.index.search(&query, self.k).await?;
        tracing::debug!("Retrieved {} fragments (k={})", hits.len(), self.k);
        Ok(hits)
    }
}
