//! Question answering over an existing index

use super::compressor::ContextCompressor;
use super::synthesizer::AnswerSynthesizer;
use crate::error::{Error, Result};
use crate::retrieval::Retriever;
use crate::types::AnswerResult;

/// Retrieve, compress, answer
pub struct QaOrchestrator {
    retriever: Retriever,
    compressor: ContextCompressor,
    synthesizer: AnswerSynthesizer,
}

impl QaOrchestrator {
    pub fn new(
        retriever: Retriever,
        compressor: ContextCompressor,
        synthesizer: AnswerSynthesizer,
    ) -> Self {
        Self {
            retriever,
            compressor,
            synthesizer,
        }
    }

    /// Answer `question` from the bound index
    pub async fn answer(&self, question: &str) -> Result<AnswerResult> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::InvalidRequest("question must not be empty".to_string()));
        }

        let retrieved = self.retriever.retrieve(question).await?;
        let compressed = self.compressor.compress(question, retrieved).await?;
        if compressed.is_empty() {
            tracing::info!("No relevant context found for question");
        }

        self.synthesizer.synthesize(question, &compressed).await
    }
}
