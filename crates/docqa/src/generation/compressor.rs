//! Contextual compression of retrieved fragments

use futures::future::try_join_all;
use std::sync::Arc;

use crate::error::Result;
use crate::providers::LlmProvider;
use crate::types::{CompressedFragment, RetrievedFragment};

/// Reduces each retrieved fragment to its question-relevant passage
pub struct ContextCompressor {
    llm: Arc<dyn LlmProvider>,
}

impl ContextCompressor {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// One extraction per fragment, issued concurrently; empty extractions are dropped
    ///
    /// Survivors keep retrieval order. Any failed extraction fails the call.
    pub async fn compress(
        &self,
        question: &str,
        fragments: Vec<RetrievedFragment>,
    ) -> Result<Vec<CompressedFragment>> {
        let retrieved = fragments.len();

        let extractions = try_join_all(
            fragments
                .iter()
                .map(|f| self.llm.extract_relevant(question, &f.text)),
        )
        .await?;

        let compressed: Vec<CompressedFragment> = fragments
            .into_iter()
            .zip(extractions)
            .filter_map(|(fragment, extracted)| {
                extracted.map(|text| CompressedFragment {
                    text,
                    metadata: fragment.metadata,
                    score: fragment.score,
                })
            })
            .collect();

        tracing::debug!(
            "Compressed {} retrieved fragments to {} with {}",
            retrieved,
            compressed.len(),
            self.llm.model()
        );
        Ok(compressed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::api::ModelInfo;
    use crate::types::Metadata;
    use async_trait::async_trait;

    /// Keeps only fragments that mention "sky"
    struct SkyOnly;

    #[async_trait]
    impl LlmProvider for SkyOnly {
        async fn complete(&self, prompt: &str) -> Result<String> {
            let context = prompt
                .split(">>>\n")
                .nth(1)
                .and_then(|rest| rest.split("\n>>>").next())
                .unwrap_or_default();
            if context.contains("sky") {
                Ok(format!("  {}  ", context))
            } else {
                Ok("NO_OUTPUT".to_string())
            }
        }

        async fn list_models(&self) -> Result<Vec<ModelInfo>> {
            Ok(Vec::new())
        }

        fn name(&self) -> &str {
            "stub"
        }

        fn model(&self) -> &str {
            "sky-only"
        }
    }

    fn retrieved(text: &str, score: f32) -> RetrievedFragment {
        let mut metadata = Metadata::new();
        metadata.insert("source".into(), format!("/{}.txt", score));
        RetrievedFragment {
            text: text.to_string(),
            metadata,
            score,
        }
    }

    #[tokio::test]
    async fn test_irrelevant_fragments_dropped_in_order() {
        let compressor = ContextCompressor::new(Arc::new(SkyOnly));
        let compressed = compressor
            .compress(
                "What color is the sky?",
                vec![
                    retrieved("The sky is blue.", 0.9),
                    retrieved("Grass is green.", 0.8),
                    retrieved("At night the sky is dark.", 0.7),
                ],
            )
            .await
            .unwrap();

        let texts: Vec<&str> = compressed.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["The sky is blue.", "At night the sky is dark."]);
        assert_eq!(compressed[1].score, 0.7);
        assert_eq!(compressed[1].metadata.get("source").map(String::as_str), Some("/0.7.txt"));
    }

    #[tokio::test]
    async fn test_nothing_retrieved() {
        let compressor = ContextCompressor::new(Arc::new(SkyOnly));
        assert!(compressor.compress("q", Vec::new()).await.unwrap().is_empty());
    }
}
