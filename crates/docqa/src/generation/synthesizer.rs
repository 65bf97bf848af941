//! Grounded answer synthesis

use std::sync::Arc;

use super::prompt::PromptBuilder;
use crate::error::Result;
use crate::providers::LlmProvider;
use crate::types::{AnswerResult, CompressedFragment, UsedFragment};

/// Produces the final answer from compressed context
pub struct AnswerSynthesizer {
    llm: Arc<dyn LlmProvider>,
    response_language: String,
}

impl AnswerSynthesizer {
    pub fn new(llm: Arc<dyn LlmProvider>, response_language: impl Into<String>) -> Self {
        Self {
            llm,
            response_language: response_language.into(),
        }
    }

    /// One completion call; citations are `doc_<i>` over `fragments` in order
    ///
    /// An empty `fragments` still reaches the model, which is told to say the
    /// information is unavailable.
    pub async fn synthesize(
        &self,
        question: &str,
        fragments: &[CompressedFragment],
    ) -> Result<AnswerResult> {
        let context = PromptBuilder::build_context(fragments);
        let prompt = PromptBuilder::build_answer_prompt(question, &context, &self.response_language);

        tracing::info!("Generating answer with model: {}", self.llm.model());
        let answer = self.llm.complete(&prompt).await?;

        let used_fragments = fragments
            .iter()
            .enumerate()
            .map(|(i, f)| UsedFragment::new(i, &f.text))
            .collect();

        Ok(AnswerResult {
            answer: answer.trim().to_string(),
            used_fragments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::api::ModelInfo;
    use crate::types::Metadata;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recording {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LlmProvider for Recording {
        async fn complete(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().push(prompt.to_string());
            Ok(" El cielo es azul. \n".to_string())
        }

        async fn list_models(&self) -> Result<Vec<ModelInfo>> {
            Ok(Vec::new())
        }

        fn name(&self) -> &str {
            "stub"
        }

        fn model(&self) -> &str {
            "recording"
        }
    }

    fn compressed(text: &str) -> CompressedFragment {
        CompressedFragment {
            text: text.to_string(),
            metadata: Metadata::new(),
            score: 0.5,
        }
    }

    #[tokio::test]
    async fn test_answer_and_citations() {
        let llm = Arc::new(Recording::default());
        let synthesizer = AnswerSynthesizer::new(llm.clone(), "Spanish");
        let long = "x".repeat(150);

        let result = synthesizer
            .synthesize("What color is the sky?", &[compressed("The sky is blue."), compressed(&long)])
            .await
            .unwrap();

        assert_eq!(result.answer, "El cielo es azul.");
        assert_eq!(result.used_fragments.len(), 2);
        assert_eq!(result.used_fragments[0].id, "doc_0");
        assert_eq!(result.used_fragments[0].preview, "The sky is blue.");
        assert_eq!(result.used_fragments[1].id, "doc_1");
        assert_eq!(result.used_fragments[1].preview, format!("{}...", "x".repeat(100)));

        let prompts = llm.prompts.lock();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("The sky is blue."));
        assert!(prompts[0].contains("Spanish"));
    }

    #[tokio::test]
    async fn test_empty_context_still_asks() {
        let llm = Arc::new(Recording::default());
        let synthesizer = AnswerSynthesizer::new(llm.clone(), "English");

        let result = synthesizer.synthesize("Anything?", &[]).await.unwrap();
        assert!(result.used_fragments.is_empty());
        assert_eq!(llm.prompts.lock().len(), 1);
    }
}
