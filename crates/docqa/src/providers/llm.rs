//! LLM provider trait for extraction and answer generation

use async_trait::async_trait;

use crate::error::Result;
use crate::generation::PromptBuilder;
use crate::types::api::ModelInfo;

/// Trait for text completion
///
/// Implementations:
/// - `OpenAiLlm`: OpenAI-compatible chat completions
/// - `OllamaLlm`: Local Ollama server
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Complete a single prompt
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Extract the parts of `text` relevant to `question`
    ///
    /// Returns `None` when the model reports nothing relevant.
    async fn extract_relevant(&self, question: &str, text: &str) -> Result<Option<String>> {
        let prompt = PromptBuilder::build_extraction_prompt(question, text);
        let output = self.complete(&prompt).await?;
        Ok(PromptBuilder::parse_extraction(&output))
    }

    /// Models offered by the provider
    async fn list_models(&self) -> Result<Vec<ModelInfo>>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
