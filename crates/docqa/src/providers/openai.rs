//! OpenAI-compatible providers for embeddings and chat completion

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::api::ModelInfo;

use super::embedding::EmbeddingProvider;
use super::http::{self, RetryPolicy};
use super::llm::LlmProvider;

const PROVIDER: &str = "openai";

/// Known output sizes of OpenAI embedding models
fn known_dimensions(model: &str) -> Option<usize> {
    match model {
        "text-embedding-3-small" | "text-embedding-ada-002" => Some(1536),
        "text-embedding-3-large" => Some(3072),
        _ => None,
    }
}

/// OpenAI API client with optional retry
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: String,
    retry: RetryPolicy,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ModelsResponse {
    data: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    id: String,
    owned_by: Option<String>,
}

impl OpenAiClient {
    /// Create a client; an empty key is rejected up front
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout_secs: u64,
        retry: RetryPolicy,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::config("OPENAI_API_KEY is not configured"));
        }

        Ok(Self {
            client: http::build_client(timeout_secs)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            retry,
        })
    }

    /// Embed a batch of texts; vectors come back in input order
    pub async fn embed(&self, model: &str, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/embeddings", self.base_url);
        tracing::debug!(provider = PROVIDER, batch_size = texts.len(), model, "embedding batch");

        let mut data: Vec<EmbeddingData> = self
            .retry
            .retry_request(|| async {
                let response = self
                    .client
                    .post(&url)
                    .bearer_auth(&self.api_key)
                    .json(&EmbeddingRequest { model, input: texts })
                    .send()
                    .await
                    .map_err(|e| http::send_error(PROVIDER, "Embedding", e))?;

                let response = http::check_status(PROVIDER, "Embedding", response).await?;
                let parsed: EmbeddingResponse =
                    http::parse_json(PROVIDER, "embedding", response).await?;
                Ok(parsed.data)
            })
            .await?;

        if data.len() != texts.len() {
            return Err(Error::provider(
                PROVIDER,
                format!("Expected {} embeddings, got {}", texts.len(), data.len()),
            ));
        }

        data.sort_by_key(|d| d.index);
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }

    /// Single-message chat completion
    pub async fn chat(&self, model: &str, temperature: f32, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let response: ChatResponse = self
            .retry
            .retry_request(|| async {
                let request = ChatRequest {
                    model,
                    messages: [ChatMessage {
                        role: "user",
                        content: prompt,
                    }],
                    temperature,
                };

                let response = self
                    .client
                    .post(&url)
                    .bearer_auth(&self.api_key)
                    .json(&request)
                    .send()
                    .await
                    .map_err(|e| http::send_error(PROVIDER, "Completion", e))?;

                let response = http::check_status(PROVIDER, "Completion", response).await?;
                http::parse_json(PROVIDER, "completion", response).await
            })
            .await?;

        response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.unwrap_or_default())
            .ok_or_else(|| Error::provider(PROVIDER, "Completion returned no choices"))
    }

    /// List models available to the key
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let url = format!("{}/models", self.base_url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| http::send_error(PROVIDER, "Model listing", e))?;

        let response = http::check_status(PROVIDER, "Model listing", response).await?;
        let parsed: ModelsResponse = http::parse_json(PROVIDER, "model listing", response).await?;

        let mut models: Vec<ModelInfo> = parsed
            .data
            .into_iter()
            .map(|m| ModelInfo {
                id: m.id,
                owned_by: m.owned_by,
            })
            .collect();
        models.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(models)
    }
}

/// OpenAI embedding provider
pub struct OpenAiEmbedder {
    client: Arc<OpenAiClient>,
    model: String,
}

impl OpenAiEmbedder {
    pub fn new(client: Arc<OpenAiClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let texts = [text.to_string()];
        self.client
            .embed(&self.model, &texts)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::provider(PROVIDER, "Embedding returned no data"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.client.embed(&self.model, texts).await
    }

    fn dimensions(&self) -> Option<usize> {
        known_dimensions(&self.model)
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

/// OpenAI chat provider
pub struct OpenAiLlm {
    client: Arc<OpenAiClient>,
    model: String,
    temperature: f32,
}

impl OpenAiLlm {
    pub fn new(client: Arc<OpenAiClient>, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            client,
            model: model.into(),
            temperature,
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiLlm {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.client.chat(&self.model, self.temperature, prompt).await
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        self.client.list_models().await
    }

    fn name(&self) -> &str {
        PROVIDER
    }

    fn model(&self) -> &str {
        &self.model
    }
}
