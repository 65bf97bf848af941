//! Ollama-based providers for embeddings and LLM

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::Result;
use crate::types::api::ModelInfo;

use super::embedding::EmbeddingProvider;
use super::http::{self, RetryPolicy};
use super::llm::LlmProvider;

const PROVIDER: &str = "ollama";

/// Ollama API client with optional retry
pub struct OllamaClient {
    client: Client,
    base_url: String,
    /// Only needed for hosted deployments
    api_key: Option<String>,
    retry: RetryPolicy,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Deserialize)]
struct TagEntry {
    name: String,
}

impl OllamaClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout_secs: u64,
        retry: RetryPolicy,
    ) -> Result<Self> {
        Ok(Self {
            client: http::build_client(timeout_secs)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            retry,
        })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    /// Generate an embedding
    pub async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);

        self.retry
            .retry_request(|| async {
                let response = self
                    .authorize(self.client.post(&url))
                    .json(&EmbedRequest { model, prompt: text })
                    .send()
                    .await
                    .map_err(|e| http::send_error(PROVIDER, "Embedding", e))?;

                let response = http::check_status(PROVIDER, "Embedding", response).await?;
                let parsed: EmbedResponse =
                    http::parse_json(PROVIDER, "embedding", response).await?;
                Ok(parsed.embedding)
            })
            .await
    }

    /// Non-streaming generation
    pub async fn generate(&self, model: &str, temperature: f32, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        tracing::debug!("Generating with model: {}", model);

        self.retry
            .retry_request(|| async {
                let request = GenerateRequest {
                    model,
                    prompt,
                    stream: false,
                    options: GenerateOptions { temperature },
                };

                let response = self
                    .authorize(self.client.post(&url))
                    .json(&request)
                    .send()
                    .await
                    .map_err(|e| http::send_error(PROVIDER, "Generation", e))?;

                let response = http::check_status(PROVIDER, "Generation", response).await?;
                let parsed: GenerateResponse =
                    http::parse_json(PROVIDER, "generation", response).await?;
                Ok(parsed.response)
            })
            .await
    }

    /// Locally installed models
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|e| http::send_error(PROVIDER, "Model listing", e))?;

        let response = http::check_status(PROVIDER, "Model listing", response).await?;
        let parsed: TagsResponse = http::parse_json(PROVIDER, "model listing", response).await?;

        Ok(parsed
            .models
            .into_iter()
            .map(|m| ModelInfo {
                id: m.name,
                owned_by: Some(PROVIDER.to_string()),
            })
            .collect())
    }
}

/// Ollama embedding provider
pub struct OllamaEmbedder {
    client: Arc<OllamaClient>,
    model: String,
}

impl OllamaEmbedder {
    pub fn new(client: Arc<OllamaClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.client.embed(&self.model, text).await
    }

    fn dimensions(&self) -> Option<usize> {
        None
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

/// Ollama LLM provider
pub struct OllamaLlm {
    client: Arc<OllamaClient>,
    model: String,
    temperature: f32,
}

impl OllamaLlm {
    pub fn new(client: Arc<OllamaClient>, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            client,
            model: model.into(),
            temperature,
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaLlm {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.client.generate(&self.model, self.temperature, prompt).await
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_response_parsing() {
        let parsed: TagsResponse = serde_json::from_str(
            r#"{"models":[{"name":"llama3.2:latest","size":123},{"name":"nomic-embed-text"}]}"#,
        )
        .unwrap();
        let names: Vec<&str> = parsed.models.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["llama3.2:latest", "nomic-embed-text"]);
    }

    #[test]
    fn test_blank_key_ignored() {
        let client =
            OllamaClient::new("http://localhost:11434/", Some(" ".into()), 5, RetryPolicy::default())
                .unwrap();
        assert!(client.api_key.is_none());
        assert_eq!(client.base_url, "http://localhost:11434");
    }
}
