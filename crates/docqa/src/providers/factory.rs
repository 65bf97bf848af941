//! Building providers from a settings snapshot

use std::sync::Arc;

use crate::config::{ProviderConfig, ProviderKind};
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;
use super::http::RetryPolicy;
use super::llm::LlmProvider;
use super::ollama::{OllamaClient, OllamaEmbedder, OllamaLlm};
use super::openai::{OpenAiClient, OpenAiEmbedder, OpenAiLlm};

/// Provider selection and credentials, captured once at the start of a call
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub chat_model: String,
    pub embedding_model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub embed_batch_size: usize,
}

impl ProviderSettings {
    /// Snapshot a static provider configuration
    pub fn from_config(config: &ProviderConfig) -> Self {
        Self {
            kind: config.provider,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            chat_model: config.chat_model.clone(),
            embedding_model: config.embedding_model.clone(),
            temperature: config.temperature,
            timeout_secs: config.timeout_secs,
            max_retries: config.max_retries,
            embed_batch_size: config.embed_batch_size,
        }
    }

    /// Fail with `Config` when the active provider needs a key and has none
    pub fn require_credentials(&self) -> Result<()> {
        if !self.kind.requires_api_key() {
            return Ok(());
        }
        match self.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Ok(()),
            _ => Err(Error::config(format!(
                "{} is not configured",
                self.kind.api_key_env()
            ))),
        }
    }

    /// Configured base URL or the provider default
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.kind.default_base_url())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries)
    }
}

/// Constructs embedding and LLM providers for a call
pub trait ProviderFactory: Send + Sync {
    fn embedder(&self, settings: &ProviderSettings) -> Result<Arc<dyn EmbeddingProvider>>;

    fn llm(&self, settings: &ProviderSettings) -> Result<Arc<dyn LlmProvider>>;
}

/// Factory for the HTTP-backed OpenAI and Ollama providers
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpProviderFactory;

impl HttpProviderFactory {
    fn openai(settings: &ProviderSettings) -> Result<Arc<OpenAiClient>> {
        settings.require_credentials()?;
        let client = OpenAiClient::new(
            settings.base_url(),
            settings.api_key.clone().unwrap_or_default(),
            settings.timeout_secs,
            settings.retry_policy(),
        )?;
        Ok(Arc::new(client))
    }

    fn ollama(settings: &ProviderSettings) -> Result<Arc<OllamaClient>> {
        let client = OllamaClient::new(
            settings.base_url(),
            settings.api_key.clone(),
            settings.timeout_secs,
            settings.retry_policy(),
        )?;
        Ok(Arc::new(client))
    }
}

impl ProviderFactory for HttpProviderFactory {
    fn embedder(&self, settings: &ProviderSettings) -> Result<Arc<dyn EmbeddingProvider>> {
        Ok(match settings.kind {
            ProviderKind::OpenAi => Arc::new(OpenAiEmbedder::new(
                Self::openai(settings)?,
                &settings.embedding_model,
            )),
            ProviderKind::Ollama => Arc::new(OllamaEmbedder::new(
                Self::ollama(settings)?,
                &settings.embedding_model,
            )),
        })
    }

    fn llm(&self, settings: &ProviderSettings) -> Result<Arc<dyn LlmProvider>> {
        Ok(match settings.kind {
            ProviderKind::OpenAi => Arc::new(OpenAiLlm::new(
                Self::openai(settings)?,
                &settings.chat_model,
                settings.temperature,
            )),
            ProviderKind::Ollama => Arc::new(OllamaLlm::new(
                Self::ollama(settings)?,
                &settings.chat_model,
                settings.temperature,
            )),
        })
    }
}
