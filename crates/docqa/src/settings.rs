//! Runtime provider selection shared by all requests

use parking_lot::RwLock;
use std::collections::HashMap;

use crate::config::{ProviderConfig, ProviderKind};
use crate::error::{Error, Result};
use crate::providers::ProviderSettings;

struct Selection {
    provider: ProviderKind,
    chat_model: String,
    embedding_model: String,
    keys: HashMap<ProviderKind, String>,
}

/// Active provider, chat model and API keys
///
/// Changes apply to calls that start afterwards; a running call keeps the
/// [`ProviderSettings`] snapshot it took at its start. Keys set here live in
/// memory only.
pub struct RuntimeSettings {
    base: ProviderConfig,
    selection: RwLock<Selection>,
}

impl RuntimeSettings {
    pub fn new(base: ProviderConfig) -> Self {
        let mut keys = HashMap::new();
        if let Some(key) = base.api_key.as_ref().filter(|k| !k.trim().is_empty()) {
            keys.insert(base.provider, key.clone());
        }

        Self {
            selection: RwLock::new(Selection {
                provider: base.provider,
                chat_model: base.chat_model.clone(),
                embedding_model: base.embedding_model.clone(),
                keys,
            }),
            base,
        }
    }

    /// Settings for one call
    pub fn snapshot(&self) -> ProviderSettings {
        let selection = self.selection.read();
        let mut settings = ProviderSettings::from_config(&self.base);
        settings.kind = selection.provider;
        settings.chat_model = selection.chat_model.clone();
        settings.embedding_model = selection.embedding_model.clone();
        settings.api_key = selection.keys.get(&selection.provider).cloned();
        if selection.provider != self.base.provider {
            // A configured base URL belongs to the configured provider
            settings.base_url = None;
        }
        settings
    }

    pub fn current_provider(&self) -> ProviderKind {
        self.selection.read().provider
    }

    pub fn current_model(&self) -> String {
        self.selection.read().chat_model.clone()
    }

    /// Whether `provider` can be used as things stand
    pub fn is_configured(&self, provider: ProviderKind) -> bool {
        !provider.requires_api_key() || self.selection.read().keys.contains_key(&provider)
    }

    /// Store an API key for `provider`
    pub fn set_key(&self, provider: ProviderKind, api_key: &str) -> Result<()> {
        let key = api_key.trim();
        if key.is_empty() {
            return Err(Error::InvalidRequest("api_key must not be empty".to_string()));
        }
        self.selection.write().keys.insert(provider, key.to_string());
        tracing::info!("Updated API key for provider {}", provider.id());
        Ok(())
    }

    /// Make `provider` the active one
    ///
    /// Switching to another provider resets both models: the configured ones
    /// for the configured provider, that provider's defaults otherwise.
    pub fn select_provider(&self, provider: ProviderKind) {
        let mut selection = self.selection.write();
        if selection.provider != provider {
            let (chat, embedding) = if provider == self.base.provider {
                (self.base.chat_model.clone(), self.base.embedding_model.clone())
            } else {
                (
                    provider.default_chat_model().to_string(),
                    provider.default_embedding_model().to_string(),
                )
            };
            selection.chat_model = chat;
            selection.embedding_model = embedding;
        }
        selection.provider = provider;
        drop(selection);
        tracing::info!("Active provider set to {}", provider.id());
    }

    /// Change the chat model used for extraction and answers
    pub fn select_model(&self, model: &str) -> Result<()> {
        let model = model.trim();
        if model.is_empty() {
            return Err(Error::InvalidRequest("model must not be empty".to_string()));
        }
        self.selection.write().chat_model = model.to_string();
        tracing::info!("Active model set to {}", model);
        Ok(())
    }
}
