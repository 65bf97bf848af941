//! Configuration for the question-answering service

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QaConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Embedding/LLM provider configuration
    pub providers: ProviderConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Retrieval and answer configuration
    pub retrieval: RetrievalConfig,
    /// Ingestion source paths
    pub data: DataConfig,
    /// Vector index configuration
    pub vector_db: VectorDbConfig,
}

impl QaConfig {
    /// Load configuration: defaults, then the optional TOML file, then environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Self::from_toml(&raw)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::config(format!("Invalid config: {}", e)))
    }

    /// Apply `KEY=value` overrides; blank values are ignored
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = get("DOCQA_HOST") {
            self.server.host = host;
        }
        if let Some(port) = get("DOCQA_PORT").and_then(|v| v.parse().ok()) {
            self.server.port = port;
        }

        if let Some(provider) = get("PROVIDER").and_then(|v| ProviderKind::from_id(&v)) {
            self.providers.provider = provider;
        }
        if let Some(key) = get(self.providers.provider.api_key_env()) {
            self.providers.api_key = Some(key);
        }
        if let Some(url) = get("PROVIDER_BASE_URL") {
            self.providers.base_url = Some(url);
        }
        if let Some(model) = get("MODEL_NAME") {
            self.providers.chat_model = model;
        }
        if let Some(model) = get("EMBEDDING_MODEL") {
            self.providers.embedding_model = model;
        }

        if let Some(size) = get("CHUNK_SIZE").and_then(|v| v.parse().ok()) {
            self.chunking.chunk_size = size;
        }
        if let Some(overlap) = get("CHUNK_OVERLAP").and_then(|v| v.parse().ok()) {
            self.chunking.chunk_overlap = overlap;
        }
        if let Some(k) = get("K_RETRIEVER").and_then(|v| v.parse().ok()) {
            self.retrieval.k = k;
        }
        if let Some(language) = get("RESPONSE_LANGUAGE") {
            self.retrieval.response_language = language;
        }

        if let Some(path) = get("DATA_FILE_PATH") {
            self.data.primary_path = PathBuf::from(path);
        }
        if let Some(path) = get("REINDEX_DIR") {
            self.data.reindex_dir = PathBuf::from(path);
        }
        if let Some(path) = get("VECTOR_DB_PATH") {
            self.vector_db.persist_path = PathBuf::from(path);
        }
    }

    /// Validate values that would otherwise fail deep inside a request
    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;
        if self.retrieval.k == 0 {
            return Err(Error::config("retrieval.k must be greater than zero"));
        }
        if self.providers.timeout_secs == 0 {
            return Err(Error::config("providers.timeout_secs must be greater than zero"));
        }
        if self.providers.embed_batch_size == 0 {
            return Err(Error::config("providers.embed_batch_size must be greater than zero"));
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 50MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            enable_cors: true,
            max_upload_size: 50 * 1024 * 1024,
        }
    }
}

/// Supported provider families
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI or any OpenAI-compatible endpoint
    #[default]
    OpenAi,
    /// Local Ollama server
    Ollama,
}

impl ProviderKind {
    /// All known providers, in display order
    pub const ALL: [ProviderKind; 2] = [ProviderKind::OpenAi, ProviderKind::Ollama];

    /// Stable identifier used in config and the API
    pub fn id(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Ollama => "ollama",
        }
    }

    /// Parse an identifier (case-insensitive)
    pub fn from_id(id: &str) -> Option<Self> {
        match id.trim().to_lowercase().as_str() {
            "openai" => Some(Self::OpenAi),
            "ollama" => Some(Self::Ollama),
            _ => None,
        }
    }

    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::OpenAi => "OpenAI",
            Self::Ollama => "Ollama",
        }
    }

    /// Whether calls need an API key
    pub fn requires_api_key(&self) -> bool {
        matches!(self, Self::OpenAi)
    }

    /// Environment variable holding the API key
    pub fn api_key_env(&self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Ollama => "OLLAMA_API_KEY",
        }
    }

    /// Default base URL
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Ollama => "http://localhost:11434",
        }
    }

    /// Chat model used when none has been chosen for this provider
    pub fn default_chat_model(&self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4o-mini",
            Self::Ollama => "llama3.2",
        }
    }

    /// Embedding model used when none has been chosen for this provider
    pub fn default_embedding_model(&self) -> &'static str {
        match self {
            Self::OpenAi => "text-embedding-3-small",
            Self::Ollama => "nomic-embed-text",
        }
    }
}

/// Embedding/LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Active provider
    pub provider: ProviderKind,
    /// Override for the provider base URL
    pub base_url: Option<String>,
    /// API key (usually supplied through the environment)
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Chat/completion model
    pub chat_model: String,
    /// Embedding model
    pub embedding_model: String,
    /// Temperature for generation
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Retries for transient provider failures (0 = fail on first error)
    pub max_retries: u32,
    /// Texts per embedding request
    pub embed_batch_size: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::OpenAi,
            base_url: None,
            api_key: None,
            chat_model: ProviderKind::OpenAi.default_chat_model().to_string(),
            embedding_model: ProviderKind::OpenAi.default_embedding_model().to_string(),
            temperature: 0.0,
            timeout_secs: 60,
            max_retries: 0,
            embed_batch_size: 64,
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Target fragment size in characters
    pub chunk_size: usize,
    /// Characters shared between consecutive fragments
    pub chunk_overlap: usize,
}

impl ChunkingConfig {
    /// Create a chunking configuration
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    /// Reject parameters the chunker cannot honour
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::config("chunk_size must be greater than zero"));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Retrieval and answer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Fragments retrieved per question
    pub k: usize,
    /// Language the final answer is written in
    pub response_language: String,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            k: 5,
            response_language: "Spanish".to_string(),
        }
    }
}

/// Ingestion source paths
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Source ingested by `initialize_index`
    pub primary_path: PathBuf,
    /// Directory used by `reindex` when none is given
    pub reindex_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            primary_path: PathBuf::from("data/computers.txt"),
            reindex_dir: PathBuf::from("data"),
        }
    }
}

/// Vector index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorDbConfig {
    /// Directory the index persists to
    pub persist_path: PathBuf,
}

impl Default for VectorDbConfig {
    fn default() -> Self {
        Self {
            persist_path: PathBuf::from("vector_db/computers_embedding_db"),
        }
    }
}
