//! Service facade: the operations exposed over HTTP

use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use crate::config::{ProviderKind, QaConfig};
use crate::error::{Error, Result};
use crate::generation::{AnswerSynthesizer, ContextCompressor, QaOrchestrator};
use crate::ingestion::IngestionOrchestrator;
use crate::providers::{HttpProviderFactory, ProviderFactory, VectorIndexBackend};
use crate::retrieval::{LocationLocks, Retriever, SqliteVectorIndex, VectorIndex};
use crate::settings::RuntimeSettings;
use crate::types::api::{ModelsResponse, ProviderInfo, ProvidersResponse};
use crate::types::{AnswerResult, IngestMode, IngestReport, IngestRequest, Source};

/// Prefix of `source` values for uploaded files
pub const UPLOAD_SCHEME: &str = "upload://";

/// A file received through the upload endpoint
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-supplied file name
    pub name: String,
    pub data: Bytes,
}

/// Document question answering over one configured index
pub struct QaService {
    config: QaConfig,
    settings: Arc<RuntimeSettings>,
    backend: Arc<dyn VectorIndexBackend>,
    factory: Arc<dyn ProviderFactory>,
    ingestion: IngestionOrchestrator,
}

impl QaService {
    /// SQLite index with the HTTP providers
    pub fn new(config: QaConfig) -> Self {
        Self::with_providers(
            config,
            Arc::new(SqliteVectorIndex::new()),
            Arc::new(HttpProviderFactory),
        )
    }

    /// Explicit backend and provider factory
    pub fn with_providers(
        config: QaConfig,
        backend: Arc<dyn VectorIndexBackend>,
        factory: Arc<dyn ProviderFactory>,
    ) -> Self {
        let settings = Arc::new(RuntimeSettings::new(config.providers.clone()));
        let ingestion =
            IngestionOrchestrator::new(backend.clone(), factory.clone(), LocationLocks::new());

        Self {
            config,
            settings,
            backend,
            factory,
            ingestion,
        }
    }

    pub fn config(&self) -> &QaConfig {
        &self.config
    }

    pub fn settings(&self) -> &RuntimeSettings {
        &self.settings
    }

    fn persist_location(&self) -> PathBuf {
        self.config.vector_db.persist_path.clone()
    }

    /// Rebuild the index from the configured primary source
    pub async fn initialize_index(&self) -> Result<IngestReport> {
        let source = self.config.data.primary_path.clone();
        self.ingest(vec![Source::path(source)], IngestMode::Reset).await
    }

    /// Rebuild the index from `directory`, or the configured reindex directory
    pub async fn reindex(&self, directory: Option<&str>) -> Result<IngestReport> {
        self.preflight()?;
        let path = match directory.map(str::trim).filter(|d| !d.is_empty()) {
            Some(dir) => PathBuf::from(dir),
            None => self.config.data.reindex_dir.clone(),
        };

        if !path.exists() {
            return Err(Error::NotFound(path.display().to_string()));
        }

        self.ingest(vec![Source::path(path)], IngestMode::Reset).await
    }

    /// Add uploaded files to the index, creating it if needed
    ///
    /// Files are staged in a scratch directory that is removed when the call
    /// ends; their `source` is `upload://<name>`.
    pub async fn upload(&self, files: Vec<UploadedFile>) -> Result<IngestReport> {
        if files.is_empty() {
            return Err(Error::InvalidRequest("no files were uploaded".to_string()));
        }
        self.preflight()?;

        let scratch = TempDir::new()?;
        let mut sources = Vec::with_capacity(files.len());
        for (i, file) in files.iter().enumerate() {
            let name = sanitize_file_name(&file.name).ok_or_else(|| {
                Error::InvalidRequest(format!("invalid file name '{}'", file.name))
            })?;
            // Index prefix keeps duplicate names apart
            let path = scratch.path().join(format!("{}-{}", i, name));
            tokio::fs::write(&path, &file.data).await?;
            sources.push(Source::labeled(path, format!("{}{}", UPLOAD_SCHEME, name)));
        }
        tracing::info!("Received {} uploaded file(s)", files.len());

        let report = self.ingest(sources, IngestMode::Append).await;
        drop(scratch);
        report
    }

    /// Checks that must pass before any file or index is touched
    fn preflight(&self) -> Result<()> {
        self.config.chunking.validate()?;
        self.settings.snapshot().require_credentials()
    }

    async fn ingest(&self, sources: Vec<Source>, mode: IngestMode) -> Result<IngestReport> {
        let request = IngestRequest {
            sources,
            persist_location: self.persist_location(),
            chunking: self.config.chunking,
            mode,
        };
        let settings = self.settings.snapshot();
        self.ingestion.ingest_documents(request, &settings).await
    }

    /// Answer a question from the current index
    pub async fn ask(&self, question: &str) -> Result<AnswerResult> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::InvalidRequest("question must not be empty".to_string()));
        }

        let settings = self.settings.snapshot();
        settings.require_credentials()?;

        let index = VectorIndex::open(self.backend.clone(), self.persist_location()).await?;
        let embedder = self.factory.embedder(&settings)?;
        let llm = self.factory.llm(&settings)?;

        let qa = QaOrchestrator::new(
            Retriever::new(index, embedder, self.config.retrieval.k),
            ContextCompressor::new(llm.clone()),
            AnswerSynthesizer::new(llm, &self.config.retrieval.response_language),
        );
        qa.answer(question).await
    }

    /// Known providers and whether each is usable
    pub fn providers(&self) -> ProvidersResponse {
        let providers = ProviderKind::ALL
            .iter()
            .map(|kind| {
                let configured = self.settings.is_configured(*kind);
                ProviderInfo {
                    id: kind.id().to_string(),
                    name: kind.display_name().to_string(),
                    configured,
                    message: (!configured)
                        .then(|| format!("{} is not configured", kind.api_key_env())),
                }
            })
            .collect();

        ProvidersResponse {
            providers,
            current_provider: self.settings.current_provider().id().to_string(),
        }
    }

    /// Store an API key in memory for `provider`
    pub fn set_provider_key(&self, provider: &str, api_key: &str) -> Result<ProviderKind> {
        let kind = parse_provider(provider)?;
        self.settings.set_key(kind, api_key)?;
        Ok(kind)
    }

    /// Switch the active provider
    pub fn select_provider(&self, provider: &str) -> Result<ProviderKind> {
        let kind = parse_provider(provider)?;
        self.settings.select_provider(kind);
        Ok(kind)
    }

    /// Models offered by the active provider
    pub async fn models(&self) -> Result<ModelsResponse> {
        let settings = self.settings.snapshot();
        let llm = self.factory.llm(&settings)?;
        let models = llm.list_models().await?;

        Ok(ModelsResponse {
            current_model: settings.chat_model,
            models,
        })
    }

    /// Switch the chat model
    pub fn select_model(&self, model: &str) -> Result<String> {
        self.settings.select_model(model)?;
        Ok(self.settings.current_model())
    }
}

fn parse_provider(provider: &str) -> Result<ProviderKind> {
    ProviderKind::from_id(provider)
        .ok_or_else(|| Error::InvalidRequest(format!("unknown provider '{}'", provider)))
}

/// Last path component of a client-supplied name, or `None` if nothing usable remains
fn sanitize_file_name(name: &str) -> Option<String> {
    let normalized = name.replace('\\', "/");
    Path::new(&normalized)
        .file_name()
        .map(|n| n.to_string_lossy().trim().to_string())
        .filter(|n| !n.is_empty() && n != "." && n != "..")
}
