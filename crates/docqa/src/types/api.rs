//! Request and response bodies of the HTTP API

use serde::{Deserialize, Serialize};

use super::response::{AnswerResult, IngestReport};

/// POST /api/ask
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    /// Natural-language question
    pub question: String,
}

/// A cited fragment in the HTTP shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsedChunk {
    pub id: String,
    pub content_preview: String,
}

/// Response of POST /api/ask
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    pub used_chunks: Vec<UsedChunk>,
}

impl From<AnswerResult> for AskResponse {
    fn from(result: AnswerResult) -> Self {
        Self {
            answer: result.answer,
            used_chunks: result
                .used_fragments
                .into_iter()
                .map(|f| UsedChunk {
                    id: f.id,
                    content_preview: f.preview,
                })
                .collect(),
        }
    }
}

/// Response of POST /api/init_embeddings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitEmbeddingsResponse {
    pub status: String,
    pub chunks_count: usize,
}

/// POST /api/reindex
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReindexRequest {
    /// Directory to ingest; the configured default when absent
    #[serde(default)]
    pub directory: Option<String>,
}

/// Response of reindex and upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResponse {
    pub status: String,
    pub chunks_count: usize,
    pub documents_ingested: usize,
    pub sources: Vec<String>,
}

impl From<IngestReport> for IngestResponse {
    fn from(report: IngestReport) -> Self {
        Self {
            status: "ok".to_string(),
            chunks_count: report.fragment_count,
            documents_ingested: report.document_count,
            sources: report.sources,
        }
    }
}

/// One entry of GET /api/providers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub id: String,
    pub name: String,
    pub configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Response of GET /api/providers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersResponse {
    pub providers: Vec<ProviderInfo>,
    pub current_provider: String,
}

/// POST /api/providers/key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProviderKeyRequest {
    pub provider: String,
    pub api_key: String,
}

/// PUT /api/providers/current
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectProviderRequest {
    pub provider: String,
}

/// Response of provider updates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProviderResponse {
    pub status: String,
    pub provider: String,
}

/// One entry of GET /api/models
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owned_by: Option<String>,
}

/// Response of GET /api/models
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub current_model: String,
    pub models: Vec<ModelInfo>,
}

/// PUT /api/models/current
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateModelRequest {
    pub model: String,
}

/// Response of PUT /api/models/current
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateModelResponse {
    pub status: String,
    pub current_model: String,
}
