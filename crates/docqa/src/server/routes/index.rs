//! Index lifecycle endpoints: initialize, reindex, upload

use axum::{
    extract::{Multipart, State},
    Json,
};

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::service::UploadedFile;
use crate::types::api::{IngestResponse, InitEmbeddingsResponse, ReindexRequest};

/// POST /api/init_embeddings - Rebuild the index from the primary source
pub async fn init_embeddings(State(state): State<AppState>) -> Result<Json<InitEmbeddingsResponse>> {
    let report = state.service().initialize_index().await?;
    Ok(Json(InitEmbeddingsResponse {
        status: "ok".to_string(),
        chunks_count: report.fragment_count,
    }))
}

/// POST /api/reindex - Rebuild the index from a directory
///
/// An empty body reindexes the configured directory.
pub async fn reindex(
    State(state): State<AppState>,
    body: Option<Json<ReindexRequest>>,
) -> Result<Json<IngestResponse>> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let report = state.service().reindex(request.directory.as_deref()).await?;
    Ok(Json(report.into()))
}

/// POST /api/upload - Add multipart files to the index
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<IngestResponse>> {
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::InvalidRequest(format!("Failed to read multipart field: {}", e)))?
    {
        // Non-file fields carry no document
        let Some(name) = field.file_name().map(|s| s.to_string()) else {
            continue;
        };

        let data = field
            .bytes()
            .await
            .map_err(|e| Error::InvalidRequest(format!("Failed to read '{}': {}", name, e)))?;

        tracing::debug!("Received upload: {} ({} bytes)", name, data.len());
        files.push(UploadedFile { name, data });
    }

    let report = state.service().upload(files).await?;
    Ok(Json(report.into()))
}
