//! Provider and model selection endpoints

use axum::{extract::State, Json};

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::api::{
    ModelsResponse, ProvidersResponse, SelectProviderRequest, UpdateModelRequest,
    UpdateModelResponse, UpdateProviderKeyRequest, UpdateProviderResponse,
};

/// GET /api/providers
pub async fn list_providers(State(state): State<AppState>) -> Json<ProvidersResponse> {
    Json(state.service().providers())
}

/// POST /api/providers/key - Store an API key for this process
pub async fn update_provider_key(
    State(state): State<AppState>,
    Json(request): Json<UpdateProviderKeyRequest>,
) -> Result<Json<UpdateProviderResponse>> {
    let kind = state
        .service()
        .set_provider_key(&request.provider, &request.api_key)?;
    Ok(Json(UpdateProviderResponse {
        status: "ok".to_string(),
        provider: kind.id().to_string(),
    }))
}

/// PUT /api/providers/current
pub async fn select_provider(
    State(state): State<AppState>,
    Json(request): Json<SelectProviderRequest>,
) -> Result<Json<UpdateProviderResponse>> {
    let kind = state.service().select_provider(&request.provider)?;
    Ok(Json(UpdateProviderResponse {
        status: "ok".to_string(),
        provider: kind.id().to_string(),
    }))
}

/// GET /api/models
pub async fn list_models(State(state): State<AppState>) -> Result<Json<ModelsResponse>> {
    Ok(Json(state.service().models().await?))
}

/// PUT /api/models/current
pub async fn select_model(
    State(state): State<AppState>,
    Json(request): Json<UpdateModelRequest>,
) -> Result<Json<UpdateModelResponse>> {
    let current_model = state.service().select_model(&request.model)?;
    Ok(Json(UpdateModelResponse {
        status: "ok".to_string(),
        current_model,
    }))
}
