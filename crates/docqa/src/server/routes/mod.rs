//! API routes for the QA server

pub mod ask;
pub mod index;
pub mod settings;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Index lifecycle
        .route("/init_embeddings", post(index::init_embeddings))
        .route("/reindex", post(index::reindex))
        .route(
            "/upload",
            post(index::upload).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        // Question answering
        .route("/ask", post(ask::ask))
        // Runtime provider settings
        .route("/providers", get(settings::list_providers))
        .route("/providers/key", post(settings::update_provider_key))
        .route("/providers/current", put(settings::select_provider))
        .route("/models", get(settings::list_models))
        .route("/models/current", put(settings::select_model))
}
