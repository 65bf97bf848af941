//! Question endpoint

use axum::{extract::State, Json};
use std::time::Instant;

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::api::{AskRequest, AskResponse};

/// POST /api/ask - Answer a question with cited fragments
pub async fn ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>> {
    let start = Instant::now();
    tracing::info!("Question: \"{}\"", request.question);

    let result = state.service().ask(&request.question).await?;

    tracing::info!(
        "Answered with {} cited fragment(s) in {}ms",
        result.used_fragments.len(),
        start.elapsed().as_millis()
    );
    Ok(Json(result.into()))
}
