use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::core::state::AppState;
use crate::repositories;
use crate::schemas::assessment::AttemptDetailResponse;

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/:attempt_id", get(get_attempt))
}

async fn get_attempt(
    Path(attempt_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<AttemptDetailResponse>, ApiError> {
    let attempt = repositories::attempts::find_by_id(state.db(), &attempt_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch attempt"))?;
    let Some(attempt) = attempt else {
        return Err(ApiError::NotFound("Attempt not found".to_string()));
    };

    let responses = repositories::attempts::list_responses(state.db(), &attempt_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load attempt responses"))?;

    Ok(Json(AttemptDetailResponse::from_db(attempt, responses)))
}
