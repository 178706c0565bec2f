use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::assessment::{AttemptListItem, RevisionQueueItem};
use crate::schemas::user::{UserCreate, UserResponse};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:user_id", get(get_user).delete(delete_user))
        .route("/:user_id/attempts", get(list_attempts))
        .route("/:user_id/revision-queue", get(revision_queue))
}

async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = repositories::users::list(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list users"))?;

    Ok(Json(users.into_iter().map(UserResponse::from_db).collect()))
}

async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<UserCreate>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("name must not be blank".to_string()));
    }
    let email = payload.email.trim().to_lowercase();

    let user = repositories::users::create(
        state.db(),
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            name,
            email: &email,
            role: payload.role,
            created_at: primitive_now_utc(),
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, action = "user_create", "User registered");

    Ok((StatusCode::CREATED, Json(UserResponse::from_db(user))))
}

async fn get_user(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = repositories::users::find_by_id(state.db(), &user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch user"))?;

    let Some(user) = user else {
        return Err(ApiError::NotFound("User not found".to_string()));
    };

    Ok(Json(UserResponse::from_db(user)))
}

async fn delete_user(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::users::delete(state.db(), &user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete user"))?;

    if !deleted {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    tracing::info!(user_id = %user_id, action = "user_delete", "User deleted with all owned data");
    Ok(StatusCode::NO_CONTENT)
}

async fn list_attempts(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Vec<AttemptListItem>>, ApiError> {
    let attempts = repositories::attempts::list_for_user(state.db(), &user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list attempts"))?;

    Ok(Json(attempts.into_iter().map(AttemptListItem::from).collect()))
}

async fn revision_queue(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Vec<RevisionQueueItem>>, ApiError> {
    let entries = repositories::revision_queue::list_for_user(state.db(), &user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load revision queue"))?;

    Ok(Json(entries.into_iter().map(RevisionQueueItem::from).collect()))
}

#[cfg(test)]
mod tests {
    use crate::test_support;
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    #[tokio::test]
    async fn registration_rejects_duplicate_email() {
        let ctx = test_support::setup_test_context().await;
        let payload = json!({"name": "Lena", "email": "Lena@Example.com"});

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(Method::POST, "/api/v1/users", Some(payload.clone())))
            .await
            .expect("create user");
        let status = response.status();
        let created = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::CREATED, "response: {created}");
        assert_eq!(created["email"], "lena@example.com");
        assert_eq!(created["role"], "student");

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(Method::POST, "/api/v1/users", Some(payload)))
            .await
            .expect("duplicate user");
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = test_support::read_json(response).await;
        assert_eq!(body["status"], 409);
    }

    #[tokio::test]
    async fn invalid_email_is_bad_request() {
        let ctx = test_support::setup_test_context().await;
        let response = ctx
            .app
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/users",
                Some(json!({"name": "Max", "email": "nope"})),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn deleting_unknown_user_is_404() {
        let ctx = test_support::setup_test_context().await;
        let response = ctx
            .app
            .oneshot(test_support::json_request(Method::DELETE, "/api/v1/users/missing", None))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
