use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::core::state::AppState;
use crate::repositories;
use crate::repositories::questions::ContainerKind;
use crate::schemas::assessment::{PaperGradeRequest, PaperListItem, PaperResponse};
use crate::services::assessment::ScoreResult;
use crate::services::attempts;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_papers))
        .route("/:paper_id", get(get_paper).delete(delete_paper))
        .route("/:paper_id/grade", post(grade_paper))
}

async fn list_papers(State(state): State<AppState>) -> Result<Json<Vec<PaperListItem>>, ApiError> {
    let rows = repositories::papers::list_with_question_counts(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list question papers"))?;

    Ok(Json(rows.into_iter().map(PaperListItem::from).collect()))
}

async fn get_paper(
    Path(paper_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<PaperResponse>, ApiError> {
    let mut conn =
        state.db().acquire().await.map_err(|e| ApiError::internal(e, "Failed to acquire connection"))?;

    let paper = repositories::papers::find_by_id(&mut *conn, &paper_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch question paper"))?;
    let Some(paper) = paper else {
        return Err(ApiError::NotFound("Question paper not found".to_string()));
    };

    let questions =
        repositories::questions::list_with_options(&mut *conn, ContainerKind::Paper, &paper_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load paper questions"))?;

    Ok(Json(PaperResponse::from_db(paper, questions)))
}

async fn delete_paper(
    Path(paper_id): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::papers::delete(state.db(), &paper_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete question paper"))?;

    if !deleted {
        return Err(ApiError::NotFound("Question paper not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn grade_paper(
    Path(paper_id): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<PaperGradeRequest>,
) -> Result<Json<ScoreResult>, ApiError> {
    let result = attempts::grade_paper(state.db(), &paper_id, &payload.answers).await?;
    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use crate::test_support;
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    #[tokio::test]
    async fn imported_paper_is_listed_and_graded() {
        let ctx = test_support::setup_test_context().await;
        let user = test_support::insert_user(ctx.state.db(), "Tao", "tao@example.com").await;
        let document = test_support::insert_document(ctx.state.db(), &user.id).await;

        let payload = json!({
            "final_exam": {
                "settings": {"mode": "timed", "minutes": 30},
                "questions": [
                    {"text": "Capital of France?", "correct": "Paris"},
                    {"stem": "Boiling point of water (C)?", "options": [90, 100], "answer": 100}
                ]
            }
        });
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::raw_request(
                Method::POST,
                &format!("/api/v1/documents/{}/import", document.id),
                &payload.to_string(),
            ))
            .await
            .expect("import");
        assert_eq!(response.status(), StatusCode::OK);

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(Method::GET, "/api/v1/papers", None))
            .await
            .expect("list papers");
        let papers = test_support::read_json(response).await;
        assert_eq!(papers[0]["question_count"], 2);
        let paper_id = papers[0]["id"].as_str().expect("paper id").to_string();

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                &format!("/api/v1/papers/{paper_id}"),
                None,
            ))
            .await
            .expect("get paper");
        let paper = test_support::read_json(response).await;
        assert_eq!(paper["settings"]["mode"], "timed");
        let first = paper["questions"][0]["id"].as_str().expect("question id").to_string();
        let second = paper["questions"][1]["id"].as_str().expect("question id").to_string();

        let response = ctx
            .app
            .oneshot(test_support::json_request(
                Method::POST,
                &format!("/api/v1/papers/{paper_id}/grade"),
                Some(json!({"answers": [
                    {"question_id": first, "selected_option": "Paris"},
                    {"question_id": second, "selected_option": "100"}
                ]})),
            ))
            .await
            .expect("grade");
        let status = response.status();
        let result = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::OK, "response: {result}");
        assert_eq!(result["percentage"], 100);
        assert_eq!(result["feedback"], "excellent");
    }

    #[tokio::test]
    async fn unknown_paper_is_404() {
        let ctx = test_support::setup_test_context().await;
        let response = ctx
            .app
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/papers/missing/grade",
                Some(json!({"answers": []})),
            ))
            .await
            .expect("grade");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
