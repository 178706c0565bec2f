use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::core::state::AppState;
use crate::repositories;
use crate::repositories::questions::ContainerKind;
use crate::schemas::assessment::{AttemptCreate, AttemptResultResponse, QuizResponse};
use crate::services::attempts;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/:quiz_id", get(get_quiz).delete(delete_quiz))
        .route("/:quiz_id/attempts", post(submit_attempt))
}

async fn get_quiz(
    Path(quiz_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<QuizResponse>, ApiError> {
    let mut conn =
        state.db().acquire().await.map_err(|e| ApiError::internal(e, "Failed to acquire connection"))?;

    let quiz = repositories::quizzes::find_by_id(&mut *conn, &quiz_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch quiz"))?;
    let Some(quiz) = quiz else {
        return Err(ApiError::NotFound("Quiz not found".to_string()));
    };

    let questions =
        repositories::questions::list_with_options(&mut *conn, ContainerKind::Quiz, &quiz_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load quiz questions"))?;

    Ok(Json(QuizResponse::from_db(quiz, questions)))
}

async fn delete_quiz(
    Path(quiz_id): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::quizzes::delete(state.db(), &quiz_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete quiz"))?;

    if !deleted {
        return Err(ApiError::NotFound("Quiz not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn submit_attempt(
    Path(quiz_id): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<AttemptCreate>,
) -> Result<(StatusCode, Json<AttemptResultResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let outcome =
        attempts::submit_attempt(state.db(), &quiz_id, &payload.user_id, &payload.answers).await?;

    Ok((
        StatusCode::CREATED,
        Json(AttemptResultResponse::from_outcome(outcome.attempt, outcome.result)),
    ))
}

#[cfg(test)]
mod tests {
    use crate::core::config::Settings;
    use crate::repositories;
    use crate::services::json_import;
    use crate::test_support;
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    #[tokio::test]
    async fn quiz_can_be_taken_and_reviewed() {
        let ctx = test_support::setup_test_context().await;
        let db = ctx.state.db();
        let user = test_support::insert_user(db, "Rae", "rae@example.com").await;
        let document = test_support::insert_document(db, &user.id).await;
        json_import::import_value(
            db,
            Settings::for_tests("sqlite::memory:").import(),
            &document.id,
            &json!({"mcq": [
                {"question": "3*3?", "options": ["6", "9"], "answer": "9"},
                {"question": "Water formula?", "choices": ["H2O", "CO2"], "correct": "H2O"}
            ]}),
        )
        .await
        .expect("import");
        let quiz_id = repositories::quizzes::list_for_document(db, &document.id)
            .await
            .expect("quizzes")
            .remove(0)
            .id;

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(Method::GET, &format!("/api/v1/quizzes/{quiz_id}"), None))
            .await
            .expect("get quiz");
        assert_eq!(response.status(), StatusCode::OK);
        let quiz = test_support::read_json(response).await;
        assert_eq!(quiz["questions"].as_array().map(Vec::len), Some(2));
        assert!(quiz["questions"][0].get("correct_option").is_none());
        let first = quiz["questions"][0]["id"].as_str().expect("question id").to_string();
        let second = quiz["questions"][1]["id"].as_str().expect("question id").to_string();

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                &format!("/api/v1/quizzes/{quiz_id}/attempts"),
                Some(json!({
                    "user_id": user.id,
                    "answers": [
                        {"question_id": first, "selected_option": "9"},
                        {"question_id": second, "selected_option": "CO2"}
                    ]
                })),
            ))
            .await
            .expect("submit");
        let status = response.status();
        let result = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::CREATED, "response: {result}");
        assert_eq!(result["score"], 1);
        assert_eq!(result["total"], 2);
        assert_eq!(result["percentage"], 50);
        assert_eq!(result["feedback"], "keep_studying");
        assert_eq!(result["per_question"][1]["verdict"], "incorrect_chosen");
        let attempt_id = result["attempt_id"].as_str().expect("attempt id").to_string();

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                &format!("/api/v1/attempts/{attempt_id}"),
                None,
            ))
            .await
            .expect("attempt detail");
        let detail = test_support::read_json(response).await;
        assert_eq!(detail["responses"][1]["is_correct"], false);

        let response = ctx
            .app
            .oneshot(test_support::json_request(
                Method::GET,
                &format!("/api/v1/users/{}/revision-queue", user.id),
                None,
            ))
            .await
            .expect("revision queue");
        let queue = test_support::read_json(response).await;
        assert_eq!(queue[0]["question_id"], second.as_str());
        assert_eq!(queue[0]["fail_count"], 1);
    }

    #[tokio::test]
    async fn option_outside_question_is_unprocessable() {
        let ctx = test_support::setup_test_context().await;
        let db = ctx.state.db();
        let user = test_support::insert_user(db, "Sol", "sol@example.com").await;
        let document = test_support::insert_document(db, &user.id).await;
        json_import::import_value(
            db,
            Settings::for_tests("sqlite::memory:").import(),
            &document.id,
            &json!({"quiz": [{"question": "1+1?", "options": ["1", "2"], "answer": "2"}]}),
        )
        .await
        .expect("import");
        let quiz = repositories::quizzes::list_for_document(db, &document.id)
            .await
            .expect("quizzes")
            .remove(0);
        let mut conn = db.acquire().await.expect("conn");
        let questions = repositories::questions::list_with_options(
            &mut conn,
            repositories::questions::ContainerKind::Quiz,
            &quiz.id,
        )
        .await
        .expect("questions");
        drop(conn);

        let response = ctx
            .app
            .oneshot(test_support::json_request(
                Method::POST,
                &format!("/api/v1/quizzes/{}/attempts", quiz.id),
                Some(json!({
                    "user_id": user.id,
                    "answers": [{"question_id": questions[0].question.id, "selected_option": "3"}]
                })),
            ))
            .await
            .expect("submit");
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
