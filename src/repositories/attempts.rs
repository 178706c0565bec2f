use sqlx::SqlitePool;
use time::PrimitiveDateTime;

use crate::db::models::{AttemptResponse, QuizAttempt};

const ATTEMPT_COLUMNS: &str = "id, quiz_id, user_id, submitted_at";

pub(crate) async fn create(
    executor: impl sqlx::SqliteExecutor<'_>,
    id: &str,
    quiz_id: &str,
    user_id: &str,
    submitted_at: PrimitiveDateTime,
) -> Result<QuizAttempt, sqlx::Error> {
    sqlx::query_as::<_, QuizAttempt>(&format!(
        "INSERT INTO quiz_attempts (id, quiz_id, user_id, submitted_at)
         VALUES ($1,$2,$3,$4)
         RETURNING {ATTEMPT_COLUMNS}"
    ))
    .bind(id)
    .bind(quiz_id)
    .bind(user_id)
    .bind(submitted_at)
    .fetch_one(executor)
    .await
}

pub(crate) struct CreateResponse<'a> {
    pub(crate) id: &'a str,
    pub(crate) attempt_id: &'a str,
    pub(crate) question_id: &'a str,
    pub(crate) selected_option: Option<&'a str>,
    pub(crate) is_correct: bool,
}

pub(crate) async fn insert_response(
    executor: impl sqlx::SqliteExecutor<'_>,
    params: CreateResponse<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO attempt_responses (id, attempt_id, question_id, selected_option, is_correct)
         VALUES ($1,$2,$3,$4,$5)",
    )
    .bind(params.id)
    .bind(params.attempt_id)
    .bind(params.question_id)
    .bind(params.selected_option)
    .bind(params.is_correct)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) async fn list_for_user(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<QuizAttempt>, sqlx::Error> {
    sqlx::query_as::<_, QuizAttempt>(&format!(
        "SELECT {ATTEMPT_COLUMNS}
         FROM quiz_attempts
         WHERE user_id = $1
         ORDER BY submitted_at DESC, id"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn find_by_id(
    pool: &SqlitePool,
    id: &str,
) -> Result<Option<QuizAttempt>, sqlx::Error> {
    sqlx::query_as::<_, QuizAttempt>(&format!(
        "SELECT {ATTEMPT_COLUMNS} FROM quiz_attempts WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_responses(
    pool: &SqlitePool,
    attempt_id: &str,
) -> Result<Vec<AttemptResponse>, sqlx::Error> {
    sqlx::query_as::<_, AttemptResponse>(
        "SELECT r.id, r.attempt_id, r.question_id, r.selected_option, r.is_correct
         FROM attempt_responses r
         JOIN quiz_questions q ON q.id = r.question_id
         WHERE r.attempt_id = $1
         ORDER BY q.order_index",
    )
    .bind(attempt_id)
    .fetch_all(pool)
    .await
}
