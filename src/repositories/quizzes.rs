use sqlx::SqlitePool;
use time::PrimitiveDateTime;

use crate::db::models::Quiz;
use crate::repositories::StoreError;

const COLUMNS: &str = "id, document_id, created_at";

pub(crate) async fn create(
    executor: impl sqlx::SqliteExecutor<'_>,
    id: &str,
    document_id: &str,
    created_at: PrimitiveDateTime,
) -> Result<Quiz, StoreError> {
    sqlx::query_as::<_, Quiz>(&format!(
        "INSERT INTO quizzes (id, document_id, created_at)
         VALUES ($1,$2,$3)
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(document_id)
    .bind(created_at)
    .fetch_one(executor)
    .await
    .map_err(|err| StoreError::from_write(err, "document"))
}

pub(crate) async fn find_by_id(
    executor: impl sqlx::SqliteExecutor<'_>,
    id: &str,
) -> Result<Option<Quiz>, sqlx::Error> {
    sqlx::query_as::<_, Quiz>(&format!("SELECT {COLUMNS} FROM quizzes WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn list_for_document(
    pool: &SqlitePool,
    document_id: &str,
) -> Result<Vec<Quiz>, sqlx::Error> {
    sqlx::query_as::<_, Quiz>(&format!(
        "SELECT {COLUMNS} FROM quizzes WHERE document_id = $1 ORDER BY created_at, id"
    ))
    .bind(document_id)
    .fetch_all(pool)
    .await
}

/// Removes the quiz together with its questions, options and attempts.
pub(crate) async fn delete(
    executor: impl sqlx::SqliteExecutor<'_>,
    id: &str,
) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM quizzes WHERE id = $1").bind(id).execute(executor).await?;
    Ok(result.rows_affected() > 0)
}
