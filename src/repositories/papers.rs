use serde_json::{Map, Value};
use sqlx::types::Json as SqlxJson;
use sqlx::SqlitePool;
use time::PrimitiveDateTime;

use crate::db::models::QuestionPaper;
use crate::repositories::StoreError;

const COLUMNS: &str = "id, document_id, settings, created_at";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct PaperListRow {
    pub(crate) id: String,
    pub(crate) document_id: String,
    pub(crate) source_uri: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) question_count: i64,
}

pub(crate) async fn create(
    executor: impl sqlx::SqliteExecutor<'_>,
    id: &str,
    document_id: &str,
    settings: Option<&Map<String, Value>>,
    created_at: PrimitiveDateTime,
) -> Result<QuestionPaper, StoreError> {
    sqlx::query_as::<_, QuestionPaper>(&format!(
        "INSERT INTO question_papers (id, document_id, settings, created_at)
         VALUES ($1,$2,$3,$4)
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(document_id)
    .bind(settings.map(SqlxJson))
    .bind(created_at)
    .fetch_one(executor)
    .await
    .map_err(|err| StoreError::from_write(err, "document"))
}

pub(crate) async fn find_by_id(
    executor: impl sqlx::SqliteExecutor<'_>,
    id: &str,
) -> Result<Option<QuestionPaper>, sqlx::Error> {
    sqlx::query_as::<_, QuestionPaper>(&format!(
        "SELECT {COLUMNS} FROM question_papers WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn list_with_question_counts(
    pool: &SqlitePool,
) -> Result<Vec<PaperListRow>, sqlx::Error> {
    sqlx::query_as::<_, PaperListRow>(
        "SELECT p.id,
                p.document_id,
                d.source_uri,
                p.created_at,
                (SELECT COUNT(*) FROM paper_questions q WHERE q.paper_id = p.id) AS question_count
         FROM question_papers p
         JOIN documents d ON d.id = p.document_id
         ORDER BY p.created_at DESC, p.id",
    )
    .fetch_all(pool)
    .await
}

pub(crate) async fn delete(
    executor: impl sqlx::SqliteExecutor<'_>,
    id: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM question_papers WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}
