use sqlx::SqlitePool;
use time::PrimitiveDateTime;

use crate::db::models::Summary;
use crate::repositories::StoreError;

const COLUMNS: &str = "id, document_id, summary_text, generated_at";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct SummaryWithSourceRow {
    pub(crate) id: String,
    pub(crate) document_id: String,
    pub(crate) source_uri: String,
    pub(crate) summary_text: String,
    pub(crate) generated_at: PrimitiveDateTime,
}

pub(crate) struct CreateSummary<'a> {
    pub(crate) id: &'a str,
    pub(crate) document_id: &'a str,
    pub(crate) summary_text: &'a str,
    pub(crate) generated_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::SqliteExecutor<'_>,
    params: CreateSummary<'_>,
) -> Result<Summary, StoreError> {
    sqlx::query_as::<_, Summary>(&format!(
        "INSERT INTO summaries (id, document_id, summary_text, generated_at)
         VALUES ($1,$2,$3,$4)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.document_id)
    .bind(params.summary_text)
    .bind(params.generated_at)
    .fetch_one(executor)
    .await
    .map_err(|err| StoreError::from_write(err, "document"))
}

pub(crate) async fn list_for_document(
    pool: &SqlitePool,
    document_id: &str,
) -> Result<Vec<Summary>, sqlx::Error> {
    sqlx::query_as::<_, Summary>(&format!(
        "SELECT {COLUMNS}
         FROM summaries
         WHERE document_id = $1
         ORDER BY generated_at DESC, id"
    ))
    .bind(document_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_with_sources(
    pool: &SqlitePool,
) -> Result<Vec<SummaryWithSourceRow>, sqlx::Error> {
    sqlx::query_as::<_, SummaryWithSourceRow>(
        "SELECT s.id,
                s.document_id,
                d.source_uri,
                s.summary_text,
                s.generated_at
         FROM summaries s
         JOIN documents d ON d.id = s.document_id
         ORDER BY s.generated_at DESC, s.id",
    )
    .fetch_all(pool)
    .await
}

/// Regeneration drops every previous summary of the document first.
pub(crate) async fn delete_for_document(
    executor: impl sqlx::SqliteExecutor<'_>,
    document_id: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM summaries WHERE document_id = $1")
        .bind(document_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}
