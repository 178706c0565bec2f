use sqlx::SqlitePool;
use time::PrimitiveDateTime;

use crate::db::models::Document;
use crate::db::types::SourceType;
use crate::repositories::StoreError;

pub(crate) const COLUMNS: &str =
    "id, user_id, source_uri, source_type, text_content, uploaded_at, processed_at";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct SummarizedDocumentRow {
    pub(crate) id: String,
    pub(crate) source_uri: String,
    pub(crate) owner_name: String,
    pub(crate) source_type: SourceType,
    pub(crate) uploaded_at: PrimitiveDateTime,
}

pub(crate) struct CreateDocument<'a> {
    pub(crate) id: &'a str,
    pub(crate) user_id: &'a str,
    pub(crate) source_uri: &'a str,
    pub(crate) source_type: SourceType,
    pub(crate) text_content: Option<&'a str>,
    pub(crate) uploaded_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::SqliteExecutor<'_>,
    params: CreateDocument<'_>,
) -> Result<Document, StoreError> {
    sqlx::query_as::<_, Document>(&format!(
        "INSERT INTO documents (id, user_id, source_uri, source_type, text_content, uploaded_at)
         VALUES ($1,$2,$3,$4,$5,$6)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.user_id)
    .bind(params.source_uri)
    .bind(params.source_type)
    .bind(params.text_content)
    .bind(params.uploaded_at)
    .fetch_one(executor)
    .await
    .map_err(|err| StoreError::from_write(err, "user"))
}

pub(crate) async fn find_by_id(
    executor: impl sqlx::SqliteExecutor<'_>,
    id: &str,
) -> Result<Option<Document>, sqlx::Error> {
    sqlx::query_as::<_, Document>(&format!("SELECT {COLUMNS} FROM documents WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn mark_processed(
    executor: impl sqlx::SqliteExecutor<'_>,
    id: &str,
    processed_at: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE documents SET processed_at = $1 WHERE id = $2")
        .bind(processed_at)
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Documents that own at least one committed summary, newest upload first.
pub(crate) async fn list_with_summaries(
    pool: &SqlitePool,
) -> Result<Vec<SummarizedDocumentRow>, sqlx::Error> {
    sqlx::query_as::<_, SummarizedDocumentRow>(
        "SELECT d.id,
                d.source_uri,
                u.name AS owner_name,
                d.source_type,
                d.uploaded_at
         FROM documents d
         JOIN users u ON u.id = d.user_id
         WHERE EXISTS (SELECT 1 FROM summaries s WHERE s.document_id = d.id)
         ORDER BY d.uploaded_at DESC, d.id",
    )
    .fetch_all(pool)
    .await
}

pub(crate) async fn delete(pool: &SqlitePool, id: &str) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM documents WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::primitive_now_utc;
    use crate::repositories::summaries;
    use crate::test_support;

    #[tokio::test]
    async fn create_rejects_unknown_owner() {
        let pool = test_support::memory_pool().await;

        let err = create(
            &pool,
            CreateDocument {
                id: "doc-1",
                user_id: "nobody",
                source_uri: "uploads/notes.pdf",
                source_type: SourceType::Text,
                text_content: None,
                uploaded_at: primitive_now_utc(),
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, StoreError::MissingParent("user")));
    }

    #[tokio::test]
    async fn only_summarized_documents_are_listed() {
        let pool = test_support::memory_pool().await;
        let user = test_support::insert_user(&pool, "Lin", "lin@example.com").await;
        let with_summary = test_support::insert_document(&pool, &user.id).await;
        let _without_summary = test_support::insert_document(&pool, &user.id).await;

        summaries::create(
            &pool,
            summaries::CreateSummary {
                id: "summary-1",
                document_id: &with_summary.id,
                summary_text: "Cells are the unit of life.",
                generated_at: primitive_now_utc(),
            },
        )
        .await
        .expect("create summary");

        let rows = list_with_summaries(&pool).await.expect("list documents");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, with_summary.id);
        assert_eq!(rows[0].owner_name, "Lin");
    }

    #[tokio::test]
    async fn mark_processed_sets_timestamp() {
        let pool = test_support::memory_pool().await;
        let user = test_support::insert_user(&pool, "Ola", "ola@example.com").await;
        let document = test_support::insert_document(&pool, &user.id).await;
        assert!(document.processed_at.is_none());

        mark_processed(&pool, &document.id, primitive_now_utc()).await.expect("mark processed");

        let reloaded =
            find_by_id(&pool, &document.id).await.expect("find").expect("document exists");
        assert!(reloaded.processed_at.is_some());
    }
}
