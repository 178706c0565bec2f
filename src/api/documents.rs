use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::document::{
    AnalysisIngestRequest, AnalysisIngestResponse, DocumentCreate, DocumentDetailResponse,
    DocumentResponse, SummarizedDocumentResponse, SummaryReplace, SummaryResponse,
    SummaryWithSourceResponse,
};
use crate::services::{document_analysis, json_import};

/// `import_limit` replaces axum's default body cap on the import route so the
/// configured payload limit is the one that applies.
pub(crate) fn router(import_limit: usize) -> Router<AppState> {
    Router::new()
        .route("/", post(create_document))
        .route("/summarized", get(list_summarized))
        .route("/analysis", post(ingest_analysis))
        .route("/:document_id", get(get_document).delete(delete_document))
        .route(
            "/:document_id/import",
            post(import_json).layer(DefaultBodyLimit::max(import_limit)),
        )
        .route("/:document_id/summary", put(replace_summary))
}

pub(crate) fn summaries_router() -> Router<AppState> {
    Router::new().route("/", get(list_summaries))
}

async fn create_document(
    State(state): State<AppState>,
    Json(payload): Json<DocumentCreate>,
) -> Result<(StatusCode, Json<DocumentResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let document = repositories::documents::create(
        state.db(),
        repositories::documents::CreateDocument {
            id: &Uuid::new_v4().to_string(),
            user_id: &payload.user_id,
            source_uri: &payload.source_uri,
            source_type: payload.source_type,
            text_content: payload.text_content.as_deref(),
            uploaded_at: primitive_now_utc(),
        },
    )
    .await?;

    tracing::info!(document_id = %document.id, user_id = %document.user_id, "Document registered");
    Ok((StatusCode::CREATED, Json(DocumentResponse::from_db(document))))
}

async fn get_document(
    Path(document_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<DocumentDetailResponse>, ApiError> {
    let document = repositories::documents::find_by_id(state.db(), &document_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch document"))?;
    let Some(document) = document else {
        return Err(ApiError::NotFound("Document not found".to_string()));
    };

    let summaries = repositories::summaries::list_for_document(state.db(), &document_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list summaries"))?;
    let quizzes = repositories::quizzes::list_for_document(state.db(), &document_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list quizzes"))?;

    Ok(Json(DocumentDetailResponse::from_db(document, summaries, quizzes)))
}

async fn list_summarized(
    State(state): State<AppState>,
) -> Result<Json<Vec<SummarizedDocumentResponse>>, ApiError> {
    let rows = repositories::documents::list_with_summaries(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list summarized documents"))?;

    Ok(Json(rows.into_iter().map(SummarizedDocumentResponse::from).collect()))
}

async fn list_summaries(
    State(state): State<AppState>,
) -> Result<Json<Vec<SummaryWithSourceResponse>>, ApiError> {
    let rows = repositories::summaries::list_with_sources(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list summaries"))?;

    Ok(Json(rows.into_iter().map(SummaryWithSourceResponse::from).collect()))
}

async fn delete_document(
    Path(document_id): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let _guard = state.lock_document_import(&document_id).await;
    let deleted = repositories::documents::delete(state.db(), &document_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete document"))?;

    if !deleted {
        return Err(ApiError::NotFound("Document not found".to_string()));
    }

    tracing::info!(document_id = %document_id, "Document deleted with all derived content");
    Ok(StatusCode::NO_CONTENT)
}

async fn import_json(
    Path(document_id): Path<String>,
    State(state): State<AppState>,
    body: String,
) -> Result<Json<json_import::ImportReportBody>, ApiError> {
    let _guard = state.lock_document_import(&document_id).await;
    let report =
        json_import::import_raw(state.db(), state.settings().import(), &document_id, &body)
            .await?;

    Ok(Json(report.into()))
}

async fn replace_summary(
    Path(document_id): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<SummaryReplace>,
) -> Result<Json<SummaryResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let mut tx =
        state.db().begin().await.map_err(|e| ApiError::internal(e, "Failed to begin transaction"))?;
    let removed = repositories::summaries::delete_for_document(&mut *tx, &document_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to clear summaries"))?;
    let summary = repositories::summaries::create(
        &mut *tx,
        repositories::summaries::CreateSummary {
            id: &Uuid::new_v4().to_string(),
            document_id: &document_id,
            summary_text: payload.summary_text.trim(),
            generated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|err| match err {
        repositories::StoreError::MissingParent(_) => {
            ApiError::NotFound("Document not found".to_string())
        }
        other => other.into(),
    })?;
    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit summary"))?;

    tracing::info!(document_id = %document_id, replaced = removed, "Summary replaced");
    Ok(Json(SummaryResponse::from_db(summary)))
}

async fn ingest_analysis(
    State(state): State<AppState>,
    Json(payload): Json<AnalysisIngestRequest>,
) -> Result<(StatusCode, Json<AnalysisIngestResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let (document, analysis) = document_analysis::ingest_analysis(
        state.db(),
        &payload.user_id,
        &payload.source_uri,
        &payload.analysis,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(AnalysisIngestResponse { document: DocumentResponse::from_db(document), analysis }),
    ))
}
