use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Document, Quiz, Summary};
use crate::db::types::SourceType;
use crate::repositories::documents::SummarizedDocumentRow;
use crate::repositories::summaries::SummaryWithSourceRow;
use crate::services::document_analysis::DocumentAnalysis;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct DocumentCreate {
    #[validate(length(min = 1, message = "user_id must not be empty"))]
    pub(crate) user_id: String,
    #[validate(length(min = 1, message = "source_uri must not be empty"))]
    pub(crate) source_uri: String,
    #[serde(default = "default_source_type")]
    pub(crate) source_type: SourceType,
    #[serde(default)]
    pub(crate) text_content: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct DocumentResponse {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) source_uri: String,
    pub(crate) source_type: SourceType,
    pub(crate) text_content: Option<String>,
    pub(crate) uploaded_at: String,
    pub(crate) processed_at: Option<String>,
}

impl DocumentResponse {
    pub(crate) fn from_db(document: Document) -> Self {
        Self {
            id: document.id,
            user_id: document.user_id,
            source_uri: document.source_uri,
            source_type: document.source_type,
            text_content: document.text_content,
            uploaded_at: format_primitive(document.uploaded_at),
            processed_at: document.processed_at.map(format_primitive),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SummaryResponse {
    pub(crate) id: String,
    pub(crate) document_id: String,
    pub(crate) summary_text: String,
    pub(crate) generated_at: String,
}

impl SummaryResponse {
    pub(crate) fn from_db(summary: Summary) -> Self {
        Self {
            id: summary.id,
            document_id: summary.document_id,
            summary_text: summary.summary_text,
            generated_at: format_primitive(summary.generated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct DocumentDetailResponse {
    #[serde(flatten)]
    pub(crate) document: DocumentResponse,
    pub(crate) summaries: Vec<SummaryResponse>,
    pub(crate) quiz_ids: Vec<String>,
}

impl DocumentDetailResponse {
    pub(crate) fn from_db(document: Document, summaries: Vec<Summary>, quizzes: Vec<Quiz>) -> Self {
        Self {
            document: DocumentResponse::from_db(document),
            summaries: summaries.into_iter().map(SummaryResponse::from_db).collect(),
            quiz_ids: quizzes.into_iter().map(|quiz| quiz.id).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SummarizedDocumentResponse {
    pub(crate) id: String,
    pub(crate) source_uri: String,
    pub(crate) owner_name: String,
    pub(crate) source_type: SourceType,
    pub(crate) uploaded_at: String,
}

impl From<SummarizedDocumentRow> for SummarizedDocumentResponse {
    fn from(row: SummarizedDocumentRow) -> Self {
        Self {
            id: row.id,
            source_uri: row.source_uri,
            owner_name: row.owner_name,
            source_type: row.source_type,
            uploaded_at: format_primitive(row.uploaded_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SummaryWithSourceResponse {
    pub(crate) id: String,
    pub(crate) document_id: String,
    pub(crate) source_uri: String,
    pub(crate) summary_text: String,
    pub(crate) generated_at: String,
}

impl From<SummaryWithSourceRow> for SummaryWithSourceResponse {
    fn from(row: SummaryWithSourceRow) -> Self {
        Self {
            id: row.id,
            document_id: row.document_id,
            source_uri: row.source_uri,
            summary_text: row.summary_text,
            generated_at: format_primitive(row.generated_at),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SummaryReplace {
    #[validate(length(min = 1, message = "summary_text must not be empty"))]
    pub(crate) summary_text: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AnalysisIngestRequest {
    #[validate(length(min = 1, message = "user_id must not be empty"))]
    pub(crate) user_id: String,
    #[validate(length(min = 1, message = "source_uri must not be empty"))]
    pub(crate) source_uri: String,
    /// Either the analysis object itself or the raw model output as a string.
    pub(crate) analysis: Value,
}

#[derive(Debug, Serialize)]
pub(crate) struct AnalysisIngestResponse {
    pub(crate) document: DocumentResponse,
    pub(crate) analysis: DocumentAnalysis,
}

fn default_source_type() -> SourceType {
    SourceType::Handwritten
}
