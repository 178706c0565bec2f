//! Normalization of document-analysis output into a fixed shape.
//!
//! The analysis service nominally returns
//! `{subject, topics[], text, metadata{document_type, language, pages}, sections[]}`
//! but any subset or superset has to be tolerated.

use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use crate::core::time::primitive_now_utc;
use crate::db::models::Document;
use crate::db::types::SourceType;
use crate::repositories::{self, StoreError};
use crate::services::key_resolver::{resolve, scalar_text, Resolved, SynonymSet};
use crate::services::payload;

const SUBJECT: SynonymSet = SynonymSet::single("subject", &["subject"]);
const TOPICS: SynonymSet = SynonymSet::list("topics", &["topics"]);
const TEXT: SynonymSet = SynonymSet::single("text", &["text"]);
const METADATA: SynonymSet = SynonymSet::single("metadata", &["metadata"]);
const SECTIONS: SynonymSet = SynonymSet::list("sections", &["sections"]);
const DOCUMENT_TYPE: SynonymSet = SynonymSet::single("document_type", &["document_type"]);
const LANGUAGE: SynonymSet = SynonymSet::single("language", &["language"]);
const PAGES: SynonymSet = SynonymSet::single("pages", &["pages"]);
const SECTION_TITLE: SynonymSet = SynonymSet::single("title", &["title"]);
const SECTION_CONTENT: SynonymSet = SynonymSet::single("content", &["content"]);

const UNKNOWN_SUBJECT: &str = "Unknown";
const UNKNOWN_METADATA: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct AnalysisMetadata {
    pub(crate) document_type: String,
    pub(crate) language: String,
    pub(crate) pages: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct AnalysisSection {
    pub(crate) title: String,
    pub(crate) content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct DocumentAnalysis {
    pub(crate) subject: String,
    pub(crate) topics: Vec<String>,
    pub(crate) text: String,
    pub(crate) metadata: AnalysisMetadata,
    pub(crate) sections: Vec<AnalysisSection>,
}

#[derive(Debug, Error)]
pub(crate) enum AnalysisError {
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("analysis payload must be a JSON object")]
    NotAnObject,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<sqlx::Error> for AnalysisError {
    fn from(err: sqlx::Error) -> Self {
        Self::Store(StoreError::Database(err))
    }
}

fn text_or(record: &Map<String, Value>, set: &SynonymSet, default: &str) -> String {
    resolve(record, set).value().and_then(scalar_text).unwrap_or_else(|| default.to_string())
}

fn list_items<'a>(record: &'a Map<String, Value>, set: &SynonymSet) -> &'a [Value] {
    match resolve(record, set) {
        Resolved::Present { value: Value::Array(items), .. } => items,
        _ => &[],
    }
}

/// Topics come either as plain strings or as `{name, ...}` objects.
fn topic_name(item: &Value) -> Option<String> {
    match item {
        Value::Object(map) => map.get("name").and_then(scalar_text),
        other => scalar_text(other),
    }
}

pub(crate) fn normalize(value: &Value) -> Result<DocumentAnalysis, AnalysisError> {
    let record = value.as_object().ok_or(AnalysisError::NotAnObject)?;

    let metadata = match resolve(record, &METADATA).value() {
        Some(Value::Object(meta)) => AnalysisMetadata {
            document_type: text_or(meta, &DOCUMENT_TYPE, UNKNOWN_METADATA),
            language: text_or(meta, &LANGUAGE, UNKNOWN_METADATA),
            pages: text_or(meta, &PAGES, UNKNOWN_METADATA),
        },
        _ => AnalysisMetadata {
            document_type: UNKNOWN_METADATA.to_string(),
            language: UNKNOWN_METADATA.to_string(),
            pages: UNKNOWN_METADATA.to_string(),
        },
    };

    let sections = list_items(record, &SECTIONS)
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|section| {
            let title = resolve(section, &SECTION_TITLE).value().and_then(scalar_text);
            let content = resolve(section, &SECTION_CONTENT).value().and_then(scalar_text);
            match (title, content) {
                (None, None) => None,
                (title, content) => Some(AnalysisSection {
                    title: title.unwrap_or_default(),
                    content: content.unwrap_or_default(),
                }),
            }
        })
        .collect();

    Ok(DocumentAnalysis {
        subject: text_or(record, &SUBJECT, UNKNOWN_SUBJECT),
        topics: list_items(record, &TOPICS).iter().filter_map(topic_name).collect(),
        text: text_or(record, &TEXT, ""),
        metadata,
        sections,
    })
}

/// Stores the analysed text as a new processed document. A string payload is
/// treated as raw model output and parsed first.
pub(crate) async fn ingest_analysis(
    pool: &SqlitePool,
    user_id: &str,
    source_uri: &str,
    analysis: &Value,
) -> Result<(Document, DocumentAnalysis), AnalysisError> {
    let analysis = match analysis {
        Value::String(raw) => normalize(&payload::parse_json(raw)?)?,
        other => normalize(other)?,
    };

    let now = primitive_now_utc();
    let id = Uuid::new_v4().to_string();
    let mut tx = pool.begin().await?;
    let document = repositories::documents::create(
        &mut *tx,
        repositories::documents::CreateDocument {
            id: &id,
            user_id,
            source_uri,
            source_type: SourceType::Text,
            text_content: Some(&analysis.text),
            uploaded_at: now,
        },
    )
    .await?;
    repositories::documents::mark_processed(&mut *tx, &document.id, now).await?;
    tx.commit().await?;

    tracing::info!(
        document_id = %document.id,
        subject = %analysis.subject,
        sections = analysis.sections.len(),
        "Document analysis ingested"
    );

    let document = Document { processed_at: Some(now), ..document };
    Ok((document, analysis))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;
    use serde_json::json;

    #[test]
    fn empty_object_gets_all_defaults() {
        let analysis = normalize(&json!({})).expect("normalized");
        assert_eq!(analysis.subject, "Unknown");
        assert!(analysis.topics.is_empty());
        assert_eq!(analysis.text, "");
        assert_eq!(analysis.metadata.document_type, "unknown");
        assert_eq!(analysis.metadata.language, "unknown");
        assert_eq!(analysis.metadata.pages, "unknown");
        assert!(analysis.sections.is_empty());
    }

    #[test]
    fn full_payload_is_carried_over() {
        let analysis = normalize(&json!({
            "subject": "Biology",
            "topics": ["Cells", {"name": "Mitosis", "content": "..."}, 7, null],
            "text": "Cells divide.",
            "metadata": {"document_type": "notes", "language": "en", "pages": 3},
            "sections": [
                {"title": "Intro", "content": "Cells"},
                "stray",
                {"unrelated": true},
                {"content": "untitled"}
            ],
            "confidence": 0.9
        }))
        .expect("normalized");

        assert_eq!(analysis.subject, "Biology");
        assert_eq!(analysis.topics, vec!["Cells", "Mitosis", "7"]);
        assert_eq!(analysis.metadata.pages, "3");
        assert_eq!(
            analysis.sections,
            vec![
                AnalysisSection { title: "Intro".into(), content: "Cells".into() },
                AnalysisSection { title: String::new(), content: "untitled".into() },
            ]
        );
    }

    #[test]
    fn partial_metadata_is_filled() {
        let analysis =
            normalize(&json!({"metadata": {"language": "de"}, "topics": "not a list"}))
                .expect("normalized");
        assert_eq!(analysis.metadata.language, "de");
        assert_eq!(analysis.metadata.document_type, "unknown");
        assert!(analysis.topics.is_empty());
    }

    #[test]
    fn non_object_is_rejected() {
        assert!(matches!(normalize(&json!([1])), Err(AnalysisError::NotAnObject)));
    }

    #[tokio::test]
    async fn ingest_stores_processed_text_document() {
        let pool = test_support::memory_pool().await;
        let user = test_support::insert_user(&pool, "Jo", "jo@example.com").await;

        let raw = "```json\n{\"subject\": \"History\", \"text\": \"Rome was not built in a day.\"}\n```";
        let (document, analysis) =
            ingest_analysis(&pool, &user.id, "uploads/rome.txt", &json!(raw)).await.expect("ingest");

        assert_eq!(analysis.subject, "History");
        let stored = repositories::documents::find_by_id(&pool, &document.id)
            .await
            .expect("find")
            .expect("document");
        assert_eq!(stored.source_type, SourceType::Text);
        assert_eq!(stored.text_content.as_deref(), Some("Rome was not built in a day."));
        assert!(stored.processed_at.is_some());
    }

    #[tokio::test]
    async fn ingest_for_unknown_user_fails() {
        let pool = test_support::memory_pool().await;
        let err = ingest_analysis(&pool, "ghost", "uploads/x.txt", &json!({})).await.unwrap_err();
        assert!(matches!(err, AnalysisError::Store(StoreError::MissingParent("user"))));
    }
}
