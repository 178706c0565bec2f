use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use crate::core::config::ImportSettings;
use crate::core::time::primitive_now_utc;
use crate::repositories::questions::{self, ContainerKind, CreateQuestion};
use crate::repositories::{self, StoreError};
use crate::services::key_resolver::scalar_text;
use crate::services::payload;
use crate::services::question_reconciler::{self, FallbackPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KeyTopic {
    Summary,
    Quiz,
    Paper,
}

/// Checked top to bottom; the first rule with a trigger contained in the
/// lower-cased key wins. "test" appears twice and therefore always means quiz.
const CLASSIFICATION_RULES: &[(KeyTopic, &[&str])] = &[
    (KeyTopic::Summary, &["summary"]),
    (KeyTopic::Quiz, &["quiz", "question", "mcq", "test"]),
    (KeyTopic::Paper, &["paper", "exam", "test", "assessment"]),
];

pub(crate) fn classify_key(key: &str) -> Option<KeyTopic> {
    let lowered = key.to_lowercase();
    CLASSIFICATION_RULES
        .iter()
        .find(|(_, triggers)| triggers.iter().any(|trigger| lowered.contains(trigger)))
        .map(|(topic, _)| *topic)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ImportStatus {
    Complete,
    Partial,
    Failed,
}

impl ImportStatus {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Partial => "partial",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ImportReport {
    pub(crate) actions: Vec<String>,
    pub(crate) errors: Vec<String>,
}

impl ImportReport {
    pub(crate) fn status(&self) -> ImportStatus {
        if self.actions.is_empty() {
            ImportStatus::Failed
        } else if self.errors.is_empty() {
            ImportStatus::Complete
        } else {
            ImportStatus::Partial
        }
    }

    pub(crate) fn succeeded(&self) -> bool {
        self.status() != ImportStatus::Failed
    }
}

/// Wire form: `{status, actions, errors}`.
#[derive(Debug, Serialize)]
pub(crate) struct ImportReportBody {
    pub(crate) status: ImportStatus,
    pub(crate) actions: Vec<String>,
    pub(crate) errors: Vec<String>,
}

impl From<ImportReport> for ImportReportBody {
    fn from(report: ImportReport) -> Self {
        Self { status: report.status(), actions: report.actions, errors: report.errors }
    }
}

#[derive(Debug, Error)]
pub(crate) enum ImportError {
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("JSON payload must be an object at the top level")]
    NotAnObject,
    #[error("payload of {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: usize },
    #[error("document {0} not found")]
    DocumentNotFound(String),
    #[error("database error: {0}")]
    Store(#[from] sqlx::Error),
}

const NOTHING_IMPORTED: &str =
    "No valid data found in the JSON payload; expected summary, quiz or question paper keys";

/// Parses a raw payload and imports it into `document_id`.
pub(crate) async fn import_raw(
    pool: &SqlitePool,
    settings: &ImportSettings,
    document_id: &str,
    raw: &str,
) -> Result<ImportReport, ImportError> {
    let value = parse_payload(settings, raw)?;
    import_value(pool, settings, document_id, &value).await
}

/// Size check, fence stripping and the top-level object check, without
/// touching the store.
pub(crate) fn parse_payload(settings: &ImportSettings, raw: &str) -> Result<Value, ImportError> {
    if raw.len() > settings.max_payload_bytes {
        return Err(ImportError::PayloadTooLarge {
            size: raw.len(),
            limit: settings.max_payload_bytes,
        });
    }
    let value = payload::parse_json(raw)?;
    if !value.is_object() {
        return Err(ImportError::NotAnObject);
    }
    Ok(value)
}

pub(crate) async fn import_value(
    pool: &SqlitePool,
    settings: &ImportSettings,
    document_id: &str,
    value: &Value,
) -> Result<ImportReport, ImportError> {
    let object = value.as_object().ok_or(ImportError::NotAnObject)?;

    if repositories::documents::find_by_id(pool, document_id).await?.is_none() {
        return Err(ImportError::DocumentNotFound(document_id.to_string()));
    }

    tracing::info!(document_id, keys = object.len(), "Starting JSON import");

    let mut report = ImportReport::default();
    for (key, value) in object {
        let Some(topic) = classify_key(key) else {
            tracing::debug!(document_id, key, "Ignoring unrecognized top-level key");
            continue;
        };

        let outcome = match topic {
            KeyTopic::Summary => import_summary(pool, document_id, key, value).await,
            KeyTopic::Quiz => {
                import_container(
                    pool,
                    ContainerKind::Quiz,
                    FallbackPolicy::quiz(settings),
                    document_id,
                    key,
                    value,
                )
                .await
            }
            KeyTopic::Paper => {
                import_container(
                    pool,
                    ContainerKind::Paper,
                    FallbackPolicy::paper(settings),
                    document_id,
                    key,
                    value,
                )
                .await
            }
        };

        match outcome {
            Ok(action) => report.actions.push(action),
            Err(error) => report.errors.push(error),
        }
    }

    if report.actions.is_empty() {
        report.errors.push(NOTHING_IMPORTED.to_string());
    } else if let Err(err) =
        repositories::documents::mark_processed(pool, document_id, primitive_now_utc()).await
    {
        // Keys already committed stay reported.
        tracing::error!(error = %err, document_id, "Failed to mark document processed");
        report.errors.push(format!("Failed to mark document as processed: {err}"));
    }

    let status = report.status();
    metrics::counter!("import_runs_total", "status" => status.as_str()).increment(1);
    tracing::info!(
        document_id,
        status = status.as_str(),
        actions = report.actions.len(),
        errors = report.errors.len(),
        "Finished JSON import"
    );

    Ok(report)
}

async fn import_summary(
    pool: &SqlitePool,
    document_id: &str,
    key: &str,
    value: &Value,
) -> Result<String, String> {
    let (text, origin) = match value {
        Value::String(_) => (scalar_text(value), key.to_string()),
        Value::Object(map) => (map.get("text").and_then(scalar_text), format!("{key}.text")),
        _ => (None, key.to_string()),
    };
    let Some(text) = text else {
        return Err(format!(
            "Summary under '{key}' must be a non-empty string or an object with a 'text' field"
        ));
    };

    let id = Uuid::new_v4().to_string();
    repositories::summaries::create(
        pool,
        repositories::summaries::CreateSummary {
            id: &id,
            document_id,
            summary_text: &text,
            generated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|err| {
        tracing::error!(error = %err, document_id, key, "Failed to store summary");
        format!("Error adding summary from '{key}': {err}")
    })?;

    Ok(format!("Added summary from '{origin}' (ID: {id})"))
}

/// Candidate question records: the value itself when it is a list, the
/// "questions" list when the value is an object, otherwise nothing.
fn question_candidates(value: &Value) -> &[Value] {
    match value {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("questions") {
            Some(Value::Array(items)) => items,
            _ => &[],
        },
        _ => &[],
    }
}

pub(crate) fn paper_settings(value: &Value) -> Option<Map<String, Value>> {
    let map = value.as_object()?;
    if let Some(Value::Object(settings)) = map.get("settings") {
        return (!settings.is_empty()).then(|| settings.clone());
    }
    ["mode", "difficulty"].into_iter().find_map(|field| {
        map.get(field).map(|setting| {
            let mut single = Map::new();
            single.insert(field.to_string(), setting.clone());
            single
        })
    })
}

struct ContainerOutcome {
    id: String,
    accepted: usize,
    rejected: usize,
}

async fn import_container(
    pool: &SqlitePool,
    kind: ContainerKind,
    policy: FallbackPolicy,
    document_id: &str,
    key: &str,
    value: &Value,
) -> Result<String, String> {
    let outcome = store_container(pool, kind, policy, document_id, key, value)
        .await
        .map_err(|err| {
            tracing::error!(error = %err, document_id, key, container = kind.label(), "Import of key failed");
            format!("Error processing '{key}': {err}")
        })?;

    if outcome.accepted == 0 {
        return Err(format!("No valid questions found in '{key}'"));
    }

    let mut action = format!(
        "Added {} (ID: {}) with {} questions",
        kind.label(),
        outcome.id,
        outcome.accepted
    );
    if outcome.rejected > 0 {
        action.push_str(&format!(" ({} skipped)", outcome.rejected));
    }
    Ok(action)
}

/// Creates the container, fills it and drops it again when nothing was
/// accepted. Everything for one key commits together or not at all.
async fn store_container(
    pool: &SqlitePool,
    kind: ContainerKind,
    policy: FallbackPolicy,
    document_id: &str,
    key: &str,
    value: &Value,
) -> Result<ContainerOutcome, StoreError> {
    let id = Uuid::new_v4().to_string();
    let now = primitive_now_utc();
    let mut tx = pool.begin().await?;

    match kind {
        ContainerKind::Quiz => {
            repositories::quizzes::create(&mut *tx, &id, document_id, now).await?;
        }
        ContainerKind::Paper => {
            let settings = paper_settings(value);
            repositories::papers::create(&mut *tx, &id, document_id, settings.as_ref(), now)
                .await?;
        }
    }

    let mut accepted = 0usize;
    let mut rejected = 0usize;
    for (index, candidate) in question_candidates(value).iter().enumerate() {
        let question = match question_reconciler::reconcile(candidate, policy) {
            Ok(question) => question,
            Err(rejection) => {
                tracing::debug!(key, index, reason = %rejection, "Skipping question record");
                metrics::counter!("import_records_rejected_total", "reason" => rejection.metric_label())
                    .increment(1);
                rejected += 1;
                continue;
            }
        };

        questions::insert_with_options(
            &mut *tx,
            kind,
            CreateQuestion {
                container_id: &id,
                order_index: accepted as i64,
                question_text: &question.question_text,
                correct_option: &question.correct_option,
                options: &question.options,
                created_at: now,
            },
        )
        .await?;
        accepted += 1;
    }

    if accepted == 0 {
        match kind {
            ContainerKind::Quiz => repositories::quizzes::delete(&mut *tx, &id).await?,
            ContainerKind::Paper => repositories::papers::delete(&mut *tx, &id).await?,
        };
    } else {
        let container = match kind {
            ContainerKind::Quiz => "quiz",
            ContainerKind::Paper => "paper",
        };
        metrics::counter!("import_questions_total", "container" => container)
            .increment(accepted as u64);
    }

    tx.commit().await?;
    Ok(ContainerOutcome { id, accepted, rejected })
}
