use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::{SourceType, UserRole};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) role: UserRole,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Document {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) source_uri: String,
    pub(crate) source_type: SourceType,
    pub(crate) text_content: Option<String>,
    pub(crate) uploaded_at: PrimitiveDateTime,
    pub(crate) processed_at: Option<PrimitiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Summary {
    pub(crate) id: String,
    pub(crate) document_id: String,
    pub(crate) summary_text: String,
    pub(crate) generated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Quiz {
    pub(crate) id: String,
    pub(crate) document_id: String,
    pub(crate) created_at: PrimitiveDateTime,
}

/// Row shape shared by `quiz_questions` and `paper_questions`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Question {
    pub(crate) id: String,
    pub(crate) container_id: String,
    pub(crate) order_index: i64,
    pub(crate) question_text: String,
    pub(crate) correct_option: String,
    pub(crate) created_at: PrimitiveDateTime,
}

/// Row shape shared by `question_options` and `paper_options`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct QuestionOption {
    pub(crate) id: String,
    pub(crate) question_id: String,
    pub(crate) order_index: i64,
    pub(crate) option_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct QuestionPaper {
    pub(crate) id: String,
    pub(crate) document_id: String,
    pub(crate) settings: Option<Json<serde_json::Map<String, serde_json::Value>>>,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct QuizAttempt {
    pub(crate) id: String,
    pub(crate) quiz_id: String,
    pub(crate) user_id: String,
    pub(crate) submitted_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct AttemptResponse {
    pub(crate) id: String,
    pub(crate) attempt_id: String,
    pub(crate) question_id: String,
    pub(crate) selected_option: Option<String>,
    pub(crate) is_correct: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct RevisionQueueEntry {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) question_id: String,
    pub(crate) fail_count: i64,
    pub(crate) last_failed_at: PrimitiveDateTime,
    pub(crate) next_review_at: Option<PrimitiveDateTime>,
}

/// A quiz or paper question together with its options in display order.
#[derive(Debug, Clone)]
pub(crate) struct QuestionWithOptions {
    pub(crate) question: Question,
    pub(crate) options: Vec<QuestionOption>,
}
