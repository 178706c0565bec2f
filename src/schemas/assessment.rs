use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{
    AttemptResponse, QuestionPaper, QuestionWithOptions, Quiz, QuizAttempt, RevisionQueueEntry,
};
use crate::repositories::papers::PaperListRow;
use crate::services::assessment::ScoreResult;
use crate::services::attempts::SubmittedAnswer;

/// A question as shown to someone taking the assessment; the answer stays
/// hidden until grading.
#[derive(Debug, Serialize)]
pub(crate) struct QuestionResponse {
    pub(crate) id: String,
    pub(crate) order_index: i64,
    pub(crate) question_text: String,
    pub(crate) options: Vec<String>,
}

impl QuestionResponse {
    pub(crate) fn from_db(entry: QuestionWithOptions) -> Self {
        Self {
            id: entry.question.id,
            order_index: entry.question.order_index,
            question_text: entry.question.question_text,
            options: entry.options.into_iter().map(|option| option.option_text).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct QuizResponse {
    pub(crate) id: String,
    pub(crate) document_id: String,
    pub(crate) created_at: String,
    pub(crate) questions: Vec<QuestionResponse>,
}

impl QuizResponse {
    pub(crate) fn from_db(quiz: Quiz, questions: Vec<QuestionWithOptions>) -> Self {
        Self {
            id: quiz.id,
            document_id: quiz.document_id,
            created_at: format_primitive(quiz.created_at),
            questions: questions.into_iter().map(QuestionResponse::from_db).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct PaperResponse {
    pub(crate) id: String,
    pub(crate) document_id: String,
    pub(crate) settings: Option<Map<String, Value>>,
    pub(crate) created_at: String,
    pub(crate) questions: Vec<QuestionResponse>,
}

impl PaperResponse {
    pub(crate) fn from_db(paper: QuestionPaper, questions: Vec<QuestionWithOptions>) -> Self {
        Self {
            id: paper.id,
            document_id: paper.document_id,
            settings: paper.settings.map(|settings| settings.0),
            created_at: format_primitive(paper.created_at),
            questions: questions.into_iter().map(QuestionResponse::from_db).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct PaperListItem {
    pub(crate) id: String,
    pub(crate) document_id: String,
    pub(crate) source_uri: String,
    pub(crate) created_at: String,
    pub(crate) question_count: i64,
}

impl From<PaperListRow> for PaperListItem {
    fn from(row: PaperListRow) -> Self {
        Self {
            id: row.id,
            document_id: row.document_id,
            source_uri: row.source_uri,
            created_at: format_primitive(row.created_at),
            question_count: row.question_count,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AttemptCreate {
    #[validate(length(min = 1, message = "user_id must not be empty"))]
    pub(crate) user_id: String,
    #[serde(default)]
    pub(crate) answers: Vec<SubmittedAnswer>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PaperGradeRequest {
    #[serde(default)]
    pub(crate) answers: Vec<SubmittedAnswer>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AttemptResultResponse {
    pub(crate) attempt_id: String,
    pub(crate) quiz_id: String,
    pub(crate) user_id: String,
    pub(crate) submitted_at: String,
    #[serde(flatten)]
    pub(crate) result: ScoreResult,
}

impl AttemptResultResponse {
    pub(crate) fn from_outcome(attempt: QuizAttempt, result: ScoreResult) -> Self {
        Self {
            attempt_id: attempt.id,
            quiz_id: attempt.quiz_id,
            user_id: attempt.user_id,
            submitted_at: format_primitive(attempt.submitted_at),
            result,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AttemptListItem {
    pub(crate) id: String,
    pub(crate) quiz_id: String,
    pub(crate) submitted_at: String,
}

impl From<QuizAttempt> for AttemptListItem {
    fn from(attempt: QuizAttempt) -> Self {
        Self {
            id: attempt.id,
            quiz_id: attempt.quiz_id,
            submitted_at: format_primitive(attempt.submitted_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ResponseItem {
    pub(crate) question_id: String,
    pub(crate) selected_option: Option<String>,
    pub(crate) is_correct: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct AttemptDetailResponse {
    pub(crate) id: String,
    pub(crate) quiz_id: String,
    pub(crate) user_id: String,
    pub(crate) submitted_at: String,
    pub(crate) responses: Vec<ResponseItem>,
}

impl AttemptDetailResponse {
    pub(crate) fn from_db(attempt: QuizAttempt, responses: Vec<AttemptResponse>) -> Self {
        Self {
            id: attempt.id,
            quiz_id: attempt.quiz_id,
            user_id: attempt.user_id,
            submitted_at: format_primitive(attempt.submitted_at),
            responses: responses
                .into_iter()
                .map(|response| ResponseItem {
                    question_id: response.question_id,
                    selected_option: response.selected_option,
                    is_correct: response.is_correct,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct RevisionQueueItem {
    pub(crate) question_id: String,
    pub(crate) fail_count: i64,
    pub(crate) last_failed_at: String,
    pub(crate) next_review_at: Option<String>,
}

impl From<RevisionQueueEntry> for RevisionQueueItem {
    fn from(entry: RevisionQueueEntry) -> Self {
        Self {
            question_id: entry.question_id,
            fail_count: entry.fail_count,
            last_failed_at: format_primitive(entry.last_failed_at),
            next_review_at: entry.next_review_at.map(format_primitive),
        }
    }
}
