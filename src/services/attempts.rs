use std::collections::HashMap;

use serde::Deserialize;
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use crate::core::time::primitive_now_utc;
use crate::db::models::{QuestionWithOptions, QuizAttempt};
use crate::repositories;
use crate::repositories::questions::ContainerKind;
use crate::services::assessment::{self, AnswerKey, ScoreError, ScoreResult};

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SubmittedAnswer {
    pub(crate) question_id: String,
    #[serde(default)]
    pub(crate) selected_option: Option<String>,
}

#[derive(Debug, Error)]
pub(crate) enum AttemptError {
    #[error("quiz {0} not found")]
    QuizNotFound(String),
    #[error("question paper {0} not found")]
    PaperNotFound(String),
    #[error("user {0} not found")]
    UserNotFound(String),
    #[error("question {0} does not belong to this assessment")]
    UnknownQuestion(String),
    #[error("question {0} was answered more than once")]
    DuplicateAnswer(String),
    #[error("option '{option}' is not offered by question {question_id}")]
    OptionNotOffered { question_id: String, option: String },
    #[error(transparent)]
    Score(#[from] ScoreError),
    #[error("database error: {0}")]
    Store(#[from] sqlx::Error),
}

#[derive(Debug)]
pub(crate) struct AttemptOutcome {
    pub(crate) attempt: QuizAttempt,
    pub(crate) result: ScoreResult,
}

/// Lines submitted answers up with the stored questions. Questions without an
/// answer count as left blank.
fn align_answers(
    questions: &[QuestionWithOptions],
    answers: &[SubmittedAnswer],
) -> Result<(Vec<AnswerKey>, Vec<Option<String>>), AttemptError> {
    let mut by_question: HashMap<&str, Option<&str>> = HashMap::with_capacity(answers.len());
    for answer in answers {
        let Some(question) =
            questions.iter().find(|entry| entry.question.id == answer.question_id)
        else {
            return Err(AttemptError::UnknownQuestion(answer.question_id.clone()));
        };
        let selected = answer.selected_option.as_deref().filter(|option| !option.is_empty());
        if let Some(option) = selected {
            if !question.options.iter().any(|offered| offered.option_text == option) {
                return Err(AttemptError::OptionNotOffered {
                    question_id: answer.question_id.clone(),
                    option: option.to_string(),
                });
            }
        }
        if by_question.insert(answer.question_id.as_str(), selected).is_some() {
            return Err(AttemptError::DuplicateAnswer(answer.question_id.clone()));
        }
    }

    let keys = questions
        .iter()
        .map(|entry| AnswerKey {
            question_id: entry.question.id.clone(),
            correct_option: entry.question.correct_option.clone(),
            options: entry.options.iter().map(|option| option.option_text.clone()).collect(),
        })
        .collect::<Vec<_>>();
    let submitted = questions
        .iter()
        .map(|entry| {
            by_question.get(entry.question.id.as_str()).copied().flatten().map(str::to_string)
        })
        .collect::<Vec<_>>();

    Ok((keys, submitted))
}

/// Grades a quiz attempt and records it, its responses and any revision queue
/// updates in one transaction.
pub(crate) async fn submit_attempt(
    pool: &SqlitePool,
    quiz_id: &str,
    user_id: &str,
    answers: &[SubmittedAnswer],
) -> Result<AttemptOutcome, AttemptError> {
    let mut tx = pool.begin().await?;

    if repositories::quizzes::find_by_id(&mut *tx, quiz_id).await?.is_none() {
        return Err(AttemptError::QuizNotFound(quiz_id.to_string()));
    }
    if repositories::users::find_by_id(&mut *tx, user_id).await?.is_none() {
        return Err(AttemptError::UserNotFound(user_id.to_string()));
    }

    let questions =
        repositories::questions::list_with_options(&mut *tx, ContainerKind::Quiz, quiz_id).await?;
    let (keys, submitted) = align_answers(&questions, answers)?;
    let result = assessment::grade(&keys, &submitted)?;

    let now = primitive_now_utc();
    let attempt_id = Uuid::new_v4().to_string();
    let attempt =
        repositories::attempts::create(&mut *tx, &attempt_id, quiz_id, user_id, now).await?;

    for outcome in &result.per_question {
        let response_id = Uuid::new_v4().to_string();
        repositories::attempts::insert_response(
            &mut *tx,
            repositories::attempts::CreateResponse {
                id: &response_id,
                attempt_id: &attempt_id,
                question_id: &outcome.question_id,
                selected_option: outcome.selected_option.as_deref(),
                is_correct: outcome.is_correct,
            },
        )
        .await?;

        if !outcome.is_correct {
            repositories::revision_queue::record_failure(
                &mut *tx,
                user_id,
                &outcome.question_id,
                now,
            )
            .await?;
        }
    }

    tx.commit().await?;

    metrics::counter!("attempts_graded_total").increment(1);
    tracing::info!(
        quiz_id,
        user_id,
        attempt_id = %attempt.id,
        score = result.score,
        total = result.total,
        "Quiz attempt recorded"
    );

    Ok(AttemptOutcome { attempt, result })
}

/// Grades answers to a question paper. Nothing is persisted.
pub(crate) async fn grade_paper(
    pool: &SqlitePool,
    paper_id: &str,
    answers: &[SubmittedAnswer],
) -> Result<ScoreResult, AttemptError> {
    let mut conn = pool.acquire().await?;
    if repositories::papers::find_by_id(&mut *conn, paper_id).await?.is_none() {
        return Err(AttemptError::PaperNotFound(paper_id.to_string()));
    }

    let questions =
        repositories::questions::list_with_options(&mut *conn, ContainerKind::Paper, paper_id)
            .await?;
    let (keys, submitted) = align_answers(&questions, answers)?;
    let result = assessment::grade(&keys, &submitted)?;

    tracing::debug!(paper_id, score = result.score, total = result.total, "Question paper graded");
    Ok(result)
}
