use sqlx::{Connection, SqliteConnection};
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::db::models::{Question, QuestionOption, QuestionWithOptions};

/// Quizzes and question papers store their questions in structurally identical
/// table pairs; this picks the pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ContainerKind {
    Quiz,
    Paper,
}

impl ContainerKind {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Quiz => "quiz",
            Self::Paper => "question paper",
        }
    }

    fn question_table(self) -> &'static str {
        match self {
            Self::Quiz => "quiz_questions",
            Self::Paper => "paper_questions",
        }
    }

    fn container_column(self) -> &'static str {
        match self {
            Self::Quiz => "quiz_id",
            Self::Paper => "paper_id",
        }
    }

    fn option_table(self) -> &'static str {
        match self {
            Self::Quiz => "question_options",
            Self::Paper => "paper_options",
        }
    }

    fn option_question_column(self) -> &'static str {
        match self {
            Self::Quiz => "question_id",
            Self::Paper => "paper_question_id",
        }
    }
}

pub(crate) struct CreateQuestion<'a> {
    pub(crate) container_id: &'a str,
    pub(crate) order_index: i64,
    pub(crate) question_text: &'a str,
    pub(crate) correct_option: &'a str,
    pub(crate) options: &'a [String],
    pub(crate) created_at: PrimitiveDateTime,
}

/// Inserts a question and all of its options under one savepoint, so a failure
/// never leaves a question without its options.
pub(crate) async fn insert_with_options(
    conn: &mut SqliteConnection,
    kind: ContainerKind,
    params: CreateQuestion<'_>,
) -> Result<QuestionWithOptions, sqlx::Error> {
    let mut savepoint = conn.begin().await?;

    let question = sqlx::query_as::<_, Question>(&format!(
        "INSERT INTO {table} (id, {container}, order_index, question_text, correct_option, created_at)
         VALUES ($1,$2,$3,$4,$5,$6)
         RETURNING id, {container} AS container_id, order_index, question_text, correct_option,
                   created_at",
        table = kind.question_table(),
        container = kind.container_column(),
    ))
    .bind(Uuid::new_v4().to_string())
    .bind(params.container_id)
    .bind(params.order_index)
    .bind(params.question_text)
    .bind(params.correct_option)
    .bind(params.created_at)
    .fetch_one(&mut *savepoint)
    .await?;

    let mut options = Vec::with_capacity(params.options.len());
    for (order_index, option_text) in params.options.iter().enumerate() {
        let option = sqlx::query_as::<_, QuestionOption>(&format!(
            "INSERT INTO {table} (id, {question}, order_index, option_text)
             VALUES ($1,$2,$3,$4)
             RETURNING id, {question} AS question_id, order_index, option_text",
            table = kind.option_table(),
            question = kind.option_question_column(),
        ))
        .bind(Uuid::new_v4().to_string())
        .bind(&question.id)
        .bind(order_index as i64)
        .bind(option_text)
        .fetch_one(&mut *savepoint)
        .await?;
        options.push(option);
    }

    savepoint.commit().await?;
    Ok(QuestionWithOptions { question, options })
}

/// Questions in insertion order, each with its options in insertion order.
pub(crate) async fn list_with_options(
    conn: &mut SqliteConnection,
    kind: ContainerKind,
    container_id: &str,
) -> Result<Vec<QuestionWithOptions>, sqlx::Error> {
    let questions = sqlx::query_as::<_, Question>(&format!(
        "SELECT id, {container} AS container_id, order_index, question_text, correct_option,
                created_at
         FROM {table}
         WHERE {container} = $1
         ORDER BY order_index, id",
        table = kind.question_table(),
        container = kind.container_column(),
    ))
    .bind(container_id)
    .fetch_all(&mut *conn)
    .await?;

    let options = sqlx::query_as::<_, QuestionOption>(&format!(
        "SELECT o.id, o.{question} AS question_id, o.order_index, o.option_text
         FROM {option_table} o
         JOIN {question_table} q ON q.id = o.{question}
         WHERE q.{container} = $1
         ORDER BY o.{question}, o.order_index",
        question = kind.option_question_column(),
        option_table = kind.option_table(),
        question_table = kind.question_table(),
        container = kind.container_column(),
    ))
    .bind(container_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut grouped = questions
        .into_iter()
        .map(|question| QuestionWithOptions { question, options: Vec::new() })
        .collect::<Vec<_>>();
    for option in options {
        if let Some(entry) = grouped.iter_mut().find(|entry| entry.question.id == option.question_id)
        {
            entry.options.push(option);
        }
    }

    Ok(grouped)
}
