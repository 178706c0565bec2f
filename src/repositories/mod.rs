pub(crate) mod attempts;
pub(crate) mod documents;
pub(crate) mod health;
pub(crate) mod papers;
pub(crate) mod questions;
pub(crate) mod quizzes;
pub(crate) mod revision_queue;
pub(crate) mod summaries;
pub(crate) mod users;

use thiserror::Error;

/// Typed outcome for writes that can trip a schema constraint.
#[derive(Debug, Error)]
pub(crate) enum StoreError {
    #[error("user with email {0} already exists")]
    DuplicateEmail(String),
    #[error("referenced {0} does not exist")]
    MissingParent(&'static str),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub(crate) fn from_write(err: sqlx::Error, parent: &'static str) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_foreign_key_violation() {
                return Self::MissingParent(parent);
            }
        }
        Self::Database(err)
    }
}
