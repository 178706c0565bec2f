use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::repositories::StoreError;
use crate::services::attempts::AttemptError;
use crate::services::document_analysis::AnalysisError;
use crate::services::json_import::ImportError;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: u16,
    detail: String,
}

#[derive(Debug)]
pub(crate) enum ApiError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    PayloadTooLarge(String),
    Unprocessable(String),
    Internal(String),
}

impl ApiError {
    /// Log the underlying error with context and return an `Internal` variant.
    pub(crate) fn internal(err: impl std::fmt::Display, context: &str) -> Self {
        tracing::error!(error = %err, "{context}");
        Self::Internal(context.to_string())
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match self {
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "Internal server error");
                message
            }
            ApiError::BadRequest(message)
            | ApiError::NotFound(message)
            | ApiError::Conflict(message)
            | ApiError::PayloadTooLarge(message)
            | ApiError::Unprocessable(message) => message,
        };
        (status, Json(ErrorResponse { status: status.as_u16(), detail })).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail(_) => ApiError::Conflict(err.to_string()),
            StoreError::MissingParent(_) => ApiError::Unprocessable(err.to_string()),
            StoreError::Database(err) => ApiError::internal(err, "Database operation failed"),
        }
    }
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::InvalidJson(_) | ImportError::NotAnObject => {
                ApiError::BadRequest(err.to_string())
            }
            ImportError::PayloadTooLarge { .. } => ApiError::PayloadTooLarge(err.to_string()),
            ImportError::DocumentNotFound(_) => ApiError::NotFound(err.to_string()),
            ImportError::Store(err) => ApiError::internal(err, "Failed to import JSON"),
        }
    }
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::InvalidJson(_) | AnalysisError::NotAnObject => {
                ApiError::BadRequest(err.to_string())
            }
            AnalysisError::Store(err) => err.into(),
        }
    }
}

impl From<AttemptError> for ApiError {
    fn from(err: AttemptError) -> Self {
        match err {
            AttemptError::QuizNotFound(_)
            | AttemptError::PaperNotFound(_)
            | AttemptError::UserNotFound(_) => ApiError::NotFound(err.to_string()),
            AttemptError::UnknownQuestion(_)
            | AttemptError::DuplicateAnswer(_)
            | AttemptError::OptionNotOffered { .. }
            | AttemptError::Score(_) => ApiError::Unprocessable(err.to_string()),
            AttemptError::Store(err) => ApiError::internal(err, "Failed to grade answers"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_client_statuses() {
        let conflict: ApiError = StoreError::DuplicateEmail("a@b.c".into()).into();
        assert_eq!(conflict.status(), StatusCode::CONFLICT);

        let missing: ApiError = StoreError::MissingParent("user").into();
        assert_eq!(missing.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn oversized_import_is_413() {
        let err: ApiError = ImportError::PayloadTooLarge { size: 10, limit: 5 }.into();
        assert_eq!(err.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
