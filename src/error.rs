//! Error taxonomy for the moderation and search operations
//!
//! Every failure a caller can trigger maps to one variant here, and every
//! variant maps to one HTTP status and a stable machine-readable code.
//! Storage-level failures (redb, serde) are folded into `Storage` and
//! surface as 500s; nothing in this crate panics on a caller's behalf.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::model::EntryStatus;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No entry with the given id exists
    #[error("entry {0} not found")]
    NotFound(u64),

    /// The caller is neither the entry's owner nor an admin
    #[error("caller does not own this entry")]
    NotOwner,

    /// The operation requires the admin capability
    #[error("admin capability required")]
    Forbidden,

    /// A state-machine precondition was not met
    #[error("cannot {action} an entry in status '{from}'")]
    InvalidTransition {
        action: &'static str,
        from: EntryStatus,
    },

    /// Bad pagination or filter input
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Bad request body (missing/empty required fields)
    #[error("validation failed: {0}")]
    Validation(String),

    /// Underlying storage or serialization failure
    #[error("storage error: {0}")]
    Storage(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::NotOwner | ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::InvalidTransition { .. } => StatusCode::CONFLICT,
            ApiError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "not_found",
            ApiError::NotOwner => "not_owner",
            ApiError::Forbidden => "forbidden",
            ApiError::InvalidTransition { .. } => "invalid_transition",
            ApiError::InvalidQuery(_) => "invalid_query",
            ApiError::Validation(_) => "validation",
            ApiError::Storage(_) => "storage",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if matches!(self, ApiError::Storage(_)) {
            tracing::error!(error = %self, "storage failure");
        }
        (
            self.status(),
            Json(json!({
                "error": self.to_string(),
                "code": self.code(),
            })),
        )
            .into_response()
    }
}

impl From<redb::TransactionError> for ApiError {
    fn from(err: redb::TransactionError) -> Self {
        ApiError::Storage(err.to_string())
    }
}

impl From<redb::TableError> for ApiError {
    fn from(err: redb::TableError) -> Self {
        ApiError::Storage(err.to_string())
    }
}

impl From<redb::StorageError> for ApiError {
    fn from(err: redb::StorageError) -> Self {
        ApiError::Storage(err.to_string())
    }
}

impl From<redb::CommitError> for ApiError {
    fn from(err: redb::CommitError) -> Self {
        ApiError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Storage(err.to_string())
    }
}
