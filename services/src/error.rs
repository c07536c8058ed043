//! Service-level errors and their HTTP mapping.

use crate::api::types::ErrorResponse;
use crate::database::SqlStorageError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Errors surfaced by the post, tag and association services.
///
/// Each variant maps to exactly one status code; the kinds are never merged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: i32 },

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Internal(SqlStorageError),
}

impl ServiceError {
    pub fn post_not_found(id: i32) -> Self {
        Self::NotFound { entity: "post", id }
    }

    pub fn tag_not_found(id: i32) -> Self {
        Self::NotFound { entity: "tag", id }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Storage failures are internal by default. Callers that expect a specific
/// constraint violation (duplicate tag labels) translate it before this runs.
impl From<SqlStorageError> for ServiceError {
    fn from(err: SqlStorageError) -> Self {
        ServiceError::Internal(err)
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            ServiceError::Internal(err) => {
                tracing::error!("Storage failure: {:?}", err);
                // Database details stay in the logs
                "internal server error".to_owned()
            }
            other => {
                tracing::warn!(status = status.as_u16(), "{}", other);
                other.to_string()
            }
        };

        (status, Json(ErrorResponse::new(status, message))).into_response()
    }
}
