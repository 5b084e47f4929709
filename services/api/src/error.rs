//! Custom error types for the API service

use auth::{HashError, SessionError, ValidationError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::repositories::StoreError;

/// Classification of a [`ServiceError`], stable across backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Unauthenticated,
    Unauthorized,
    NotFound,
    Conflict,
    Internal,
}

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Malformed or incomplete input
    #[error("{0}")]
    Validation(String),

    /// Missing, unknown or expired session
    #[error("Unauthenticated")]
    Unauthenticated,

    /// Caller lacks the access the operation needs
    #[error("Unauthorized")]
    Unauthorized,

    /// A referenced row does not exist
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The target is in the wrong state or the name is taken
    #[error("{0}")]
    Conflict(String),

    /// Storage, cache or runtime failure; the detail is never returned
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Validation(_) => ErrorKind::Validation,
            ServiceError::Unauthenticated => ErrorKind::Unauthenticated,
            ServiceError::Unauthorized => ErrorKind::Unauthorized,
            ServiceError::NotFound(_) => ErrorKind::NotFound,
            ServiceError::Conflict(_) => ErrorKind::Conflict,
            ServiceError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Message safe to send to the caller
    pub fn public_message(&self) -> String {
        match self {
            ServiceError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorKind::Unauthorized => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        ServiceError::Internal(err.to_string())
    }
}

impl From<SessionError> for ServiceError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Unauthenticated => ServiceError::Unauthenticated,
            other => ServiceError::Internal(other.to_string()),
        }
    }
}

impl From<HashError> for ServiceError {
    fn from(err: HashError) -> Self {
        ServiceError::Internal(err.to_string())
    }
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::Validation(err.to_string())
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        if let ServiceError::Internal(detail) = &self {
            error!("Request failed: {}", detail);
        }

        let body = Json(json!({
            "error": self.public_message(),
        }));

        (self.status_code(), body).into_response()
    }
}

/// Type alias for service results
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use common::error::CacheError;

    #[test]
    fn test_internal_detail_is_not_public() {
        let err = ServiceError::from(StoreError::UniqueViolation("users_pkey".to_string()));
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.public_message(), "Internal server error");
        assert!(err.to_string().contains("users_pkey"));
    }

    #[test]
    fn test_session_errors_split_by_kind() {
        assert_eq!(
            ServiceError::from(SessionError::Unauthenticated).kind(),
            ErrorKind::Unauthenticated
        );
        let cache = SessionError::CacheRead(CacheError::UnexpectedReply("boom".to_string()));
        assert_eq!(ServiceError::from(cache).kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ServiceError::Validation("name: name is required".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::Unauthenticated.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ServiceError::Unauthorized.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ServiceError::NotFound("list").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ServiceError::Conflict("list is deleted".to_string()).status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_validation_message_names_the_field() {
        let err = ServiceError::from(ValidationError::new("email", "Invalid email format"));
        assert_eq!(err.public_message(), "email: Invalid email format");
    }
}
