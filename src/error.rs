//! Structured error type for API responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;
use std::fmt;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors
    MissingRequiredField,
    InvalidFieldValue,
    MalformedBody,

    // Authentication errors
    Unauthorized,
    InvalidCredentials,

    // Not found / conflict
    TaskNotFound,
    AlreadyExists,

    // Internal errors
    DatabaseError,
    InternalError,
}

impl ErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::MissingRequiredField
            | ErrorCode::InvalidFieldValue
            | ErrorCode::MalformedBody => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized | ErrorCode::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ErrorCode::TaskNotFound => StatusCode::NOT_FOUND,
            ErrorCode::AlreadyExists => StatusCode::CONFLICT,
            ErrorCode::DatabaseError | ErrorCode::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Structured error carried from the store up to the HTTP boundary.
#[derive(Debug)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    pub field: Option<String>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    // Convenience constructors

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingRequiredField,
            format!("{} required", field),
        )
        .with_field(field)
    }

    /// Both account fields are validated together and reported as one message.
    pub fn missing_credentials() -> Self {
        Self::new(
            ErrorCode::MissingRequiredField,
            "username and password required",
        )
    }

    pub fn invalid_value(field: &str, reason: &str) -> Self {
        Self::new(ErrorCode::InvalidFieldValue, reason).with_field(field)
    }

    pub fn malformed_body(reason: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::MalformedBody,
            format!("Invalid request body: {}", reason),
        )
    }

    /// Missing, malformed, expired or forged token. The message never says which.
    pub fn unauthorized() -> Self {
        Self::new(ErrorCode::Unauthorized, "Invalid token")
    }

    /// Unknown handle and wrong password share this error.
    pub fn invalid_credentials() -> Self {
        Self::new(ErrorCode::InvalidCredentials, "Invalid credentials")
    }

    /// Missing and foreign tasks share this error.
    pub fn task_not_found() -> Self {
        Self::new(ErrorCode::TaskNotFound, "Not found")
    }

    pub fn username_taken() -> Self {
        Self::new(ErrorCode::AlreadyExists, "Username already exists").with_field("username")
    }

    pub fn database(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::DatabaseError, err.to_string())
    }

    pub fn internal(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::InternalError, err.to_string())
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }

    /// Text returned to the caller. Server-side failures stay opaque.
    pub fn public_message(&self) -> &str {
        if self.status().is_server_error() {
            "Server error"
        } else {
            &self.message
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

// Allow using ? with anyhow errors by converting them
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<ApiError>() {
            Ok(api_err) => api_err,
            Err(err) => match err.downcast::<rusqlite::Error>() {
                Ok(sql_err) => ApiError::database(sql_err),
                Err(err) => ApiError::internal(err),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error_code = ?self.code, error = %self.message, "Request failed");
        } else {
            tracing::debug!(
                error_code = ?self.code,
                error = %self.message,
                field = ?self.field,
                status = status.as_u16(),
                "Request rejected"
            );
        }
        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}

/// Result type for API operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(ApiError::missing_field("text").status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::unauthorized().status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::invalid_credentials().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::task_not_found().status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::username_taken().status(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::database("disk I/O error").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn server_errors_are_opaque() {
        let err = ApiError::database("no such table: tasks");
        assert_eq!(err.public_message(), "Server error");

        let err = ApiError::missing_field("text");
        assert_eq!(err.public_message(), "text required");
    }

    #[test]
    fn field_names_the_offending_input() {
        assert_eq!(ApiError::missing_field("text").field.as_deref(), Some("text"));
        assert_eq!(ApiError::username_taken().field.as_deref(), Some("username"));
        assert_eq!(ApiError::unauthorized().field, None);
    }

    #[test]
    fn anyhow_roundtrip_keeps_code() {
        let err: anyhow::Error = ApiError::task_not_found().into();
        let back = ApiError::from(err);
        assert_eq!(back.code, ErrorCode::TaskNotFound);

        let err = anyhow::anyhow!("something broke");
        assert_eq!(ApiError::from(err).code, ErrorCode::InternalError);
    }
}
