//! Error boundary for the Bookshelf HTTP layer

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Body returned for every failure that is not the caller's fault.
pub const INTERNAL_ERROR_MESSAGE: &str = "Something happening. Bad luck.";

/// Standard error response format for all HTTP errors
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<serde_json::Value>,
}

/// Application error types that map to HTTP responses
#[derive(Error, Debug)]
pub enum AppError {
    #[error("validation error: {message}")]
    Validation {
        details: Vec<serde_json::Value>,
        message: String,
    },

    #[error("not found: {message}")]
    NotFound { message: String },

    #[error("bad request: {message}")]
    BadRequest { message: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Create a validation error
    pub fn validation(details: Vec<serde_json::Value>, message: impl Into<String>) -> Self {
        Self::Validation {
            details,
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::validation(
            vec![serde_json::Value::String(rejection.body_text())],
            "Request body is not valid.",
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            AppError::Validation { details, message } => {
                tracing::warn!(status_code = %status.as_u16(), %message, "request rejected");
                ErrorBody { message, details }
            }
            AppError::NotFound { message } | AppError::BadRequest { message } => {
                tracing::debug!(status_code = %status.as_u16(), %message, "request rejected");
                ErrorBody {
                    message,
                    details: Vec::new(),
                }
            }
            AppError::Internal(e) => {
                // The cause stays in the logs; callers only see the generic message.
                let error_id = Uuid::new_v4();
                tracing::error!(
                    error_id = %error_id,
                    status_code = %status.as_u16(),
                    error = ?e,
                    "request failed"
                );
                ErrorBody {
                    message: INTERNAL_ERROR_MESSAGE.to_string(),
                    details: Vec::new(),
                }
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_validation_error() {
        let details = vec![json!({"field": "year", "error": "expected integer"})];
        let error = AppError::validation(details.clone(), "Validation failed");

        match error {
            AppError::Validation {
                details: d,
                message,
            } => {
                assert_eq!(d, details);
                assert_eq!(message, "Validation failed");
            }
            _ => panic!("Expected Validation error"),
        }
    }

    #[tokio::test]
    async fn test_not_found_body_is_message_only() {
        let response = AppError::not_found("Book not found.").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await, json!({"message": "Book not found."}));
    }

    #[tokio::test]
    async fn test_internal_error_hides_cause() {
        let internal_error = anyhow::anyhow!("Database connection failed");
        let response = AppError::Internal(internal_error).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({"message": "Something happening. Bad luck."})
        );
    }

    #[tokio::test]
    async fn test_validation_body_carries_details() {
        let response =
            AppError::validation(vec![json!("year: invalid type")], "Request body is not valid.")
                .into_response();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            body_json(response).await,
            json!({"message": "Request body is not valid.", "details": ["year: invalid type"]})
        );
    }

    #[test]
    fn test_bad_request_status() {
        assert_eq!(
            AppError::bad_request("cannot sort by 'isbn'").status(),
            StatusCode::BAD_REQUEST
        );
    }
}
