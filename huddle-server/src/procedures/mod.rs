//! Procedure layer: typed operations per entity, each scoped to the
//! authenticated user.
//!
//! Failure semantics: a mutation that matches zero rows (absent id, or a row
//! owned by someone else) surfaces as one structured NOT_FOUND — deliberately
//! indistinguishable, so callers cannot probe for other users' data.

pub mod agents;
pub mod meetings;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use huddle_core::schema::{FieldError, ValidationErrors};
use huddle_core::VideoError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    BadRequest,
    NotFound,
    VendorError,
    Internal,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::BadRequest => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::VendorError => StatusCode::BAD_GATEWAY,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Structured `{code, message}` error as seen by API clients.
#[derive(Debug, Serialize)]
pub struct ProcedureError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(rename = "fieldErrors", skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<Vec<FieldError>>,
}

impl ProcedureError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::NotFound,
            message: message.into(),
            field_errors: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::BadRequest,
            message: message.into(),
            field_errors: None,
        }
    }
}

impl From<ValidationErrors> for ProcedureError {
    fn from(errors: ValidationErrors) -> Self {
        Self {
            code: ErrorCode::BadRequest,
            message: errors.to_string(),
            field_errors: Some(errors.0),
        }
    }
}

impl From<sqlx::Error> for ProcedureError {
    fn from(e: sqlx::Error) -> Self {
        tracing::error!("Database error: {}", e);
        Self {
            code: ErrorCode::Internal,
            message: "Internal error".to_string(),
            field_errors: None,
        }
    }
}

impl From<VideoError> for ProcedureError {
    fn from(e: VideoError) -> Self {
        tracing::error!("Video vendor error: {}", e);
        Self {
            code: ErrorCode::VendorError,
            message: "Video service unavailable".to_string(),
            field_errors: None,
        }
    }
}

impl IntoResponse for ProcedureError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_map_to_bad_request_with_fields() {
        let errors = ValidationErrors(vec![FieldError {
            field: "name",
            message: "Name must be at least 3 characters".to_string(),
        }]);
        let err = ProcedureError::from(errors);
        assert_eq!(err.code, ErrorCode::BadRequest);
        assert_eq!(err.field_errors.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn error_codes_serialize_screaming_snake() {
        let err = ProcedureError::not_found("Meeting not found");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Meeting not found");
        assert!(json.get("fieldErrors").is_none());
    }

    #[test]
    fn status_mapping() {
        assert_eq!(ErrorCode::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::BadRequest.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::VendorError.status(), StatusCode::BAD_GATEWAY);
    }
}
