/// Error handling for the API server
///
/// Every handler returns `ApiResult<T>`. Errors render as
///
/// ```json
/// { "success": false, "error": { "code": "PROJECT_NOT_FOUND", "message": "Project not found" } }
/// ```
///
/// with `details` added for request validation failures. Internal failures
/// are logged in full and reach the client only as a generic message.
///
/// # Example
///
/// ```
/// use workboard_api::error::ApiResult;
/// use axum::Json;
/// use serde_json::{json, Value};
///
/// async fn handler() -> ApiResult<Json<Value>> {
///     Ok(Json(json!({ "ok": true })))
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use validator::ValidationErrors;
use workboard_shared::services::ServiceError;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed body, query or path (400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Field-level validation failures (400)
    #[error("Validation failed: {} errors", .0.len())]
    ValidationError(Vec<ValidationErrorDetail>),

    /// No route matched (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// A use case refused the request
    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorBody,
}

/// HTTP status for a service failure
pub fn service_status(err: &ServiceError) -> StatusCode {
    match err {
        ServiceError::Validation(_)
        | ServiceError::InvalidStatusTransition { .. }
        | ServiceError::InvalidAssignee => StatusCode::BAD_REQUEST,
        ServiceError::InvalidCredentials | ServiceError::InvalidToken => StatusCode::UNAUTHORIZED,
        ServiceError::AccessDenied | ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
        ServiceError::NotFound(_) | ServiceError::TagNotAttached => StatusCode::NOT_FOUND,
        ServiceError::InvitationAlreadyUsed
        | ServiceError::AlreadyMember
        | ServiceError::UserAlreadyExists
        | ServiceError::Conflict(_) => StatusCode::CONFLICT,
        ServiceError::InvitationExpired => StatusCode::GONE,
        ServiceError::HealthCheck(_) | ServiceError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Service(err) => service_status(err),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) | ApiError::ValidationError(_) => "VALIDATION_ERROR",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Service(err) => err.code(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let (message, details) = match self {
            ApiError::BadRequest(msg) => (msg, None),
            ApiError::ValidationError(errors) => {
                ("Request validation failed".to_string(), Some(errors))
            }
            ApiError::NotFound(msg) => (msg, None),
            ApiError::Service(ServiceError::Internal(detail)) => {
                // Log internal errors but don't expose details to clients
                tracing::error!(error = %detail, "Internal error");
                ("An internal error occurred".to_string(), None)
            }
            ApiError::Service(ServiceError::HealthCheck(detail)) => {
                tracing::error!(error = %detail, "Health check failed");
                ("Health check failed".to_string(), None)
            }
            ApiError::Service(err) => (err.to_string(), None),
        };

        let body = Json(ErrorResponse {
            success: false,
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        });

        (status, body).into_response()
    }
}

/// Flattens validator output into `{field, message}` pairs, sorted by field
pub fn validation_details(errors: &ValidationErrors, prefix: &str) -> Vec<ValidationErrorDetail> {
    let mut details: Vec<ValidationErrorDetail> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| ValidationErrorDetail {
                field: format!("{}{}", prefix, field),
                message: error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value ({})", error.code)),
            })
        })
        .collect();

    details.sort_by(|a, b| a.field.cmp(&b.field));
    details
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::ValidationError(validation_details(&errors, ""))
    }
}
