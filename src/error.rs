// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::auth::AuthError;
use crate::database::record::RecordError;
use crate::editor::UploadError;
use crate::section::SectionError;
use crate::shell::ShellError;
use crate::store::StoreError;
use crate::team::TeamError;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError {
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 413 Payload Too Large
    PayloadTooLarge(String),

    // 415 Unsupported Media Type
    UnsupportedMediaType(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 502 Bad Gateway (backend rejected or failed the operation)
    BadGateway(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::ValidationError { .. } => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::PayloadTooLarge(_) => 413,
            ApiError::UnsupportedMediaType(_) => 415,
            ApiError::InternalServerError(_) => 500,
            ApiError::BadGateway(_) => 502,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::ValidationError { message, .. } => message,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::PayloadTooLarge(msg) => msg,
            ApiError::UnsupportedMediaType(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::BadGateway(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        let mut response = json!({
            "success": false,
            "error": self.message(),
            "code": self.error_code()
        });

        if let ApiError::ValidationError { field_errors: Some(field_errors), .. } = self {
            response["field_errors"] = json!(field_errors);
        }

        response
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            ApiError::UnsupportedMediaType(_) => "UNSUPPORTED_MEDIA_TYPE",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::BadGateway(_) => "BAD_GATEWAY",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation_error(message: impl Into<String>, field_errors: Option<HashMap<String, String>>) -> Self {
        ApiError::ValidationError { message: message.into(), field_errors }
    }

    /// Validation failure attributed to one field
    pub fn field_error(field: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut field_errors = HashMap::new();
        field_errors.insert(field.into(), message.clone());
        ApiError::validation_error(message, Some(field_errors))
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        ApiError::BadGateway(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

// Convert layer errors to ApiError
impl From<RecordError> for ApiError {
    fn from(err: RecordError) -> Self {
        match &err {
            RecordError::InvalidJson(_) | RecordError::UnknownField(_) | RecordError::NotTextField(_) => {
                ApiError::bad_request(err.user_message())
            }
            RecordError::Shape(_) => ApiError::validation_error(err.user_message(), None),
            _ => match err.field() {
                Some(field) => ApiError::field_error(field, err.user_message()),
                None => ApiError::validation_error(err.user_message(), None),
            },
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match &err {
            StoreError::ConstraintViolation { .. } => ApiError::conflict(err.user_message()),
            StoreError::InvalidIdentifier(_) => ApiError::bad_request(err.user_message()),
            StoreError::Connection(msg) => {
                tracing::error!("Backend connection error: {}", msg);
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            _ => {
                // Log the real error but return the user-facing text
                tracing::error!("Backend error: {}", err);
                ApiError::bad_gateway(err.user_message())
            }
        }
    }
}

impl From<SectionError> for ApiError {
    fn from(err: SectionError) -> Self {
        match err {
            SectionError::InvalidTransition { .. } => ApiError::conflict(err.user_message()),
            SectionError::RecordNotFound(_) => ApiError::not_found(err.user_message()),
            SectionError::UnknownFilter(_) => ApiError::bad_request(err.user_message()),
            SectionError::Validation(e) => e.into(),
            SectionError::Store(e) => e.into(),
        }
    }
}

impl From<TeamError> for ApiError {
    fn from(err: TeamError) -> Self {
        match err {
            TeamError::InvalidEmail(_) => ApiError::field_error("email", err.user_message()),
            TeamError::UserNotFound(_) | TeamError::MemberNotFound(_) => ApiError::not_found(err.user_message()),
            TeamError::DuplicateMember => ApiError::conflict(err.user_message()),
            TeamError::Store(e) => e.into(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken | AuthError::InvalidToken(_) | AuthError::Expired | AuthError::NotSignedIn => {
                ApiError::unauthorized(err.user_message())
            }
            AuthError::MissingRole | AuthError::InsufficientRole(_) => ApiError::forbidden(err.user_message()),
            AuthError::NotConfigured => {
                tracing::error!("JWT secret not configured");
                ApiError::internal_server_error(err.user_message())
            }
            AuthError::Store(e) => e.into(),
        }
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::TooLarge { .. } => ApiError::PayloadTooLarge(err.user_message()),
            UploadError::UnsupportedType(_) => ApiError::UnsupportedMediaType(err.user_message()),
            UploadError::NotImageField(_) => ApiError::bad_request(err.user_message()),
            UploadError::Store(e) => e.into(),
        }
    }
}

impl From<ShellError> for ApiError {
    fn from(err: ShellError) -> Self {
        match err {
            ShellError::Auth(e) => e.into(),
            ShellError::UnknownTab(_) | ShellError::UnknownCollection(_) => ApiError::not_found(err.user_message()),
            ShellError::Forbidden(_) => ApiError::forbidden(err.user_message()),
            ShellError::NoTabSelected => ApiError::conflict(err.user_message()),
            ShellError::Section(e) => e.into(),
            ShellError::Team(e) => e.into(),
            ShellError::Store(e) => e.into(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_envelope_shape() {
        let err = ApiError::from(RecordError::MissingRequiredField("title".into()));
        assert_eq!(err.status_code(), 400);
        let body = err.to_json();
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["code"], json!("VALIDATION_ERROR"));
        assert!(body["field_errors"]["title"].is_string());
    }

    #[test]
    fn duplicate_member_is_a_conflict() {
        assert_eq!(ApiError::from(TeamError::DuplicateMember).status_code(), 409);
        let constraint = StoreError::constraint("admins", "duplicate key");
        assert_eq!(ApiError::from(constraint).status_code(), 409);
    }

    #[test]
    fn store_failures_map_to_gateway_errors() {
        assert_eq!(ApiError::from(StoreError::query("faqs", "boom")).status_code(), 502);
        assert_eq!(ApiError::from(StoreError::Connection("down".into())).status_code(), 503);
    }
}
