// HTTP API error types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::collections::HashMap;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    Validation {
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },
    /// Duplicate active rental request. Reported as 400, matching the wire
    /// contract the UI was built against (not 409).
    Conflict(String),

    // 401 Unauthorized
    Unauthenticated(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 500 Internal Server Error
    /// Payment processor / image store failure; the upstream's own message
    /// is safe to surface.
    Upstream(String),
    Internal(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Validation { .. } => 400,
            ApiError::Conflict(_) => 400,
            ApiError::Unauthenticated(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Upstream(_) => 500,
            ApiError::Internal(_) => 500,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::Validation { message, .. } => message,
            ApiError::Conflict(msg) => msg,
            ApiError::Unauthenticated(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Upstream(msg) => msg,
            ApiError::Internal(msg) => msg,
        }
    }

    /// Convert to the `{error: message}` JSON body every handler returns
    pub fn to_json(&self) -> Value {
        match self {
            ApiError::Validation {
                message,
                field_errors: Some(field_errors),
            } => {
                json!({
                    "error": message,
                    "fieldErrors": field_errors,
                })
            }
            _ => json!({ "error": self.message() }),
        }
    }
}

// Static constructor methods
impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation {
            message: message.into(),
            field_errors: None,
        }
    }

    pub fn validation_fields(
        message: impl Into<String>,
        field_errors: HashMap<String, String>,
    ) -> Self {
        ApiError::Validation {
            message: message.into(),
            field_errors: Some(field_errors),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        ApiError::Unauthenticated(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        ApiError::Upstream(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }
}

// Convert other error types to ApiError
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::not_found("Record not found"),
            other => {
                // Don't expose internal SQL errors to clients
                tracing::error!("Database error: {}", other);
                ApiError::internal("Internal server error")
            }
        }
    }
}

impl From<crate::auth::AuthError> for ApiError {
    fn from(err: crate::auth::AuthError) -> Self {
        tracing::error!("Auth error: {}", err);
        ApiError::internal("Authentication failed")
    }
}

impl From<bcrypt::BcryptError> for ApiError {
    fn from(err: bcrypt::BcryptError) -> Self {
        tracing::error!("Password hashing error: {}", err);
        ApiError::internal("Internal server error")
    }
}

impl From<crate::services::GatewayError> for ApiError {
    fn from(err: crate::services::GatewayError) -> Self {
        ApiError::upstream(err.to_string())
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(ApiError::validation("bad").status_code(), 400);
        assert_eq!(ApiError::conflict("dup").status_code(), 400);
        assert_eq!(ApiError::unauthenticated("no token").status_code(), 401);
        assert_eq!(ApiError::forbidden("wrong role").status_code(), 403);
        assert_eq!(ApiError::not_found("gone").status_code(), 404);
        assert_eq!(ApiError::upstream("processor down").status_code(), 500);
    }

    #[test]
    fn body_is_error_envelope() {
        let body = ApiError::not_found("Property not found").to_json();
        assert_eq!(body, json!({ "error": "Property not found" }));
    }

    #[test]
    fn field_errors_included_when_present() {
        let mut fields = HashMap::new();
        fields.insert("rent".to_string(), "Rent cannot be negative".to_string());
        let body = ApiError::validation_fields("Property validation failed", fields).to_json();
        assert_eq!(body["error"], "Property validation failed");
        assert_eq!(body["fieldErrors"]["rent"], "Rent cannot be negative");
    }

    #[test]
    fn row_not_found_maps_to_404() {
        let err: ApiError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.status_code(), 404);
    }
}
