//! Shared HTTP error type for the Relief API.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use relief_geocode::GeocodeError;
use relief_identity::AuthError;
use relief_records::RecordError;
use thiserror::Error;

use crate::service::ServiceError;

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("upstream failure: {0}")]
    BadGateway(String),
    #[error("upstream timeout: {0}")]
    GatewayTimeout(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            ApiError::GatewayTimeout(msg) => (StatusCode::GATEWAY_TIMEOUT, msg),
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::MissingCredential => ApiError::Unauthorized(e.to_string()),
            AuthError::UnknownIdentity => ApiError::Forbidden(e.to_string()),
        }
    }
}

impl From<RecordError> for ApiError {
    fn from(e: RecordError) -> Self {
        match e {
            RecordError::Forbidden(_) => ApiError::Forbidden(e.to_string()),
            RecordError::NotFound { .. } => ApiError::NotFound(e.to_string()),
            RecordError::MissingField(_) => ApiError::BadRequest(e.to_string()),
            RecordError::Store(_) | RecordError::Json(_) => {
                ApiError::InternalServerError(e.to_string())
            }
        }
    }
}

/// Geocoding failures as seen by disaster creation: an unresolvable
/// description is the caller's problem.
impl From<GeocodeError> for ApiError {
    fn from(e: GeocodeError) -> Self {
        match e {
            GeocodeError::NoLocationExtracted | GeocodeError::LocationNotResolvable(_) => {
                ApiError::BadRequest(e.to_string())
            }
            GeocodeError::Timeout => ApiError::GatewayTimeout(e.to_string()),
            GeocodeError::Upstream(_) => ApiError::BadGateway(e.to_string()),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Record(e) => e.into(),
            ServiceError::Geocode(e) => e.into(),
            ServiceError::Pool(_) | ServiceError::Task(_) => {
                tracing::error!(error = %e, "request failed");
                ApiError::InternalServerError(e.to_string())
            }
        }
    }
}

/// Malformed or unknown-field bodies are a 400, never axum's default 422.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
