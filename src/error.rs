//! Error types for both ends of the link.
//!
//! - [`StreamError`] is returned to callers of the client stream.
//! - [`UpdateError`] describes a rejected field in an incoming update.
//! - [`ServerError`] is the HTTP-facing error with status code mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Errors surfaced to callers of [`crate::client::ResilientStream::send`].
///
/// Transport failures are never reported here; the stream recovers from
/// them on its own.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// The outgoing payload could not be serialized.
    #[error("error serializing payload: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The connection writer went away between the state check and the
    /// write.
    #[error("transport for {endpoint} is gone")]
    TransportGone {
        /// Endpoint the stream is bound to.
        endpoint: crate::domain::Endpoint,
    },
}

/// Reasons an incoming update (or one of its fields) is rejected.
#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    /// The frame is not valid JSON.
    #[error("malformed JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The frame is JSON but not an object.
    #[error("expected a JSON object")]
    NotAnObject,

    /// A field is present with the wrong type.
    #[error("field `{field}` must be {expected}")]
    InvalidField {
        /// Name of the offending field.
        field: &'static str,
        /// Human-readable expected type.
        expected: &'static str,
    },
}

/// Structured JSON error response body.
///
/// ```json
/// { "error": { "code": 2001, "message": "unknown endpoint: velocity" } }
/// ```
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
}

/// Server-side error enum with HTTP status code mapping.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// No endpoint with the given name exists.
    #[error("unknown endpoint: {0}")]
    UnknownEndpoint(String),
}

impl ServerError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::UnknownEndpoint(_) => 2001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::UnknownEndpoint(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
