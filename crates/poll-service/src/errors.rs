//! Poll service error types.
//!
//! Every failure kind maps to a distinct, stable `code` in the JSON error
//! body so clients can tell "you already voted" apart from "this poll no
//! longer accepts votes" and "this room doesn't exist". Storage errors are
//! logged server-side and returned to clients as a generic message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Poll service error type.
///
/// Maps to HTTP status codes:
/// - InvalidFormat, BadRequest: 400 Bad Request
/// - Unauthenticated: 401 Unauthorized
/// - NotFound: 404 Not Found
/// - AlreadyVoted: 409 Conflict
/// - PollClosed: 410 Gone
/// - Database, Internal: 500 Internal Server Error
#[derive(Debug, Error)]
pub enum PollError {
    /// A room name or identifier does not conform to a recognized pattern.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// No meeting, poll or option resolves for the given identifiers.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The participant already has a vote recorded on this poll.
    #[error("Already voted")]
    AlreadyVoted,

    /// The poll no longer accepts votes.
    #[error("Poll is closed")]
    PollClosed,

    /// Underlying persistence failure not otherwise classified.
    #[error("Database error: {0}")]
    Database(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Internal server error")]
    Internal,
}

impl PollError {
    /// Returns the HTTP status code for this error (for metrics recording).
    pub fn status_code(&self) -> u16 {
        self.http_status().as_u16()
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            PollError::InvalidFormat(_) => "INVALID_FORMAT",
            PollError::NotFound(_) => "NOT_FOUND",
            PollError::AlreadyVoted => "ALREADY_VOTED",
            PollError::PollClosed => "POLL_CLOSED",
            PollError::Database(_) => "DATABASE_ERROR",
            PollError::BadRequest(_) => "BAD_REQUEST",
            PollError::Unauthenticated(_) => "UNAUTHENTICATED",
            PollError::Internal => "INTERNAL_ERROR",
        }
    }

    fn http_status(&self) -> StatusCode {
        match self {
            PollError::InvalidFormat(_) | PollError::BadRequest(_) => StatusCode::BAD_REQUEST,
            PollError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            PollError::NotFound(_) => StatusCode::NOT_FOUND,
            PollError::AlreadyVoted => StatusCode::CONFLICT,
            PollError::PollClosed => StatusCode::GONE,
            PollError::Database(_) | PollError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for PollError {
    fn into_response(self) -> Response {
        let message = match &self {
            PollError::Database(err) => {
                // Log actual error server-side, return generic message to client
                tracing::error!(target: "poll.database", error = %err, "Database operation failed");
                "An internal database error occurred".to_string()
            }
            PollError::InvalidFormat(reason)
            | PollError::NotFound(reason)
            | PollError::BadRequest(reason)
            | PollError::Unauthenticated(reason) => reason.clone(),
            PollError::AlreadyVoted => "You have already voted on this poll".to_string(),
            PollError::PollClosed => "This poll is no longer accepting votes".to_string(),
            PollError::Internal => "An internal error occurred".to_string(),
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: self.code().to_string(),
                message,
            },
        };

        (self.http_status(), Json(error_response)).into_response()
    }
}

/// Convert sqlx errors to PollError.
///
/// Constraint violations that carry domain meaning are classified at the
/// repository call site before this conversion applies.
impl From<sqlx::Error> for PollError {
    fn from(err: sqlx::Error) -> Self {
        PollError::Database(err.to_string())
    }
}
