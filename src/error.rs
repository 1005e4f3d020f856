//! Error types for the relay
//!
//! Every failure a request can hit is a `RelayError`. The `ResponseError`
//! impl turns it into a JSON body of the form `{ "error": ..., "details": ... }`.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    /// No usable prompt in the request, or the body could not be decoded
    #[error("{0}")]
    InvalidInput(String),

    /// No backend credential is configured
    #[error("AI backend is not configured")]
    BackendUnconfigured,

    /// Backend answered but carried no text
    #[error("No text from AI")]
    BackendEmptyResponse { details: Value },

    /// Backend answered with a non-success status
    #[error("AI backend returned status {status}")]
    BackendRejected { status: u16, details: Value },

    #[error("AI backend did not respond within {0} seconds")]
    BackendTimeout(u64),

    /// Network failure or unreadable body
    #[error("AI backend call failed: {0}")]
    BackendCallFailure(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ResponseError for RelayError {
    fn status_code(&self) -> StatusCode {
        match self {
            RelayError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            RelayError::BackendUnconfigured => StatusCode::SERVICE_UNAVAILABLE,
            RelayError::BackendEmptyResponse { .. } => StatusCode::BAD_GATEWAY,
            RelayError::BackendRejected { .. } => StatusCode::BAD_GATEWAY,
            RelayError::BackendTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            RelayError::BackendCallFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RelayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            RelayError::BackendEmptyResponse { details }
            | RelayError::BackendRejected { details, .. } => json!({
                "error": self.to_string(),
                "details": details,
            }),
            RelayError::BackendCallFailure(message) => json!({
                "error": "Internal Server Error",
                "details": message,
            }),
            RelayError::Internal(err) => json!({
                "error": "Internal Server Error",
                "details": err.to_string(),
            }),
            _ => json!({ "error": self.to_string() }),
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}
