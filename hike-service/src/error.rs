use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::validation::ValidationError;

pub const MISSING_TOKEN_MESSAGE: &str = "reCAPTCHA validation failed. Please try again.";
pub const REJECTED_MESSAGE: &str = "reCAPTCHA check failed. You might be a bot.";
pub const VERIFY_UNAVAILABLE_MESSAGE: &str =
    "An internal error occurred during reCAPTCHA verification.";
pub const STORE_FAILURE_MESSAGE: &str = "Could not store data. Please try again later.";
pub const RATE_LIMITED_MESSAGE: &str = "Too many submissions. Please try again later.";

/// Caller-facing failure. Messages are always safe to return verbatim.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubmitError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Internal(String),

    #[error("{0}")]
    ResourceExhausted(String),
}

impl SubmitError {
    pub fn kind(&self) -> &'static str {
        match self {
            SubmitError::InvalidArgument(_) => "invalid-argument",
            SubmitError::Unauthenticated(_) => "unauthenticated",
            SubmitError::Internal(_) => "internal",
            SubmitError::ResourceExhausted(_) => "resource-exhausted",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            SubmitError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            SubmitError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            SubmitError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            SubmitError::ResourceExhausted(_) => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl From<ValidationError> for SubmitError {
    fn from(e: ValidationError) -> Self {
        SubmitError::InvalidArgument(e.to_string())
    }
}

impl IntoResponse for SubmitError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": {
                "kind": self.kind(),
                "message": self.to_string(),
            }
        });

        (self.status(), Json(body)).into_response()
    }
}
