//! API error type that maps [`RelayError`] variants to HTTP responses.
//!
//! Callers only ever see two shapes: `401 Unauthorized` for a bad API key and
//! a generic `502` for everything that went wrong further along. The detail
//! stays in the logs.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use leadrelay_types::RelayError;
use serde_json::json;

pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized";
pub const RELAY_FAILURE_MESSAGE: &str = "Failed to process the request";

/// Wrapper around [`RelayError`] that implements [`IntoResponse`].
#[derive(Debug)]
pub struct ApiError(pub RelayError);

impl ApiError {
    fn classify(&self) -> (StatusCode, &'static str) {
        match &self.0 {
            RelayError::Unauthorized => (StatusCode::UNAUTHORIZED, UNAUTHORIZED_MESSAGE),
            _ => (StatusCode::BAD_GATEWAY, RELAY_FAILURE_MESSAGE),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.classify();
        if status == StatusCode::BAD_GATEWAY {
            tracing::warn!(error = %self.0, "lead relay failed");
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<RelayError> for ApiError {
    fn from(e: RelayError) -> Self {
        Self(e)
    }
}
