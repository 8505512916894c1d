//! The `POST /leads` handler.

use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use leadrelay_auth::API_KEY_HEADER;
use leadrelay_types::{LeadPayload, RelayError};
use std::sync::Arc;

use crate::{AppState, error::ApiError};

/// Handles `POST /leads`.
///
/// Checks the caller's `x-api-key`, resolves a bearer token through the cache,
/// and relays the body unmodified to the lead API. A 401 from the lead API
/// evicts the token so the next request re-authenticates.
///
/// # Errors
///
/// Returns [`ApiError`] wrapping [`RelayError::Unauthorized`] for a bad key,
/// or whatever failed further along (rendered as a generic 502).
pub async fn submit_lead(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let provided = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());
    if !state.guard.authorize(provided) {
        tracing::info!(key_present = provided.is_some(), "lead submission rejected");
        return Err(RelayError::Unauthorized.into());
    }

    let token = state.tokens.get_token().await?;

    tracing::debug!(bytes = body.len(), "forwarding lead");
    match state.leads.forward(&token, LeadPayload::from(body)).await {
        Ok(resp) => {
            tracing::info!(status = resp.status.as_u16(), "lead forwarded");
            Ok(resp.into_response())
        }
        Err(e) => {
            if e.invalidates_token() {
                let evicted = state.tokens.reject(&token).await;
                tracing::warn!(evicted, "lead api rejected bearer token");
            }
            Err(e.into())
        }
    }
}
