//! Outbound call to the lead-intake API.

use axum::{
    http::{HeaderMap, HeaderValue, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use leadrelay_types::{LeadPayload, RelayError, traits::Result};

/// A successful lead API response, relayed to the caller as-is.
#[derive(Debug)]
pub struct DownstreamResponse {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    pub body: Bytes,
}

impl IntoResponse for DownstreamResponse {
    fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();
        if let Some(content_type) = self.content_type {
            headers.insert(CONTENT_TYPE, content_type);
        }
        (self.status, headers, self.body).into_response()
    }
}

/// Posts lead payloads to the configured lead endpoint.
#[derive(Clone)]
pub struct LeadClient {
    http: reqwest::Client,
    lead_url: String,
}

impl LeadClient {
    #[must_use]
    pub fn new(http: reqwest::Client, lead_url: impl Into<String>) -> Self {
        Self {
            http,
            lead_url: lead_url.into(),
        }
    }

    /// Sends `payload` unmodified with the bearer token attached.
    ///
    /// # Errors
    ///
    /// - [`RelayError::DownstreamRejected`] on HTTP 401.
    /// - [`RelayError::Downstream`] on any other non-2xx status.
    /// - [`RelayError::Http`] on transport failure or timeout.
    pub async fn forward(&self, token: &str, payload: LeadPayload) -> Result<DownstreamResponse> {
        let resp = self
            .http
            .post(&self.lead_url)
            .bearer_auth(token)
            .header(CONTENT_TYPE, "application/json")
            .body(payload.into_bytes())
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = match resp.text().await {
                Ok(body) => body,
                Err(e) => {
                    tracing::debug!(
                        status = status.as_u16(),
                        error = %e,
                        "cannot read lead api error body"
                    );
                    String::new()
                }
            };
            return Err(RelayError::from_downstream_status(status.as_u16(), body));
        }

        let content_type = resp.headers().get(CONTENT_TYPE).cloned();
        let body = resp.bytes().await?;
        Ok(DownstreamResponse {
            status,
            content_type,
            body,
        })
    }
}
