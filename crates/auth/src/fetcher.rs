//! Resource-owner password grant against the identity provider.
//!
//! One form-encoded POST per call, no retries; the cache decides when to call.
use async_trait::async_trait;
use leadrelay_config::Credentials;
use leadrelay_types::{FetchedToken, RelayError, TokenFetcher, traits::Result};
use secrecy::ExposeSecret as _;

/// Builds the form body of the credential exchange.
#[must_use]
pub fn build_token_params(credentials: &Credentials) -> [(&'static str, &str); 5] {
    [
        ("grant_type", credentials.grant_type.as_str()),
        ("client_id", credentials.client_id.as_str()),
        ("client_secret", credentials.client_secret.expose_secret()),
        ("username", credentials.username.as_str()),
        ("password", credentials.password.expose_secret()),
    ]
}

/// # Errors
///
/// Returns [`RelayError::UpstreamAuth`] if the body is not JSON, or lacks a
/// non-empty `access_token` or a numeric `expires_in`.
pub fn parse_token_response(body: &[u8]) -> Result<FetchedToken> {
    let token: FetchedToken = serde_json::from_slice(body)
        .map_err(|e| RelayError::UpstreamAuth(format!("malformed token response: {e}")))?;
    if token.access_token.is_empty() {
        return Err(RelayError::UpstreamAuth("empty access_token".into()));
    }
    Ok(token)
}

/// [`TokenFetcher`] that exchanges username/password credentials for a token.
pub struct PasswordGrantFetcher {
    http: reqwest::Client,
    token_url: String,
    credentials: Credentials,
}

impl PasswordGrantFetcher {
    /// The client's configured timeout also bounds the exchange.
    #[must_use]
    pub fn new(http: reqwest::Client, token_url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            http,
            token_url: token_url.into(),
            credentials,
        }
    }
}

#[async_trait]
impl TokenFetcher for PasswordGrantFetcher {
    async fn fetch(&self) -> Result<FetchedToken> {
        let resp = self
            .http
            .post(&self.token_url)
            .form(&build_token_params(&self.credentials))
            .send()
            .await
            .map_err(|e| RelayError::UpstreamAuth(format!("token request failed: {e}")))?;

        let status = resp.status();
        let body = resp
            .bytes()
            .await
            .map_err(|e| RelayError::UpstreamAuth(format!("reading token response: {e}")))?;

        if !status.is_success() {
            tracing::warn!(
                status = status.as_u16(),
                body_len = body.len(),
                "token endpoint refused credential exchange"
            );
            return Err(RelayError::UpstreamAuth(format!(
                "token endpoint returned {status}"
            )));
        }

        parse_token_response(&body)
    }
}
