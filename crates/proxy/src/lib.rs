//! HTTP layer: axum router, the lead handler and error mapping.
//!
//! Exposes a single `POST /leads` endpoint that relays the request body to
//! the lead-intake API behind a cached OAuth2 bearer token.

mod error;
mod forward;
mod leads;

pub use error::{ApiError, RELAY_FAILURE_MESSAGE, UNAUTHORIZED_MESSAGE};
pub use forward::{DownstreamResponse, LeadClient};

use axum::{Router, routing::post};
use leadrelay_auth::{ApiKeyGuard, PasswordGrantFetcher, TokenCache};
use leadrelay_config::Config;
use leadrelay_types::{RelayError, SystemClock};
use std::{sync::Arc, time::Duration};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state passed to the route handler.
pub struct AppState {
    /// Checks the caller's static API key.
    pub guard: ApiKeyGuard,
    /// The one bearer token shared by every request.
    pub tokens: Arc<TokenCache>,
    /// Client for the lead-intake API.
    pub leads: LeadClient,
}

impl AppState {
    /// Creates a new shared application state wrapped in an `Arc`.
    pub fn new(guard: ApiKeyGuard, tokens: Arc<TokenCache>, leads: LeadClient) -> Arc<Self> {
        Arc::new(Self {
            guard,
            tokens,
            leads,
        })
    }

    /// Wires the production components from a loaded [`Config`].
    ///
    /// `http` is shared by the token exchange and the lead forward.
    pub fn from_config(config: Config, http: reqwest::Client) -> Arc<Self> {
        let Config {
            api_key,
            prospect,
            token_refresh_margin,
            ..
        } = config;

        let fetcher = PasswordGrantFetcher::new(http.clone(), prospect.token_url, prospect.credentials);
        let tokens = Arc::new(TokenCache::new(
            Arc::new(fetcher),
            Arc::new(SystemClock),
            token_refresh_margin,
        ));
        Self::new(
            ApiKeyGuard::new(api_key),
            tokens,
            LeadClient::new(http, prospect.lead_url),
        )
    }
}

/// Build the outbound HTTP client; `timeout` bounds each whole request.
///
/// # Errors
///
/// Returns [`RelayError::Config`] if the TLS backend cannot be initialised.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, RelayError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| RelayError::Config(format!("cannot build http client: {e}")))
}

/// Build the full axum router.
///
/// Routes:
/// - POST /leads
///
/// CORS mirrors the caller's origin and allows credentials. Every request is
/// logged at INFO once its response is ready.
pub fn make_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/leads", post(leads::submit_lead))
        .with_state(state)
        .layer(CorsLayer::very_permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}
