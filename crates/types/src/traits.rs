//! Async traits shared across all leadrelay crates.
//!
//! Cross-crate seams live here so that the cache can be driven by a fake
//! fetcher and a manual clock in tests.

use crate::{FetchedToken, RelayError};
use async_trait::async_trait;

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, RelayError>;

/// Exchanges configured credentials for a fresh bearer token.
#[async_trait]
pub trait TokenFetcher: Send + Sync {
    /// Perform exactly one credential exchange.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::UpstreamAuth`] if the identity provider cannot
    /// be reached, refuses the exchange, or returns a malformed body.
    async fn fetch(&self) -> Result<FetchedToken>;
}

/// Wall-clock source in whole seconds since the Unix epoch.
pub trait Clock: Send + Sync {
    fn now_secs(&self) -> u64;
}
