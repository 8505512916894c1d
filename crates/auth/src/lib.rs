//! Credentials on both sides of the relay.
//!
//! Inbound, [`ApiKeyGuard`] checks the caller's static key. Outbound,
//! [`PasswordGrantFetcher`] exchanges the configured credentials for a bearer
//! token and [`TokenCache`] keeps that token until it nears expiry or the lead
//! API rejects it.

pub mod cache;
pub mod fetcher;
pub mod guard;

pub use cache::TokenCache;
pub use fetcher::PasswordGrantFetcher;
pub use guard::{API_KEY_HEADER, ApiKeyGuard};
