//! Core types and traits for the leadrelay workspace.
//!
//! This crate defines the shared abstractions used across all layers of the
//! relay: the error type, bearer token representations, the opaque lead
//! payload, and the seams (token fetcher, clock) the cache is built on.

pub mod clock;
pub mod error;
pub mod payload;
pub mod token;
pub mod traits;

#[cfg(any(test, feature = "test-support"))]
pub use clock::ManualClock;
pub use clock::SystemClock;
pub use error::RelayError;
pub use payload::LeadPayload;
pub use token::{CachedToken, FetchedToken};
pub use traits::{Clock, TokenFetcher};
