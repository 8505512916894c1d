//! Bearer token representation and expiry logic.

use serde::Deserialize;

/// The result of one credential exchange: the token and its lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FetchedToken {
    pub access_token: String,
    /// Lifetime in seconds, counted from the moment the exchange completed.
    pub expires_in: u64,
}

impl FetchedToken {
    pub fn new(access_token: impl Into<String>, expires_in: u64) -> Self {
        Self {
            access_token: access_token.into(),
            expires_in,
        }
    }

    /// Pin the lifetime to an absolute expiry, `now` being seconds since the epoch.
    #[must_use]
    pub fn into_cached(self, now: u64) -> CachedToken {
        CachedToken {
            access_token: self.access_token,
            expires_at: now.saturating_add(self.expires_in),
        }
    }
}

/// A token held by the cache together with its absolute expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedToken {
    pub access_token: String,
    /// Seconds since the Unix epoch.
    pub expires_at: u64,
}

impl CachedToken {
    /// Return `true` while the token may still be handed out, i.e. strictly
    /// before `expires_at - margin`.
    #[must_use]
    pub fn is_fresh(&self, now: u64, margin: u64) -> bool {
        now < self.expires_at.saturating_sub(margin)
    }
}
