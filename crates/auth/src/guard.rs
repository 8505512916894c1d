//! Static API key check for inbound requests.
use secrecy::{ExposeSecret as _, SecretString};
use sha2::{Digest as _, Sha256};

/// Header callers put their key in.
pub const API_KEY_HEADER: &str = "x-api-key";

pub struct ApiKeyGuard {
    key: SecretString,
}

impl ApiKeyGuard {
    #[must_use]
    pub fn new(key: SecretString) -> Self {
        Self { key }
    }

    /// Authorized iff a key was provided and it equals the configured one.
    ///
    /// Both sides are hashed first so the comparison takes the same time
    /// regardless of where (or whether) the keys differ in length or content.
    #[must_use]
    pub fn authorize(&self, provided: Option<&str>) -> bool {
        let Some(provided) = provided else {
            return false;
        };
        let expected = Sha256::digest(self.key.expose_secret().as_bytes());
        let actual = Sha256::digest(provided.as_bytes());
        expected
            .iter()
            .zip(actual.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}
