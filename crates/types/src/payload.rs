//! Opaque lead payload.

use bytes::Bytes;

/// The inbound request body, relayed to the lead API without parsing.
///
/// Keeping the raw bytes (rather than a `serde_json::Value`) means the
/// downstream sees exactly what the caller sent, key order and whitespace
/// included.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LeadPayload(Bytes);

impl LeadPayload {
    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

impl From<Bytes> for LeadPayload {
    fn from(bytes: Bytes) -> Self {
        Self(bytes)
    }
}

impl From<&'static str> for LeadPayload {
    fn from(s: &'static str) -> Self {
        Self(Bytes::from_static(s.as_bytes()))
    }
}
