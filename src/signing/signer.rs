//! Client-side request signing.

use std::time::{SystemTime, UNIX_EPOCH};

use ring::hmac;

use crate::config::ApiKey;
use crate::error::{ConfigErrorKind, GateError};

use super::payload::SigningPayload;

/// Header carrying the hex HMAC.
pub const SIGNATURE_HEADER: &str = "X-Signature";

/// Header carrying the Unix timestamp the signature was made at.
pub const TIMESTAMP_HEADER: &str = "X-Timestamp";

/// Lowercase hex HMAC-SHA256 of `message`.
pub(crate) fn sign_hex(key: &hmac::Key, message: &[u8]) -> String {
    hex::encode(hmac::sign(key, message).as_ref())
}

/// Current Unix time in seconds.
pub(crate) fn unix_now() -> Result<u64, GateError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| GateError::Config {
            kind: ConfigErrorKind::Clock {
                message: e.to_string(),
            },
        })
}

/// Header values for a signed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeaders {
    pub signature: String,
    pub timestamp: String,
}

impl SignatureHeaders {
    /// `(name, value)` pairs ready to attach to an outgoing request.
    pub fn pairs(&self) -> [(&'static str, &str); 2] {
        [
            (SIGNATURE_HEADER, self.signature.as_str()),
            (TIMESTAMP_HEADER, self.timestamp.as_str()),
        ]
    }
}

/// Signs outgoing API requests with the shared key.
pub struct RequestSigner {
    key: hmac::Key,
}

impl RequestSigner {
    pub fn new(api_key: &ApiKey) -> Self {
        Self {
            key: hmac::Key::new(hmac::HMAC_SHA256, api_key.as_bytes()),
        }
    }

    /// Sign a payload at the given Unix timestamp.
    pub fn sign(&self, payload: &SigningPayload, timestamp: u64) -> SignatureHeaders {
        let timestamp = timestamp.to_string();
        SignatureHeaders {
            signature: sign_hex(&self.key, &payload.canonical(&timestamp)),
            timestamp,
        }
    }

    /// Sign a payload at the current time.
    pub fn sign_now(&self, payload: &SigningPayload) -> Result<SignatureHeaders, GateError> {
        Ok(self.sign(payload, unix_now()?))
    }
}
