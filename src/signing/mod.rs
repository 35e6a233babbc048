//! HMAC request signing.
//!
//! API calls carry `X-Signature` (lowercase hex HMAC-SHA256) and
//! `X-Timestamp` (Unix seconds). The signed message is
//! `timestamp + "." + payload`, where the payload depends on the content
//! type (see [`SigningPayload`]). Requests older or newer than the replay
//! window are rejected regardless of signature.

mod payload;
mod signer;
mod verifier;

pub use payload::{is_multipart, SigningPayload, EMAIL_FIELD, FILE_FIELD};
pub use signer::{RequestSigner, SignatureHeaders, SIGNATURE_HEADER, TIMESTAMP_HEADER};
pub use verifier::{verify, HmacRequestVerifier, DEFAULT_MAX_SKEW_SECONDS};
