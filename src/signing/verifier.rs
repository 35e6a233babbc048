//! HMAC-SHA256 request verification.

use ring::hmac;
use subtle::ConstantTimeEq;
use tracing::{debug, error, warn};

use crate::config::ApiKey;
use crate::error::{AuthErrorKind, ConfigErrorKind, GateError, GateResult};
use crate::http::{HeaderSource, HttpRequest};

use super::payload::SigningPayload;
use super::signer::{sign_hex, unix_now, SIGNATURE_HEADER, TIMESTAMP_HEADER};

/// Default replay window in seconds, in either direction.
pub const DEFAULT_MAX_SKEW_SECONDS: u64 = 300;

/// Verifier for signed API requests.
pub struct HmacRequestVerifier {
    key: Option<hmac::Key>,
    max_skew: u64,
}

impl HmacRequestVerifier {
    /// Create a verifier. With no key every request fails verification.
    pub fn new(api_key: Option<&ApiKey>) -> Self {
        Self {
            key: api_key.map(|k| hmac::Key::new(hmac::HMAC_SHA256, k.as_bytes())),
            max_skew: DEFAULT_MAX_SKEW_SECONDS,
        }
    }

    pub fn with_max_skew(mut self, seconds: u64) -> Self {
        self.max_skew = seconds;
        self
    }

    pub fn has_key(&self) -> bool {
        self.key.is_some()
    }

    /// Verify a request against the current time.
    pub fn verify(&self, request: &HttpRequest) -> bool {
        self.check(request).is_ok()
    }

    /// Verify a request against an explicit Unix time.
    pub fn verify_at(&self, request: &HttpRequest, now: u64) -> bool {
        self.check_at(request, now).is_ok()
    }

    /// Like [`verify`](Self::verify), but returns the failure reason.
    ///
    /// The reason is for server-side logging only and must not be sent to
    /// the client.
    pub fn check(&self, request: &HttpRequest) -> GateResult<()> {
        self.check_at(request, unix_now()?)
    }

    /// Like [`verify_at`](Self::verify_at), but returns the failure reason.
    ///
    /// Checks, in order:
    /// 1. A key is configured
    /// 2. Signature and timestamp headers are present
    /// 3. Timestamp is within the replay window
    /// 4. The payload required by the content type is present
    /// 5. Signature matches
    pub fn check_at(&self, request: &HttpRequest, now: u64) -> GateResult<()> {
        let key = match &self.key {
            Some(key) => key,
            None => {
                error!("api_key not configured, rejecting signed request");
                return Err(GateError::Config {
                    kind: ConfigErrorKind::MissingSecret {
                        key: crate::config::API_KEY.to_string(),
                    },
                });
            }
        };

        let result = self.check_with_key(key, request, now);
        if let Err(ref e) = result {
            warn!(error = %e, "Signed request rejected");
        } else {
            debug!("Signed request verified");
        }
        result
    }

    fn check_with_key(&self, key: &hmac::Key, headers: &HttpRequest, now: u64) -> GateResult<()> {
        let signature = required_header(headers, SIGNATURE_HEADER)?;
        let timestamp = required_header(headers, TIMESTAMP_HEADER)?;

        // 1. Check timestamp freshness, both directions
        let sent_at: i64 = timestamp
            .trim()
            .parse()
            .map_err(|_| GateError::auth(AuthErrorKind::MalformedTimestamp))?;
        let skew = (now as i128 - sent_at as i128).unsigned_abs();
        if skew > self.max_skew as u128 {
            return Err(GateError::auth(AuthErrorKind::RequestExpired {
                skew_seconds: u64::try_from(skew).unwrap_or(u64::MAX),
            }));
        }

        // 2. Build the payload for this content type
        let payload = SigningPayload::from_request(headers)?;

        // 3. Verify signature
        let expected = sign_hex(key, &payload.canonical(&timestamp));
        if !bool::from(expected.as_bytes().ct_eq(signature.as_bytes())) {
            return Err(GateError::auth(AuthErrorKind::InvalidSignature));
        }

        Ok(())
    }
}

fn required_header(source: &dyn HeaderSource, name: &'static str) -> GateResult<String> {
    source
        .get(name)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| GateError::auth(AuthErrorKind::MissingHeader { name }))
}

/// One-shot verification with an optional key.
pub fn verify(request: &HttpRequest, api_key: Option<&ApiKey>) -> bool {
    HmacRequestVerifier::new(api_key).verify(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signing::payload::{EMAIL_FIELD, FILE_FIELD};
    use crate::signing::RequestSigner;

    const NOW: u64 = 1_700_000_000;
    const BODY: &str = r#"{"title":"Hello","content":"<p>world</p>"}"#;

    fn api_key() -> ApiKey {
        ApiKey::new("test-secret-key-32-bytes-long!!").unwrap()
    }

    fn create_test_verifier() -> HmacRequestVerifier {
        HmacRequestVerifier::new(Some(&api_key()))
    }

    fn signed_json(body: &str, timestamp: u64) -> HttpRequest {
        let headers = RequestSigner::new(&api_key()).sign(&SigningPayload::json(body), timestamp);
        HttpRequest::new()
            .with_kind(crate::http::RequestKind::Rest)
            .with_header("Content-Type", "application/json")
            .with_header(SIGNATURE_HEADER, headers.signature)
            .with_header(TIMESTAMP_HEADER, headers.timestamp)
            .with_body(body)
    }

    fn signed_upload(email: &str, filename: &str, timestamp: u64) -> HttpRequest {
        let headers = RequestSigner::new(&api_key())
            .sign(&SigningPayload::multipart(email, filename), timestamp);
        HttpRequest::new()
            .with_header("Content-Type", "multipart/form-data; boundary=xyz")
            .with_header(SIGNATURE_HEADER, headers.signature)
            .with_header(TIMESTAMP_HEADER, headers.timestamp)
            .with_form_field(EMAIL_FIELD, email)
            .with_file(FILE_FIELD, filename)
    }

    #[test]
    fn test_valid_json_signature() {
        let verifier = create_test_verifier();
        assert!(verifier.verify_at(&signed_json(BODY, NOW), NOW));
    }

    #[test]
    fn test_tampered_body() {
        let verifier = create_test_verifier();
        let request = signed_json(BODY, NOW).with_body(BODY.replace("Hello", "Hellp"));
        assert!(matches!(
            verifier.check_at(&request, NOW),
            Err(GateError::Auth {
                kind: AuthErrorKind::InvalidSignature
            })
        ));
    }

    #[test]
    fn test_every_body_byte_is_covered() {
        let verifier = create_test_verifier();
        let signed = signed_json(BODY, NOW);
        let signature = signed.header(SIGNATURE_HEADER).unwrap();
        for i in 0..BODY.len() {
            let mut body = BODY.as_bytes().to_vec();
            body[i] ^= 0x01;
            let request = HttpRequest::new()
                .with_header(SIGNATURE_HEADER, signature.clone())
                .with_header(TIMESTAMP_HEADER, NOW.to_string())
                .with_body(body);
            assert!(!verifier.verify_at(&request, NOW), "byte {} not covered", i);
        }
    }

    #[test]
    fn test_every_signature_byte_is_checked() {
        let verifier = create_test_verifier();
        let signature = signed_json(BODY, NOW).header(SIGNATURE_HEADER).unwrap();
        for i in 0..signature.len() {
            let mut tampered = signature.clone().into_bytes();
            tampered[i] = if tampered[i] == b'0' { b'1' } else { b'0' };
            let request = HttpRequest::new()
                .with_header(SIGNATURE_HEADER, String::from_utf8(tampered).unwrap())
                .with_header(TIMESTAMP_HEADER, NOW.to_string())
                .with_body(BODY);
            assert!(!verifier.verify_at(&request, NOW));
        }
    }

    #[test]
    fn test_uppercase_signature_rejected() {
        let verifier = create_test_verifier();
        let signature = signed_json(BODY, NOW).header(SIGNATURE_HEADER).unwrap();
        let request = HttpRequest::new()
            .with_header(SIGNATURE_HEADER, signature.to_ascii_uppercase())
            .with_header(TIMESTAMP_HEADER, NOW.to_string())
            .with_body(BODY);
        // Only lowercase hex digests are accepted; a digest made only of
        // digits would be unaffected by uppercasing.
        if signature.chars().any(|c| c.is_ascii_alphabetic()) {
            assert!(!verifier.verify_at(&request, NOW));
        }
    }

    #[test]
    fn test_replay_window_boundary() {
        let verifier = create_test_verifier();
        assert!(verifier.verify_at(&signed_json(BODY, NOW - 300), NOW));
        assert!(!verifier.verify_at(&signed_json(BODY, NOW - 301), NOW));
        assert!(verifier.verify_at(&signed_json(BODY, NOW + 300), NOW));
        assert!(!verifier.verify_at(&signed_json(BODY, NOW + 301), NOW));
    }

    #[test]
    fn test_expired_request() {
        let verifier = create_test_verifier();
        let result = verifier.check_at(&signed_json(BODY, 1000), NOW);
        assert!(matches!(
            result,
            Err(GateError::Auth {
                kind: AuthErrorKind::RequestExpired { .. }
            })
        ));
    }

    #[test]
    fn test_custom_skew() {
        let verifier = create_test_verifier().with_max_skew(10);
        assert!(verifier.verify_at(&signed_json(BODY, NOW - 10), NOW));
        assert!(!verifier.verify_at(&signed_json(BODY, NOW - 11), NOW));
    }

    #[test]
    fn test_missing_headers() {
        let verifier = create_test_verifier();
        let signed = signed_json(BODY, NOW);

        let no_signature = HttpRequest::new()
            .with_header(TIMESTAMP_HEADER, NOW.to_string())
            .with_body(BODY);
        assert!(matches!(
            verifier.check_at(&no_signature, NOW),
            Err(GateError::Auth {
                kind: AuthErrorKind::MissingHeader { name: "X-Signature" }
            })
        ));

        let no_timestamp = HttpRequest::new()
            .with_header(SIGNATURE_HEADER, signed.header(SIGNATURE_HEADER).unwrap())
            .with_body(BODY);
        assert!(!verifier.verify_at(&no_timestamp, NOW));

        let empty_signature = HttpRequest::new()
            .with_header(SIGNATURE_HEADER, "")
            .with_header(TIMESTAMP_HEADER, NOW.to_string())
            .with_body(BODY);
        assert!(!verifier.verify_at(&empty_signature, NOW));
    }

    #[test]
    fn test_malformed_timestamp() {
        let verifier = create_test_verifier();
        let request = HttpRequest::new()
            .with_header(SIGNATURE_HEADER, "00")
            .with_header(TIMESTAMP_HEADER, "yesterday")
            .with_body(BODY);
        assert!(matches!(
            verifier.check_at(&request, NOW),
            Err(GateError::Auth {
                kind: AuthErrorKind::MalformedTimestamp
            })
        ));
    }

    #[test]
    fn test_headers_from_server_vars() {
        let verifier = create_test_verifier();
        let headers = RequestSigner::new(&api_key()).sign(&SigningPayload::json(BODY), NOW);
        let request = HttpRequest::new()
            .with_server_var("HTTP_X_SIGNATURE", headers.signature)
            .with_server_var("HTTP_X_TIMESTAMP", headers.timestamp)
            .with_server_var("CONTENT_TYPE", "application/json")
            .with_body(BODY);
        assert!(verifier.verify_at(&request, NOW));
    }

    #[test]
    fn test_valid_multipart_signature() {
        let verifier = create_test_verifier();
        let request = signed_upload("owner@example.com", "photo.jpg", NOW);
        assert!(verifier.verify_at(&request, NOW));
    }

    #[test]
    fn test_multipart_ignores_body() {
        let verifier = create_test_verifier();
        let request = signed_upload("owner@example.com", "photo.jpg", NOW)
            .with_body("--xyz\r\nbinary data\r\n--xyz--");
        assert!(verifier.verify_at(&request, NOW));
    }

    #[test]
    fn test_multipart_wrong_filename() {
        let verifier = create_test_verifier();
        let headers = RequestSigner::new(&api_key())
            .sign(&SigningPayload::multipart("owner@example.com", "photo.jpg"), NOW);
        let request = HttpRequest::new()
            .with_header("Content-Type", "multipart/form-data")
            .with_header(SIGNATURE_HEADER, headers.signature)
            .with_header(TIMESTAMP_HEADER, headers.timestamp)
            .with_form_field(EMAIL_FIELD, "owner@example.com")
            .with_file(FILE_FIELD, "other.jpg");
        assert!(!verifier.verify_at(&request, NOW));
    }

    #[test]
    fn test_multipart_empty_fields_rejected() {
        let verifier = create_test_verifier();
        // Signatures are correct for the (empty) values; the fields are
        // still required.
        assert!(!verifier.verify_at(&signed_upload("", "photo.jpg", NOW), NOW));
        assert!(!verifier.verify_at(&signed_upload("owner@example.com", "", NOW), NOW));
    }

    #[test]
    fn test_missing_api_key_always_fails() {
        let verifier = HmacRequestVerifier::new(None);
        assert!(!verifier.has_key());
        assert!(!verifier.verify_at(&signed_json(BODY, NOW), NOW));
        assert!(!verifier.verify_at(&signed_upload("a@example.com", "a.png", NOW), NOW));
        assert!(!verifier.verify_at(&HttpRequest::new(), NOW));
        assert!(matches!(
            verifier.check_at(&HttpRequest::new(), NOW),
            Err(GateError::Config {
                kind: ConfigErrorKind::MissingSecret { .. }
            })
        ));
        assert!(!verify(&signed_json(BODY, NOW), None));
    }

    #[test]
    fn test_wrong_key() {
        let other = ApiKey::new("another-key").unwrap();
        let verifier = HmacRequestVerifier::new(Some(&other));
        assert!(!verifier.verify_at(&signed_json(BODY, NOW), NOW));
    }

    #[test]
    fn test_verify_uses_current_time() {
        let now = unix_now().unwrap();
        assert!(verify(&signed_json(BODY, now), Some(&api_key())));
        assert!(!verify(&signed_json(BODY, now - 3600), Some(&api_key())));
    }
}
