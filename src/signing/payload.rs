//! Canonical signing payloads.
//!
//! JSON calls sign the exact wire body. Multipart bodies are not byte-stable
//! across client libraries, so upload calls sign only the `email` field and
//! the uploaded file's name.

use crate::error::{AuthErrorKind, GateError};
use crate::http::HttpRequest;

/// Form field holding the uploader's email address.
pub const EMAIL_FIELD: &str = "email";

/// Form field holding the uploaded file.
pub const FILE_FIELD: &str = "file";

/// The request data covered by the signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SigningPayload {
    /// Raw request body, byte for byte.
    Json { body: Vec<u8> },
    /// Upload metadata.
    Multipart { email: String, filename: String },
}

/// Case-insensitive `multipart/form-data` sniffing.
pub fn is_multipart(content_type: Option<&str>) -> bool {
    content_type
        .map(|ct| ct.to_ascii_lowercase().contains("multipart/form-data"))
        .unwrap_or(false)
}

impl SigningPayload {
    pub fn json(body: impl Into<Vec<u8>>) -> Self {
        SigningPayload::Json { body: body.into() }
    }

    pub fn multipart(email: impl Into<String>, filename: impl Into<String>) -> Self {
        SigningPayload::Multipart {
            email: email.into(),
            filename: filename.into(),
        }
    }

    /// Pick the payload shape from the request's content type.
    ///
    /// Multipart requests must carry a non-empty `email` field and a file
    /// with a non-empty name; anything else is treated as JSON.
    pub fn from_request(request: &HttpRequest) -> Result<Self, GateError> {
        if !is_multipart(request.content_type().as_deref()) {
            return Ok(Self::json(request.body()));
        }

        let email = request.form_field(EMAIL_FIELD).unwrap_or_default();
        if email.is_empty() {
            return Err(GateError::auth(AuthErrorKind::MissingField { field: EMAIL_FIELD }));
        }

        let filename = request.uploaded_file_name(FILE_FIELD).unwrap_or_default();
        if filename.is_empty() {
            return Err(GateError::auth(AuthErrorKind::MissingField { field: FILE_FIELD }));
        }

        Ok(Self::multipart(email, filename))
    }

    /// Bytes fed to the HMAC: `timestamp.body` or `timestamp.email.filename`.
    pub fn canonical(&self, timestamp: &str) -> Vec<u8> {
        match self {
            SigningPayload::Json { body } => {
                let mut message = Vec::with_capacity(timestamp.len() + 1 + body.len());
                message.extend_from_slice(timestamp.as_bytes());
                message.push(b'.');
                message.extend_from_slice(body);
                message
            }
            SigningPayload::Multipart { email, filename } => {
                format!("{}.{}.{}", timestamp, email, filename).into_bytes()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_multipart() {
        assert!(is_multipart(Some("multipart/form-data; boundary=----x")));
        assert!(is_multipart(Some("Multipart/Form-Data")));
        assert!(!is_multipart(Some("application/json")));
        assert!(!is_multipart(None));
    }

    #[test]
    fn test_json_canonical_keeps_raw_body() {
        let payload = SigningPayload::json(&b"{ \"b\":1,  \"a\":2 }"[..]);
        assert_eq!(payload.canonical("1700000000"), b"1700000000.{ \"b\":1,  \"a\":2 }");
    }

    #[test]
    fn test_multipart_canonical() {
        let payload = SigningPayload::multipart("owner@example.com", "photo.jpg");
        assert_eq!(
            payload.canonical("1700000000"),
            b"1700000000.owner@example.com.photo.jpg"
        );
    }

    #[test]
    fn test_from_request_defaults_to_json() {
        let request = HttpRequest::new().with_body("{}");
        assert_eq!(
            SigningPayload::from_request(&request).unwrap(),
            SigningPayload::json("{}")
        );

        let request = HttpRequest::new()
            .with_header("Content-Type", "application/json")
            .with_body("");
        assert_eq!(
            SigningPayload::from_request(&request).unwrap(),
            SigningPayload::json("")
        );
    }

    #[test]
    fn test_from_request_multipart() {
        let request = HttpRequest::new()
            .with_header("Content-Type", "multipart/form-data; boundary=abc")
            .with_form_field(EMAIL_FIELD, "owner@example.com")
            .with_file(FILE_FIELD, "photo.jpg")
            .with_body("--abc ... ignored");
        assert_eq!(
            SigningPayload::from_request(&request).unwrap(),
            SigningPayload::multipart("owner@example.com", "photo.jpg")
        );
    }

    #[test]
    fn test_from_request_multipart_missing_fields() {
        let base = HttpRequest::new().with_header("Content-Type", "multipart/form-data");

        let no_email = base.clone().with_file(FILE_FIELD, "photo.jpg");
        assert!(matches!(
            SigningPayload::from_request(&no_email),
            Err(GateError::Auth {
                kind: AuthErrorKind::MissingField { field: EMAIL_FIELD }
            })
        ));

        let no_file = base
            .clone()
            .with_form_field(EMAIL_FIELD, "owner@example.com");
        assert!(matches!(
            SigningPayload::from_request(&no_file),
            Err(GateError::Auth {
                kind: AuthErrorKind::MissingField { field: FILE_FIELD }
            })
        ));

        let empty_name = base
            .with_form_field(EMAIL_FIELD, "owner@example.com")
            .with_file(FILE_FIELD, "");
        assert!(SigningPayload::from_request(&empty_name).is_err());
    }
}
