//! Request summaries for audit logging.
//!
//! Builds a JSON summary of a request and redacts anything that could carry
//! a secret before it is written to the audit log.

use serde_json::{json, Map, Value};

use crate::http::HttpRequest;

/// Key segments whose values are always redacted. A key is split on
/// non-alphanumeric characters, so `api_key` and `X-Signature` match while
/// `keyword` does not.
const SENSITIVE_KEYS: &[&str] = &[
    "password",
    "passwd",
    "secret",
    "secrets",
    "key",
    "apikey",
    "token",
    "tokens",
    "signature",
    "cookie",
    "cookies",
    "credential",
    "credentials",
    "auth",
    "authorization",
    "email",
];

/// Maximum length for string values before truncation.
const MAX_STRING_LENGTH: usize = 256;

/// Summarize a request for the audit log, with secrets redacted.
///
/// Headers and cookies are not included; only their presence matters and
/// that is reflected in the audit result. Form fields are listed by name
/// only.
pub fn summarize_request(request: &HttpRequest) -> Value {
    let query: Map<String, Value> = request
        .query_pairs()
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect();
    let mut form_fields: Vec<&str> = request.form_pairs().map(|(k, _)| k).collect();
    form_fields.sort_unstable();

    sanitize(&json!({
        "kind": format!("{:?}", request.kind()).to_lowercase(),
        "logged_in": request.is_authenticated(),
        "https": request.is_https(),
        "content_type": request.content_type(),
        "body_bytes": request.body().len(),
        "query": query,
        "form_fields": form_fields,
    }))
}

fn is_sensitive(key: &str) -> bool {
    key.to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .any(|segment| SENSITIVE_KEYS.contains(&segment))
}

/// Redact sensitive keys and truncate long strings, recursively.
pub fn sanitize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut sanitized = Map::new();
            for (key, val) in map {
                if is_sensitive(key) {
                    sanitized.insert(key.clone(), Value::String("[REDACTED]".to_string()));
                } else {
                    sanitized.insert(key.clone(), sanitize(val));
                }
            }
            Value::Object(sanitized)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sanitize).collect()),
        Value::String(s) if s.len() > MAX_STRING_LENGTH => {
            Value::String(format!("[TRUNCATED - {} bytes]", s.len()))
        }
        _ => value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::RequestKind;

    #[test]
    fn test_summary_redacts_token() {
        let request = HttpRequest::new()
            .with_query("token", "plaintext-token")
            .with_query("page_id", "12");
        let summary = summarize_request(&request);
        assert_eq!(summary["query"]["token"], "[REDACTED]");
        assert_eq!(summary["query"]["page_id"], "12");
        assert_eq!(summary["kind"], "page");
    }

    #[test]
    fn test_summary_of_upload() {
        let request = HttpRequest::new()
            .with_kind(RequestKind::Rest)
            .with_header("Content-Type", "multipart/form-data")
            .with_form_field("email", "owner@example.com")
            .with_body(vec![0u8; 10]);
        let summary = summarize_request(&request);
        assert_eq!(summary["form_fields"], json!(["email"]));
        assert!(!summary.to_string().contains("owner@example.com"));
        assert_eq!(summary["content_type"], "multipart/form-data");
        assert_eq!(summary["body_bytes"], 10);
        assert_eq!(summary["kind"], "rest");
    }

    #[test]
    fn test_sanitize_various_sensitive_keys() {
        let params = json!({
            "api_key": "key123",
            "X-Signature": "abc",
            "auth_header": "Bearer xyz",
            "temp_domain_token": "hash"
        });
        let sanitized = sanitize(&params);
        assert_eq!(sanitized["api_key"], "[REDACTED]");
        assert_eq!(sanitized["X-Signature"], "[REDACTED]");
        assert_eq!(sanitized["auth_header"], "[REDACTED]");
        assert_eq!(sanitized["temp_domain_token"], "[REDACTED]");
    }

    #[test]
    fn test_sanitize_matches_whole_segments() {
        let params = json!({
            "keyword": "rust",
            "monkey": "banana",
            "apiKey": "k",
            "email": "owner@example.com",
            "page_id": "12"
        });
        let sanitized = sanitize(&params);
        assert_eq!(sanitized["keyword"], "rust");
        assert_eq!(sanitized["monkey"], "banana");
        assert_eq!(sanitized["apiKey"], "[REDACTED]");
        assert_eq!(sanitized["email"], "[REDACTED]");
        assert_eq!(sanitized["page_id"], "12");
    }

    #[test]
    fn test_sanitize_nested_and_arrays() {
        let params = json!({
            "items": [{"name": "a", "password": "p"}],
            "outer": {"inner": {"secret": "s"}}
        });
        let sanitized = sanitize(&params);
        assert_eq!(sanitized["items"][0]["name"], "a");
        assert_eq!(sanitized["items"][0]["password"], "[REDACTED]");
        assert_eq!(sanitized["outer"]["inner"]["secret"], "[REDACTED]");
    }

    #[test]
    fn test_truncate_long_values() {
        let sanitized = sanitize(&json!({"title": "x".repeat(1000)}));
        assert_eq!(sanitized["title"], "[TRUNCATED - 1000 bytes]");
    }
}
