//! Denial responses returned to clients.
//!
//! Every denial carries a fixed message. The specific reason a check failed
//! is only ever logged server-side.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::cookie::CookieSink;
use crate::error::AuthErrorKind;

/// Why the gate refused a request, as exposed to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// HMAC verification failed for an API call.
    InvalidSignature,
    /// A `token` query parameter was supplied but did not match.
    InvalidToken,
    /// No cookie and no `token` query parameter.
    TokenNotFound,
}

impl Denial {
    pub fn status(self) -> u16 {
        match self {
            Denial::InvalidSignature => 401,
            Denial::InvalidToken | Denial::TokenNotFound => 403,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Denial::InvalidSignature => "forbidden",
            Denial::InvalidToken => "invalid_token",
            Denial::TokenNotFound => "token_not_found",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Denial::InvalidSignature => "Invalid signature",
            Denial::InvalidToken => "invalid token",
            Denial::TokenNotFound => "token not found",
        }
    }

    /// The authentication failure behind this denial, for server-side logs.
    pub fn reason(self) -> AuthErrorKind {
        match self {
            Denial::InvalidSignature => AuthErrorKind::InvalidSignature,
            Denial::InvalidToken => AuthErrorKind::InvalidToken,
            Denial::TokenNotFound => AuthErrorKind::TokenNotFound,
        }
    }

    /// JSON error body for this denial.
    pub fn body(self) -> ErrorResponse {
        ErrorResponse {
            code: self.code().to_string(),
            message: self.message().to_string(),
            data: ErrorData {
                status: self.status(),
            },
        }
    }
}

/// Error body sent to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "forbidden").
    pub code: String,
    /// Fixed human-readable message.
    pub message: String,
    pub data: ErrorData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorData {
    pub status: u16,
}

/// Minimal response the gate produces or decorates.
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    /// Status code; `None` leaves the downstream handler's status untouched.
    pub status: Option<u16>,
    /// `Set-Cookie` header values, in order.
    pub set_cookies: Vec<String>,
    /// JSON body, when the gate terminated the request.
    pub body: Option<String>,
}

impl HttpResponse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Terminate the response with a denial.
    pub fn deny(&mut self, denial: Denial) -> Result<(), serde_json::Error> {
        debug!(status = denial.status(), code = denial.code(), "Writing denial response");
        self.status = Some(denial.status());
        self.body = Some(serde_json::to_string(&denial.body())?);
        Ok(())
    }
}

impl CookieSink for HttpResponse {
    fn set_cookie(&mut self, header_value: String) {
        self.set_cookies.push(header_value);
    }
}
