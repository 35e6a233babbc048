//! Access cookie wire format.

/// Name of the cookie carrying the access token hash.
pub const ACCESS_COOKIE_NAME: &str = "temp_domain_token";

/// Default cookie lifetime: one year.
pub const DEFAULT_COOKIE_MAX_AGE: u64 = 31_536_000;

/// The access cookie issued after a successful token check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessCookie {
    /// Lowercase hex SHA-256 of the token.
    pub value: String,
    /// Lifetime in seconds.
    pub max_age: u64,
    /// Whether the `Secure` attribute is set.
    pub secure: bool,
}

impl AccessCookie {
    pub fn new(value: impl Into<String>, max_age: u64, secure: bool) -> Self {
        Self {
            value: value.into(),
            max_age,
            secure,
        }
    }

    /// `Set-Cookie` header value.
    pub fn header_value(&self) -> String {
        let mut header = format!(
            "{}={}; Max-Age={}; Path=/; HttpOnly",
            ACCESS_COOKIE_NAME, self.value, self.max_age
        );
        if self.secure {
            header.push_str("; Secure");
        }
        header
    }
}

/// A cookie write the caller must apply to the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieAction {
    /// Issue (or refresh) the access cookie.
    Set(AccessCookie),
    /// Remove the access cookie from the browser.
    Clear,
}

impl CookieAction {
    /// `Set-Cookie` header value for this action.
    pub fn header_value(&self) -> String {
        match self {
            CookieAction::Set(cookie) => cookie.header_value(),
            CookieAction::Clear => format!(
                "{}=; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT; Path=/",
                ACCESS_COOKIE_NAME
            ),
        }
    }
}

/// Anything that can receive `Set-Cookie` headers.
pub trait CookieSink {
    fn set_cookie(&mut self, header_value: String);
}

impl CookieSink for Vec<String> {
    fn set_cookie(&mut self, header_value: String) {
        self.push(header_value);
    }
}

/// Split a raw `Cookie:` header into name/value pairs.
///
/// Malformed pairs (no `=`, empty name) are skipped.
pub fn parse_cookie_header(raw: &str) -> Vec<(String, String)> {
    raw.split(';')
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            let value = value.trim().trim_matches('"');
            Some((name.to_string(), value.to_string()))
        })
        .collect()
}
