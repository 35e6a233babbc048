//! Domain access token guard.
//!
//! Protects every page of a staging site behind a shared token. A visitor
//! presents the token once as `?token=...`; the guard answers with a cookie
//! holding the token's hash, which is checked on later visits.
//!
//! [`DomainTokenGuard::check_request`] is pure: it returns a [`Decision`]
//! and never touches a response. [`Decision::apply`] performs the cookie
//! writes.

mod host;
mod token;

pub use host::{is_subdomain, parent_domain, should_guard, FALLBACK_HOST};
pub use token::{
    derive_site_token, hash_token, sha256_hex, FileHashStore, HashStore, StoredSecretHash,
};

use tracing::{debug, info, warn};

use crate::config::DomainGuardConfig;
use crate::error::{GateError, GateResult};
use crate::http::{
    AccessCookie, CookieAction, CookieSink, Denial, HttpRequest, RequestKind, ACCESS_COOKIE_NAME,
    DEFAULT_COOKIE_MAX_AGE,
};

/// Query parameter carrying the plaintext token.
pub const TOKEN_QUERY_PARAM: &str = "token";

/// How an allowed request got through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// The site is not on a guarded domain.
    Unguarded,
    /// REST, AJAX or logged-in traffic, which the guard never intercepts.
    Exempt,
    /// A valid access cookie.
    Cookie,
    /// A valid `token` query parameter.
    Token,
}

/// Outcome of a guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Continue to the page.
    Allow(Access),
    /// Stop the request with a fixed denial.
    Reject(Denial),
}

/// A verdict plus the cookie writes it requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub verdict: Verdict,
    /// Cookie writes in the order they must be applied.
    pub cookies: Vec<CookieAction>,
}

impl Decision {
    fn new(verdict: Verdict, cookies: Vec<CookieAction>) -> Self {
        Self { verdict, cookies }
    }

    /// Decision for a site without an installed guard.
    pub fn unguarded() -> Self {
        Self::new(Verdict::Allow(Access::Unguarded), Vec::new())
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self.verdict, Verdict::Allow(_))
    }

    /// The denial to send, if the request was rejected.
    pub fn denial(&self) -> Option<Denial> {
        match self.verdict {
            Verdict::Reject(denial) => Some(denial),
            Verdict::Allow(_) => None,
        }
    }

    /// The rejection as a typed error, for logging and auditing.
    pub fn error(&self) -> Option<GateError> {
        self.denial().map(|denial| GateError::auth(denial.reason()))
    }

    /// Write the decision's cookies to the response.
    pub fn apply<S: CookieSink + ?Sized>(&self, sink: &mut S) {
        for action in &self.cookies {
            sink.set_cookie(action.header_value());
        }
    }
}

/// Per-request token check for a guarded site.
#[derive(Debug, Clone)]
pub struct DomainTokenGuard {
    stored: Option<StoredSecretHash>,
    cookie_max_age: u64,
}

impl DomainTokenGuard {
    /// Guard with an already loaded hash. `None` means no token is
    /// provisioned, so every token attempt is rejected.
    pub fn new(stored: Option<StoredSecretHash>) -> Self {
        if stored.is_none() {
            warn!("No access token hash provisioned, all token checks will fail");
        }
        Self {
            stored,
            cookie_max_age: DEFAULT_COOKIE_MAX_AGE,
        }
    }

    /// Load the hash from the configured file.
    pub fn from_config(config: &DomainGuardConfig) -> GateResult<Self> {
        let store = FileHashStore::new(&config.hash_path);
        Ok(Self::from_store(&store)?.with_cookie_max_age(config.cookie_max_age_seconds))
    }

    pub fn from_store<H: HashStore + ?Sized>(store: &H) -> GateResult<Self> {
        Ok(Self::new(store.load()?))
    }

    pub fn with_cookie_max_age(mut self, seconds: u64) -> Self {
        self.cookie_max_age = seconds;
        self
    }

    pub fn has_token(&self) -> bool {
        self.stored.is_some()
    }

    /// Decide whether a request may see the page.
    pub fn check_request(&self, request: &HttpRequest) -> Decision {
        if request.kind() != RequestKind::Page || request.is_authenticated() {
            debug!(kind = ?request.kind(), authenticated = request.is_authenticated(), "Guard bypassed");
            return Decision::new(Verdict::Allow(Access::Exempt), Vec::new());
        }

        let mut cookies = Vec::new();

        if let Some(cookie_hash) = request.cookie(ACCESS_COOKIE_NAME).filter(|v| !v.is_empty()) {
            if self.matches(cookie_hash.as_bytes()) {
                debug!("Access cookie accepted");
                return Decision::new(Verdict::Allow(Access::Cookie), cookies);
            }
            // A fresh token in the query can still succeed below.
            info!("Stale access cookie, clearing");
            cookies.push(CookieAction::Clear);
        }

        if let Some(token) = request.query(TOKEN_QUERY_PARAM) {
            let token_hash = hash_token(token.trim());
            if !self.matches(token_hash.as_bytes()) {
                warn!(reason = %Denial::InvalidToken.reason(), "Access token rejected");
                return Decision::new(Verdict::Reject(Denial::InvalidToken), cookies);
            }

            info!("Access token accepted, issuing cookie");
            cookies.push(CookieAction::Set(AccessCookie::new(
                token_hash,
                self.cookie_max_age,
                request.is_https(),
            )));
            return Decision::new(Verdict::Allow(Access::Token), cookies);
        }

        debug!("No access token presented");
        Decision::new(Verdict::Reject(Denial::TokenNotFound), cookies)
    }

    fn matches(&self, candidate: &[u8]) -> bool {
        self.stored
            .as_ref()
            .map(|stored| stored.matches(candidate))
            .unwrap_or(false)
    }
}
