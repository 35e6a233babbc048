//! Gate facade used by the host framework.
//!
//! Built once at process start from [`Settings`]. The host calls
//! [`SiteGate::guard_page`] before rendering pages and
//! [`SiteGate::authorize_api`] before running a signed API handler.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::audit::{AuditLogger, GateKind};
use crate::config::{SecretConfig, Settings};
use crate::error::{GateError, GateResult};
use crate::guard::{should_guard, Access, Decision, DomainTokenGuard, Verdict};
use crate::http::{Denial, HttpRequest, HttpResponse};
use crate::signing::HmacRequestVerifier;

/// Both gates plus the optional audit trail.
pub struct SiteGate {
    guard: Option<DomainTokenGuard>,
    verifier: HmacRequestVerifier,
    audit_logger: Option<Arc<AuditLogger>>,
}

impl SiteGate {
    pub fn new(
        guard: Option<DomainTokenGuard>,
        verifier: HmacRequestVerifier,
        audit_logger: Option<Arc<AuditLogger>>,
    ) -> Self {
        Self {
            guard,
            verifier,
            audit_logger,
        }
    }

    /// Load secrets and install the guard if `host` is on a guarded domain.
    ///
    /// An unreadable hash file or secrets file does not stop construction:
    /// it is logged and the affected gate fails closed. Only a broken audit
    /// log path is returned as an error.
    pub fn from_settings(settings: &Settings, host: Option<&str>) -> GateResult<Self> {
        let guard = if should_guard(host, &settings.domain_guard.allowed_domains) {
            info!(host = ?host, "Domain token guard installed");
            Some(DomainTokenGuard::from_config(&settings.domain_guard).unwrap_or_else(|e| {
                error!(error = %e, "Failed to load access token hash, denying all tokens");
                DomainTokenGuard::new(None)
                    .with_cookie_max_age(settings.domain_guard.cookie_max_age_seconds)
            }))
        } else {
            info!(host = ?host, "Host is not on a guarded domain, guard inactive");
            None
        };

        let api_key = match SecretConfig::load(&settings.api.secrets_path) {
            Ok(secrets) => secrets.api_key(),
            Err(e) => {
                error!(error = %e, "Failed to load secret config, denying all signed requests");
                None
            }
        };
        let verifier =
            HmacRequestVerifier::new(api_key.as_ref()).with_max_skew(settings.api.max_skew_seconds);

        let audit_logger = if settings.audit.enabled {
            Some(Arc::new(AuditLogger::new(&settings.audit.log_path)?))
        } else {
            None
        };

        Ok(Self::new(guard, verifier, audit_logger))
    }

    pub fn is_guarding(&self) -> bool {
        self.guard.is_some()
    }

    /// Run the page guard. Cookie writes are applied to `response`; a
    /// rejection also sets the denial status and body.
    ///
    /// Returns the decision; the host must stop processing when it is not
    /// allowed.
    pub fn guard_page(&self, request: &HttpRequest, response: &mut HttpResponse) -> Decision {
        let decision = match &self.guard {
            Some(guard) => guard.check_request(request),
            None => Decision::unguarded(),
        };

        decision.apply(response);
        if let Some(denial) = decision.denial() {
            deny(response, denial);
        }

        // Unguarded and exempt traffic is not interesting enough to audit.
        if let Some(e) = decision.error() {
            self.record(GateKind::DomainGuard, request, Err(&e));
        } else if let Verdict::Allow(access @ (Access::Cookie | Access::Token)) = decision.verdict {
            let via = format!("{:?}", access).to_lowercase();
            self.record(GateKind::DomainGuard, request, Ok(&via));
        }

        decision
    }

    /// Verify a signed API request. On failure the response carries the
    /// fixed 401 denial.
    pub fn authorize_api(&self, request: &HttpRequest, response: &mut HttpResponse) -> bool {
        match self.verifier.check(request) {
            Ok(()) => {
                self.record(GateKind::SignedApi, request, Ok("signature"));
                true
            }
            Err(e) => {
                self.record(GateKind::SignedApi, request, Err(&e));
                deny(response, Denial::InvalidSignature);
                false
            }
        }
    }

    fn record(&self, gate: GateKind, request: &HttpRequest, outcome: Result<&str, &GateError>) {
        let Some(logger) = &self.audit_logger else {
            return;
        };
        if let Err(e) = logger.record(gate, request, outcome) {
            warn!(error = %e, "Failed to write audit entry");
        }
    }
}

fn deny(response: &mut HttpResponse, denial: Denial) {
    if let Err(e) = response.deny(denial) {
        error!(error = %e, "Failed to serialize denial body");
        response.status = Some(denial.status());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiKey;
    use crate::guard::{hash_token, StoredSecretHash};
    use crate::http::{RequestKind, ACCESS_COOKIE_NAME};

    fn gate(guarded: bool) -> SiteGate {
        let guard = guarded.then(|| DomainTokenGuard::new(Some(StoredSecretHash::for_token("t"))));
        let key = ApiKey::new("k").unwrap();
        SiteGate::new(guard, HmacRequestVerifier::new(Some(&key)), None)
    }

    #[test]
    fn test_unguarded_site_allows_pages() {
        let mut response = HttpResponse::new();
        let decision = gate(false).guard_page(&HttpRequest::new(), &mut response);
        assert_eq!(decision.verdict, Verdict::Allow(Access::Unguarded));
        assert!(response.status.is_none());
        assert!(response.set_cookies.is_empty());
    }

    #[test]
    fn test_guarded_site_denies_without_token() {
        let mut response = HttpResponse::new();
        let decision = gate(true).guard_page(&HttpRequest::new(), &mut response);
        assert!(!decision.is_allowed());
        assert_eq!(response.status, Some(403));
        assert!(response.body.unwrap().contains("token not found"));
    }

    #[test]
    fn test_guarded_site_issues_cookie() {
        let mut response = HttpResponse::new();
        let request = HttpRequest::new().with_query("token", "t");
        assert!(gate(true).guard_page(&request, &mut response).is_allowed());
        assert_eq!(response.set_cookies.len(), 1);
        assert!(response.set_cookies[0]
            .starts_with(&format!("{}={}", ACCESS_COOKIE_NAME, hash_token("t"))));
    }

    #[test]
    fn test_unsigned_api_call_denied() {
        let mut response = HttpResponse::new();
        let request = HttpRequest::new().with_kind(RequestKind::Rest).with_body("{}");
        assert!(!gate(false).authorize_api(&request, &mut response));
        assert_eq!(response.status, Some(401));
        assert!(response.body.unwrap().contains("Invalid signature"));
    }
}
