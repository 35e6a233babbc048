//! Parent-domain extraction from the `Host` header.

/// Host assumed when the request carries no `Host` header.
pub const FALLBACK_HOST: &str = "localhost";

/// Parent domain of a host: its last two dot-separated labels.
///
/// The port and a trailing dot are dropped and the result is lowercased.
/// Returns `None` for hosts with fewer than two non-empty trailing labels.
pub fn parent_domain(host: Option<&str>) -> Option<String> {
    let host = host.map(str::trim).filter(|h| !h.is_empty()).unwrap_or(FALLBACK_HOST);
    let host = strip_port(host).trim_end_matches('.');

    let mut labels = host.rsplit('.');
    let tld = labels.next().filter(|l| !l.is_empty())?;
    let name = labels.next().filter(|l| !l.is_empty())?;

    Some(format!("{}.{}", name, tld).to_ascii_lowercase())
}

/// Whether the per-request token check should be installed for this host.
pub fn should_guard<S: AsRef<str>>(host: Option<&str>, allowed_domains: &[S]) -> bool {
    match parent_domain(host) {
        Some(parent) => allowed_domains
            .iter()
            .any(|d| d.as_ref().trim_end_matches('.').eq_ignore_ascii_case(&parent)),
        None => false,
    }
}

/// A domain with more than two labels is a per-site subdomain of a shared
/// parent, which is where access tokens are provisioned.
pub fn is_subdomain(domain: &str) -> bool {
    domain.trim_end_matches('.').split('.').count() > 2
}

fn strip_port(host: &str) -> &str {
    // Bracketed IPv6 literal, e.g. "[::1]:8080".
    if let Some(rest) = host.strip_prefix('[') {
        return rest.split(']').next().unwrap_or(rest);
    }
    match host.rsplit_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    }
}
