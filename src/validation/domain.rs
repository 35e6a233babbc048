//! Domain name validation.
//!
//! Used for allow-list entries in the settings and for domains handed to the
//! provisioning commands.

use crate::error::GateError;

/// Maximum length for a domain name.
const MAX_DOMAIN_LENGTH: usize = 253;

/// Maximum length for a domain label (part between dots).
const MAX_LABEL_LENGTH: usize = 63;

fn invalid(message: impl Into<String>) -> GateError {
    GateError::Input {
        message: message.into(),
    }
}

/// Validates a domain name.
///
/// # Rules
///
/// - Must be 1-253 characters
/// - Each label must be 1-63 characters of letters, digits and hyphens
/// - Labels must start and end with a letter or digit
/// - No wildcards
/// - Must have at least one dot (no bare TLDs)
///
/// Returns the domain without a trailing dot.
pub fn validate_domain(domain: &str) -> Result<&str, GateError> {
    if domain.is_empty() {
        return Err(invalid("Domain name cannot be empty"));
    }

    if domain.len() > MAX_DOMAIN_LENGTH {
        return Err(invalid(format!(
            "Domain name exceeds maximum length of {} characters",
            MAX_DOMAIN_LENGTH
        )));
    }

    if domain.contains('*') {
        return Err(invalid("Wildcard domains are not allowed"));
    }

    let domain = domain.trim_end_matches('.');

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return Err(invalid(format!(
            "Domain '{}' must have at least two parts (e.g., example.com)",
            domain
        )));
    }

    for label in &labels {
        validate_domain_label(label)?;
    }

    Ok(domain)
}

/// Validates a single domain label (part between dots).
fn validate_domain_label(label: &str) -> Result<(), GateError> {
    let (first, last) = match (label.chars().next(), label.chars().last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(invalid("Domain contains empty label (consecutive dots)")),
    };

    if label.len() > MAX_LABEL_LENGTH {
        return Err(invalid(format!(
            "Domain label '{}' exceeds maximum length of {} characters",
            label, MAX_LABEL_LENGTH
        )));
    }

    if !first.is_ascii_alphanumeric() {
        return Err(invalid(format!(
            "Domain label '{}' must start with a letter or number",
            label
        )));
    }

    if !last.is_ascii_alphanumeric() {
        return Err(invalid(format!(
            "Domain label '{}' must end with a letter or number",
            label
        )));
    }

    if let Some(c) = label
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && *c != '-')
    {
        return Err(invalid(format!(
            "Domain label '{}' contains invalid character '{}'",
            label, c
        )));
    }

    Ok(())
}
