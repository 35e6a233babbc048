//! Audit entry types.
//!
//! Defines the structure of audit log entries.

use serde::Serialize;
use uuid::Uuid;

/// Which gate produced the decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateKind {
    DomainGuard,
    SignedApi,
}

/// A single audit log entry.
///
/// Records one gate decision: which gate, the sanitized request summary,
/// and the outcome. Secret values never reach this struct.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    /// RFC 3339 timestamp of the decision.
    pub timestamp: String,
    /// Unique identifier for the request.
    pub request_id: Uuid,
    pub gate: GateKind,
    /// Host header, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Sanitized request summary (sensitive values redacted).
    pub request: serde_json::Value,
    pub result: AuditResult,
}

impl AuditEntry {
    /// Create an entry for an allowed request.
    pub fn allow(
        timestamp: String,
        request_id: Uuid,
        gate: GateKind,
        host: Option<String>,
        request: serde_json::Value,
        via: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            request_id,
            gate,
            host,
            request,
            result: AuditResult::Allow { via: via.into() },
        }
    }

    /// Create an entry for a rejected request.
    pub fn reject(
        timestamp: String,
        request_id: Uuid,
        gate: GateKind,
        host: Option<String>,
        request: serde_json::Value,
        error_code: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            request_id,
            gate,
            host,
            request,
            result: AuditResult::Reject {
                error_code: error_code.into(),
                reason: reason.into(),
            },
        }
    }
}

/// Result of a gate decision for audit purposes.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status")]
pub enum AuditResult {
    /// The request was let through.
    #[serde(rename = "allow")]
    Allow {
        /// How it got through (cookie, token, signature, exempt).
        via: String,
    },
    /// The request was denied.
    #[serde(rename = "reject")]
    Reject {
        error_code: String,
        /// Server-side reason; never sent to the client.
        reason: String,
    },
}
