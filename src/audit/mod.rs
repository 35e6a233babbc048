//! Audit logging module.
//!
//! Records every gate decision as a JSON line for later review.
//!
//! ## Features
//!
//! - Structured JSON log entries with a request id and RFC 3339 timestamp
//! - Request summaries with tokens, signatures and other secrets redacted
//! - Thread-safe file writing with sync for durability

mod entry;
mod logger;
mod sanitize;

pub use entry::{AuditEntry, AuditResult, GateKind};
pub use logger::AuditLogger;
pub use sanitize::{sanitize, summarize_request};
