//! Append-only audit trail of gate decisions.
//!
//! One JSON object per line. Entries carry a fresh request id, an RFC 3339
//! timestamp with millisecond precision, and a sanitized request summary.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{SecondsFormat, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::GateError;
use crate::http::HttpRequest;

use super::entry::{AuditEntry, GateKind};
use super::sanitize::summarize_request;

/// Writes gate decisions to the audit file.
pub struct AuditLogger {
    file: Mutex<File>,
    path: PathBuf,
}

impl AuditLogger {
    /// Open `path` for appending, creating missing parent directories.
    pub fn new(path: &Path) -> Result<Self, GateError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                debug!(path = %parent.display(), "Creating audit log directory");
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        debug!(path = %path.display(), "Audit log opened");

        Ok(Self {
            file: Mutex::new(file),
            path: path.to_path_buf(),
        })
    }

    /// Record one gate decision for `request`.
    ///
    /// `Ok(via)` names how the request got through; `Err` carries the
    /// server-side reason it was refused.
    pub fn record(
        &self,
        gate: GateKind,
        request: &HttpRequest,
        outcome: Result<&str, &GateError>,
    ) -> Result<Uuid, GateError> {
        let request_id = Uuid::new_v4();
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let summary = summarize_request(request);

        let entry = match outcome {
            Ok(via) => AuditEntry::allow(timestamp, request_id, gate, request.host(), summary, via),
            Err(e) => AuditEntry::reject(
                timestamp,
                request_id,
                gate,
                request.host(),
                summary,
                e.code(),
                e.to_string(),
            ),
        };

        self.log(&entry)?;
        Ok(request_id)
    }

    /// Append a prepared entry.
    pub fn log(&self, entry: &AuditEntry) -> Result<(), GateError> {
        let line = serde_json::to_string(entry)?;

        // A panic in another writer leaves the file usable; keep appending.
        let mut file = self.file.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        writeln!(file, "{}", line)?;
        if let Err(e) = file.sync_data() {
            warn!(error = %e, "Failed to sync audit log");
        }

        debug!(request_id = %entry.request_id, gate = ?entry.gate, "Audit entry written");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthErrorKind;
    use crate::http::RequestKind;
    use serde_json::Value;
    use tempfile::TempDir;

    fn read_lines(path: &Path) -> Vec<Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_logger_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("subdir/audit.log");

        let logger = AuditLogger::new(&log_path).unwrap();
        assert!(log_path.parent().unwrap().exists());
        assert_eq!(logger.path(), log_path);
    }

    #[test]
    fn test_record_allowed_page() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("audit.log");
        let logger = AuditLogger::new(&log_path).unwrap();

        let request = HttpRequest::new()
            .with_server_var("HTTP_HOST", "site1.hp-standard.net")
            .with_query("token", "plaintext");
        let id = logger.record(GateKind::DomainGuard, &request, Ok("token")).unwrap();

        let lines = read_lines(&log_path);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["request_id"], id.to_string());
        assert_eq!(lines[0]["gate"], "domain_guard");
        assert_eq!(lines[0]["host"], "site1.hp-standard.net");
        assert_eq!(lines[0]["result"]["status"], "allow");
        assert_eq!(lines[0]["result"]["via"], "token");
        assert_eq!(lines[0]["request"]["query"]["token"], "[REDACTED]");
        assert!(lines[0]["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_record_rejected_api_call() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("audit.log");
        let logger = AuditLogger::new(&log_path).unwrap();

        let request = HttpRequest::new().with_kind(RequestKind::Rest).with_body("{}");
        let error = GateError::auth(AuthErrorKind::MissingHeader { name: "X-Signature" });
        logger.record(GateKind::SignedApi, &request, Err(&error)).unwrap();

        let lines = read_lines(&log_path);
        assert_eq!(lines[0]["gate"], "signed_api");
        assert_eq!(lines[0]["result"]["status"], "reject");
        assert_eq!(lines[0]["result"]["error_code"], "AUTH_ERROR");
        assert_eq!(
            lines[0]["result"]["reason"],
            "Authentication error: Missing header X-Signature"
        );
        assert!(lines[0].get("host").is_none());
        assert_eq!(lines[0]["request"]["body_bytes"], 2);
    }

    #[test]
    fn test_logger_appends_to_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("audit.log");
        let request = HttpRequest::new();

        for _ in 0..2 {
            let logger = AuditLogger::new(&log_path).unwrap();
            logger.record(GateKind::DomainGuard, &request, Ok("cookie")).unwrap();
        }

        assert_eq!(read_lines(&log_path).len(), 2);
    }
}
