//! Error types for the site gate.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the gate.
#[derive(Error, Debug)]
pub enum GateError {
    /// Configuration-related errors (settings, secret store, hash store).
    #[error("Configuration error: {kind}")]
    Config { kind: ConfigErrorKind },

    /// Authentication errors.
    #[error("Authentication error: {kind}")]
    Auth { kind: AuthErrorKind },

    /// Malformed request input.
    #[error("Invalid request: {message}")]
    Input { message: String },

    /// I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Configuration error kinds.
#[derive(Error, Debug)]
pub enum ConfigErrorKind {
    #[error("Failed to read {path}: {message}")]
    Unreadable { path: PathBuf, message: String },

    #[error("Failed to parse {path}: {message}")]
    Malformed { path: PathBuf, message: String },

    #[error("Invalid setting '{setting}': {message}")]
    InvalidSetting { setting: String, message: String },

    #[error("Secret '{key}' is not configured")]
    MissingSecret { key: String },

    #[error("System clock error: {message}")]
    Clock { message: String },
}

/// Authentication error kinds.
///
/// These are for server-side diagnostics only. Clients always see a fixed
/// denial message regardless of the kind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthErrorKind {
    #[error("Missing header {name}")]
    MissingHeader { name: &'static str },

    #[error("Malformed timestamp")]
    MalformedTimestamp,

    #[error("Request expired: skew {skew_seconds}s exceeds maximum")]
    RequestExpired { skew_seconds: u64 },

    #[error("Missing multipart field {field}")]
    MissingField { field: &'static str },

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token not found")]
    TokenNotFound,
}

impl GateError {
    /// Stable machine-readable code for responses and the audit log.
    pub fn code(&self) -> &'static str {
        match self {
            GateError::Config { .. } => "CONFIG_ERROR",
            GateError::Auth { .. } => "AUTH_ERROR",
            GateError::Input { .. } => "INPUT_ERROR",
            GateError::Io(_) => "IO_ERROR",
            GateError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    pub(crate) fn auth(kind: AuthErrorKind) -> Self {
        GateError::Auth { kind }
    }

    pub(crate) fn invalid_setting(setting: impl Into<String>, message: impl Into<String>) -> Self {
        GateError::Config {
            kind: ConfigErrorKind::InvalidSetting {
                setting: setting.into(),
                message: message.into(),
            },
        }
    }
}

/// Result type alias for gate operations.
pub type GateResult<T> = Result<T, GateError>;
