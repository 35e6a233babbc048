//! Configuration settings for the site gate.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{ConfigErrorKind, GateError};
use crate::validation::validate_domain;

/// Main configuration structure.
///
/// Loaded once at process start and shared read-only afterwards.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub domain_guard: DomainGuardConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub audit: AuditConfig,
}

/// Domain access token guard configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DomainGuardConfig {
    /// Path to the file holding the SHA-256 hash of the access token.
    #[serde(default = "default_hash_path")]
    pub hash_path: PathBuf,
    /// Parent domains on which the guard is installed.
    #[serde(default = "default_allowed_domains")]
    pub allowed_domains: Vec<String>,
    /// Lifetime of the access cookie in seconds.
    #[serde(default = "default_cookie_max_age")]
    pub cookie_max_age_seconds: u64,
}

/// Signed API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Path to the TOML secrets file holding `api_key`.
    #[serde(default = "default_secrets_path")]
    pub secrets_path: PathBuf,
    /// Maximum allowed distance between request timestamp and now.
    #[serde(default = "default_max_skew")]
    pub max_skew_seconds: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format ("pretty" or "json").
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Audit logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    /// Whether audit logging is enabled.
    #[serde(default)]
    pub enabled: bool,
    /// Path to the audit log file.
    #[serde(default = "default_audit_log_path")]
    pub log_path: PathBuf,
}

// Default value functions
fn default_hash_path() -> PathBuf {
    PathBuf::from("/var/www/html/wp-content/mu-plugins/.hash_data")
}

fn default_allowed_domains() -> Vec<String> {
    [
        "hp-standard.net",
        "hp-standard.com",
        "hp-standard.info",
        "sv511.com",
        "sv533.com",
        "hp-standard.xyz",
    ]
    .iter()
    .map(|d| d.to_string())
    .collect()
}

fn default_cookie_max_age() -> u64 {
    31_536_000 // one year
}

fn default_secrets_path() -> PathBuf {
    PathBuf::from("/var/www/html/wp-content/secret-config.toml")
}

fn default_max_skew() -> u64 {
    300
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_audit_log_path() -> PathBuf {
    PathBuf::from("/var/log/sitegate/audit.log")
}

impl Default for DomainGuardConfig {
    fn default() -> Self {
        Self {
            hash_path: default_hash_path(),
            allowed_domains: default_allowed_domains(),
            cookie_max_age_seconds: default_cookie_max_age(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            secrets_path: default_secrets_path(),
            max_skew_seconds: default_max_skew(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_path: default_audit_log_path(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, GateError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| GateError::Config {
            kind: ConfigErrorKind::Unreadable {
                path: path.to_path_buf(),
                message: e.to_string(),
            },
        })?;

        Self::from_toml_str(&content).map_err(|e| match e {
            GateError::Config {
                kind: ConfigErrorKind::Malformed { message, .. },
            } => GateError::Config {
                kind: ConfigErrorKind::Malformed {
                    path: path.to_path_buf(),
                    message,
                },
            },
            other => other,
        })
    }

    /// Parse and validate settings from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, GateError> {
        let settings: Settings = toml::from_str(content).map_err(|e| GateError::Config {
            kind: ConfigErrorKind::Malformed {
                path: PathBuf::new(),
                message: e.to_string(),
            },
        })?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate the settings.
    fn validate(&self) -> Result<(), GateError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(GateError::invalid_setting(
                "logging.level",
                format!(
                    "'{}' is not one of {:?}",
                    self.logging.level, valid_levels
                ),
            ));
        }

        let valid_formats = ["pretty", "json"];
        if !valid_formats.contains(&self.logging.format.to_lowercase().as_str()) {
            return Err(GateError::invalid_setting(
                "logging.format",
                format!(
                    "'{}' is not one of {:?}",
                    self.logging.format, valid_formats
                ),
            ));
        }

        for domain in &self.domain_guard.allowed_domains {
            validate_domain(domain).map_err(|e| {
                GateError::invalid_setting("domain_guard.allowed_domains", e.to_string())
            })?;
        }

        if self.api.max_skew_seconds == 0 {
            return Err(GateError::invalid_setting(
                "api.max_skew_seconds",
                "must be greater than zero",
            ));
        }

        Ok(())
    }
}
