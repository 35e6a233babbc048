//! Secret configuration store.
//!
//! A flat TOML table of string secrets (`api_key`, `webhook_url`, ...).
//! A missing file or key is a valid state and yields `None`.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{error, warn};

use crate::error::{ConfigErrorKind, GateError};

/// Key under which the HMAC shared secret is stored.
pub const API_KEY: &str = "api_key";

/// Shared secret used to sign API requests.
///
/// Debug output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a secret. Returns `None` for an empty or whitespace-only value.
    pub fn new(secret: impl Into<String>) -> Option<Self> {
        let secret = secret.into();
        if secret.trim().is_empty() {
            None
        } else {
            Some(Self(secret))
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey([REDACTED])")
    }
}

/// Secrets loaded from the secret configuration file.
#[derive(Clone, Default)]
pub struct SecretConfig {
    values: BTreeMap<String, String>,
    source: Option<PathBuf>,
}

impl SecretConfig {
    /// Load secrets from a TOML file.
    ///
    /// A missing file is logged and produces an empty store. A file that
    /// exists but cannot be read or parsed is an error.
    pub fn load(path: &Path) -> Result<Self, GateError> {
        if !path.exists() {
            error!(path = %path.display(), "Secret config file not found");
            return Ok(Self::default());
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Ok(metadata) = std::fs::metadata(path) {
                let mode = metadata.permissions().mode();
                if mode & 0o077 != 0 {
                    warn!(
                        path = %path.display(),
                        mode = format!("{:04o}", mode & 0o777),
                        "Secret config file is readable by group or others"
                    );
                }
            }
        }

        let content = std::fs::read_to_string(path).map_err(|e| GateError::Config {
            kind: ConfigErrorKind::Unreadable {
                path: path.to_path_buf(),
                message: e.to_string(),
            },
        })?;

        let mut secrets = Self::from_toml_str(&content).map_err(|e| match e {
            GateError::Config {
                kind: ConfigErrorKind::Malformed { message, .. },
            } => GateError::Config {
                kind: ConfigErrorKind::Malformed {
                    path: path.to_path_buf(),
                    message,
                },
            },
            other => other,
        })?;
        secrets.source = Some(path.to_path_buf());
        Ok(secrets)
    }

    /// Parse secrets from TOML text. Non-string values are ignored.
    pub fn from_toml_str(content: &str) -> Result<Self, GateError> {
        let table: toml::Table = content.parse().map_err(|e: toml::de::Error| GateError::Config {
            kind: ConfigErrorKind::Malformed {
                path: PathBuf::new(),
                message: e.to_string(),
            },
        })?;

        let values = table
            .into_iter()
            .filter_map(|(k, v)| match v {
                toml::Value::String(s) => Some((k, s)),
                _ => None,
            })
            .collect();

        Ok(Self {
            values,
            source: None,
        })
    }

    /// Look up a secret by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// The HMAC API key, if configured and non-empty.
    pub fn api_key(&self) -> Option<ApiKey> {
        let key = self.get(API_KEY).and_then(ApiKey::new);
        if key.is_none() {
            error!(source = ?self.source, "api_key not configured");
        }
        key
    }

    /// Path the secrets were loaded from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

impl fmt::Debug for SecretConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretConfig")
            .field("keys", &self.values.keys().collect::<Vec<_>>())
            .field("source", &self.source)
            .finish()
    }
}
