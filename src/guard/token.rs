//! Access token hashing and the persisted token hash.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use ring::digest;
use subtle::ConstantTimeEq;
use tracing::{debug, info, warn};

use crate::error::{ConfigErrorKind, GateError, GateResult};

/// Lowercase hex SHA-256 of `input`.
pub fn sha256_hex(input: &[u8]) -> String {
    hex::encode(digest::digest(&digest::SHA256, input))
}

/// Hash of an access token, as stored in the hash file and the cookie.
pub fn hash_token(token: &str) -> String {
    sha256_hex(token.as_bytes())
}

/// Per-site access token: `sha256_hex(domain + phrase)`.
///
/// The plaintext token is handed to the site owner; only its hash is
/// deployed next to the site.
pub fn derive_site_token(domain: &str, phrase: &str) -> String {
    sha256_hex(format!("{}{}", domain, phrase).as_bytes())
}

/// The provisioned hash the guard compares against.
#[derive(Clone, PartialEq, Eq)]
pub struct StoredSecretHash(Vec<u8>);

impl StoredSecretHash {
    /// Wrap raw hash bytes. Trailing ASCII whitespace is stripped.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        let mut bytes = bytes.into();
        while bytes.last().is_some_and(|b| b.is_ascii_whitespace()) {
            bytes.pop();
        }
        Self(bytes)
    }

    /// Stored hash for a plaintext token.
    pub fn for_token(token: &str) -> Self {
        Self::new(hash_token(token))
    }

    /// Constant-time equality against a candidate hash.
    pub fn matches(&self, candidate: &[u8]) -> bool {
        // ct_eq returns false without inspecting contents when lengths differ.
        !self.0.is_empty() && bool::from(self.0.as_slice().ct_eq(candidate))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for StoredSecretHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StoredSecretHash({} bytes)", self.0.len())
    }
}

/// Durable storage for the token hash.
pub trait HashStore {
    /// Read the hash. `Ok(None)` means no token is provisioned.
    fn load(&self) -> GateResult<Option<StoredSecretHash>>;
}

/// Token hash kept in a single file.
#[derive(Debug, Clone)]
pub struct FileHashStore {
    path: PathBuf,
}

impl FileHashStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the hash file, replacing any existing one.
    ///
    /// On unix the file ends up mode 0644: the web server user must be able
    /// to read it.
    pub fn provision(&self, hash: &str) -> GateResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                debug!(path = %parent.display(), "Creating hash store directory");
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)?;
        file.write_all(hash.as_bytes())?;
        file.sync_all()?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o644))?;
        }

        info!(path = %self.path.display(), "Access token hash provisioned");
        Ok(())
    }

    /// Delete the hash file. Missing files are not an error.
    pub fn remove(&self) -> GateResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                info!(path = %self.path.display(), "Access token hash removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl HashStore for FileHashStore {
    fn load(&self) -> GateResult<Option<StoredSecretHash>> {
        match std::fs::read(&self.path) {
            Ok(bytes) => {
                let hash = StoredSecretHash::new(bytes);
                if hash.as_bytes().is_empty() {
                    warn!(path = %self.path.display(), "Access token hash file is empty");
                    return Ok(None);
                }
                Ok(Some(hash))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %self.path.display(), "Access token hash file not found");
                Ok(None)
            }
            Err(e) => Err(GateError::Config {
                kind: ConfigErrorKind::Unreadable {
                    path: self.path.clone(),
                    message: e.to_string(),
                },
            }),
        }
    }
}
