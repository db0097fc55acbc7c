//! Short-lived credential cache.
//!
//! Temporary credentials returned by the token service are kept in
//! `<cache-dir>/<profile>.json`, one slot per profile.  Both credential
//! kinds share that slot: a reader that needs a different kind than the
//! one stored treats the entry as a miss, regenerates, and overwrites.
//!
//! Reads are never errors.  A missing file, a file that does not parse
//! (including a torn concurrent write), or an entry within five minutes
//! of expiring all come back as `None`.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::errors::{CawsError, Result};

/// Margin subtracted from the nominal expiration before an entry is used.
pub const SAFETY_BUFFER_SECS: i64 = 5 * 60;

/// `SAFETY_BUFFER_SECS` as a `Duration`.
pub fn safety_buffer() -> Duration {
    Duration::seconds(SAFETY_BUFFER_SECS)
}

/// Which token-service call produced the credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialKind {
    /// Session token, used to run commands.
    Session,
    /// Federation token, used for console sign-in.
    Federation,
}

impl std::fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Session => f.write_str("session"),
            Self::Federation => f.write_str("federation"),
        }
    }
}

/// Temporary credentials plus their expiry.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct CacheEntry {
    #[serde(rename = "AccessKeyId")]
    pub access_key_id: String,

    #[serde(rename = "SecretAccessKey")]
    pub secret_access_key: String,

    #[serde(rename = "SessionToken")]
    pub session_token: String,

    #[serde(rename = "Expiration")]
    #[zeroize(skip)]
    pub expiration: DateTime<Utc>,

    #[serde(rename = "Region", default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    #[serde(rename = "Type")]
    #[zeroize(skip)]
    pub kind: CredentialKind,
}

impl CacheEntry {
    /// Whether the entry can still be handed out at `now`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now + safety_buffer() < self.expiration
    }
}

impl std::fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheEntry")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .field("session_token", &"[REDACTED]")
            .field("expiration", &self.expiration)
            .field("region", &self.region)
            .field("kind", &self.kind)
            .finish()
    }
}

/// Per-profile cache rooted at a directory.
#[derive(Debug, Clone)]
pub struct CredentialCache {
    dir: PathBuf,
}

impl CredentialCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the cache files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the cache file for `profile`.
    pub fn entry_path(&self, profile: &str) -> PathBuf {
        self.dir.join(format!("{profile}.json"))
    }

    /// Read a still-valid entry for `profile`, whatever its kind.
    pub fn read(&self, profile: &str) -> Option<CacheEntry> {
        self.read_at(profile, Utc::now())
    }

    /// Read a still-valid entry of the given kind.
    ///
    /// An entry of the other kind is reported as a miss.
    pub fn read_kind(&self, profile: &str, kind: CredentialKind) -> Option<CacheEntry> {
        let entry = self.read(profile)?;
        if entry.kind != kind {
            debug!(profile, cached = %entry.kind, wanted = %kind, "cache kind mismatch");
            return None;
        }
        Some(entry)
    }

    /// `read` with an explicit clock.
    pub fn read_at(&self, profile: &str, now: DateTime<Utc>) -> Option<CacheEntry> {
        let path = self.entry_path(profile);

        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) => {
                if e.kind() != ErrorKind::NotFound {
                    debug!(profile, error = %e, "cache file unreadable");
                }
                debug!(profile, "cache miss");
                return None;
            }
        };

        let entry: CacheEntry = match serde_json::from_slice(&data) {
            Ok(entry) => entry,
            Err(e) => {
                debug!(profile, error = %e, "cache file does not parse, treating as miss");
                return None;
            }
        };

        if !entry.is_valid_at(now) {
            debug!(profile, expiration = %entry.expiration, "cached credentials expired");
            return None;
        }

        debug!(profile, kind = %entry.kind, "cache hit");
        Some(entry)
    }

    /// Persist `entry` as the cache slot for `profile`.
    ///
    /// Creates the cache directory (0700) if needed and writes the file
    /// with mode 0600.  Entries that have already expired are rejected.
    pub fn write(&self, profile: &str, entry: &CacheEntry) -> Result<()> {
        if entry.expiration <= Utc::now() {
            return Err(CawsError::InvalidCacheEntry(format!(
                "credentials for '{profile}' expired at {}",
                entry.expiration.to_rfc3339()
            )));
        }

        self.ensure_dir()?;

        let data = serde_json::to_vec_pretty(entry)
            .map_err(|e| CawsError::SerializationError(format!("cache entry: {e}")))?;

        let path = self.entry_path(profile);
        let mut file = open_owner_only(&path)
            .map_err(|e| CawsError::io_at("failed to open cache file", e))?;
        file.write_all(&data)
            .map_err(|e| CawsError::io_at("failed to write cache file", e))?;

        debug!(profile, kind = %entry.kind, "credentials cached");
        Ok(())
    }

    /// Delete the cache slot for `profile`.  A missing file is fine.
    pub fn invalidate(&self, profile: &str) -> Result<()> {
        match fs::remove_file(self.entry_path(profile)) {
            Ok(()) => {
                debug!(profile, "cache entry invalidated");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CawsError::io_at("failed to remove cache file", e)),
        }
    }

    fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| CawsError::io_at("failed to create cache directory", e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.dir, fs::Permissions::from_mode(0o700))
                .map_err(|e| CawsError::io_at("failed to set cache directory permissions", e))?;
        }

        Ok(())
    }
}

fn open_owner_only(path: &Path) -> std::io::Result<fs::File> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
        let file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)?;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
        Ok(file)
    }

    #[cfg(not(unix))]
    {
        fs::File::create(path)
    }
}
