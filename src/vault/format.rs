//! On-disk vault container and its decrypted payload.
//!
//! A vault file is a small JSON document:
//!
//! ```text
//! { "version": 1, "salt": "<base64 32 bytes>", "nonce": "<base64 12 bytes>", "data": "<base64 ciphertext+tag>" }
//! ```
//!
//! `data` is the AES-256-GCM encryption of the JSON payload
//! `{ "profiles": { "<name>": { "access_key": "...", "secret_key": "..." } } }`
//! under a key derived from the password and `salt`.  Salt and nonce are
//! drawn fresh on every encryption.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::{self, NONCE_LEN, SALT_LEN};
use crate::errors::{CawsError, Result};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// The only container version this build reads or writes.
pub const CURRENT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The encrypted container exactly as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultContainer {
    pub version: u32,

    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub salt: Vec<u8>,

    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub nonce: Vec<u8>,

    /// Ciphertext with the authentication tag appended.
    #[serde(
        rename = "data",
        serialize_with = "base64_encode",
        deserialize_with = "base64_decode"
    )]
    pub ciphertext: Vec<u8>,
}

/// Long-term credentials stored for one profile.
///
/// Both fields are wiped when the value is dropped.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct ProfileSecret {
    pub access_key: String,
    pub secret_key: String,
}

impl ProfileSecret {
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }
}

impl fmt::Debug for ProfileSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProfileSecret")
            .field("access_key", &self.access_key)
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}

/// Decrypted vault contents.  Only ever held in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultPayload {
    #[serde(default)]
    pub profiles: BTreeMap<String, ProfileSecret>,
}

// ---------------------------------------------------------------------------
// Encrypt / decrypt
// ---------------------------------------------------------------------------

/// Serialize and encrypt `payload` under `password`.
///
/// Draws a new salt and a new nonce on every call, so encrypting the
/// same payload twice never yields the same container.
pub fn encrypt_payload(password: &[u8], payload: &VaultPayload) -> Result<VaultContainer> {
    let salt = crypto::generate_salt();
    let nonce = crypto::generate_nonce();
    let key = crypto::derive_key(password, &salt)?;

    let plaintext = zeroize::Zeroizing::new(
        serde_json::to_vec(payload)
            .map_err(|e| CawsError::SerializationError(format!("vault payload: {e}")))?,
    );

    let ciphertext = crypto::seal(&key, &nonce, &plaintext)?;

    Ok(VaultContainer {
        version: CURRENT_VERSION,
        salt: salt.to_vec(),
        nonce: nonce.to_vec(),
        ciphertext,
    })
}

/// Decrypt `container` with `password` and parse the payload.
///
/// Every failure (unsupported version, malformed salt or nonce,
/// authentication failure, bad payload JSON) is reported as
/// `IncorrectPasswordOrCorrupted`.
pub fn decrypt_payload(password: &[u8], container: &VaultContainer) -> Result<VaultPayload> {
    if container.version != CURRENT_VERSION {
        tracing::debug!(version = container.version, "unsupported vault version");
        return Err(CawsError::IncorrectPasswordOrCorrupted);
    }

    let salt: [u8; SALT_LEN] = container
        .salt
        .as_slice()
        .try_into()
        .map_err(|_| CawsError::IncorrectPasswordOrCorrupted)?;
    let nonce: [u8; NONCE_LEN] = container
        .nonce
        .as_slice()
        .try_into()
        .map_err(|_| CawsError::IncorrectPasswordOrCorrupted)?;

    let key = crypto::derive_key(password, &salt)?;
    let plaintext = crypto::open(&key, &nonce, &container.ciphertext)?;

    serde_json::from_slice(&plaintext).map_err(|_| CawsError::IncorrectPasswordOrCorrupted)
}

// ---------------------------------------------------------------------------
// File I/O
// ---------------------------------------------------------------------------

/// Read and parse the container at `path`.
///
/// A missing file is `VaultNotFound`; a file that is not a container is
/// `IncorrectPasswordOrCorrupted`.
pub fn read_container(path: &Path) -> Result<VaultContainer> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(CawsError::VaultNotFound(path.to_path_buf()));
        }
        Err(e) => return Err(CawsError::io_at("failed to read vault file", e)),
    };

    serde_json::from_slice(&data).map_err(|_| CawsError::IncorrectPasswordOrCorrupted)
}

/// Path of the temporary sibling used while replacing `path`.
pub fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Write `container` to the staging sibling of `path` and flush it.
///
/// The real vault file is untouched until `commit_staged` renames the
/// staged file over it.
pub fn stage_container(path: &Path, container: &VaultContainer) -> Result<PathBuf> {
    let bytes = serde_json::to_vec_pretty(container)
        .map_err(|e| CawsError::SerializationError(format!("vault container: {e}")))?;

    let tmp_path = staging_path(path);
    let mut file = open_owner_only(&tmp_path)
        .map_err(|e| CawsError::io_at("failed to create temporary vault file", e))?;
    file.write_all(&bytes)
        .and_then(|()| file.sync_all())
        .map_err(|e| CawsError::io_at("failed to write temporary vault file", e))?;

    Ok(tmp_path)
}

/// Atomically move a staged container into place.
pub fn commit_staged(tmp_path: &Path, path: &Path) -> Result<()> {
    if let Err(e) = fs::rename(tmp_path, path) {
        let _ = fs::remove_file(tmp_path);
        return Err(CawsError::io_at("failed to replace vault file", e));
    }
    Ok(())
}

/// Write a container to disk **atomically** (stage, then rename).
///
/// Readers see either the previous container or the new one, never a
/// partially written file.
pub fn write_container_atomic(path: &Path, container: &VaultContainer) -> Result<()> {
    let tmp_path = stage_container(path, container)?;
    commit_staged(&tmp_path, path)
}

/// Create or truncate `path` with owner-only read/write permissions.
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
        // A stale temp file from an earlier crash keeps its old mode.
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
        Ok(file)
    }

    #[cfg(not(unix))]
    {
        fs::File::create(path)
    }
}

// ---------------------------------------------------------------------------
// Serde helpers for base64-encoded Vec<u8> fields
// ---------------------------------------------------------------------------

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

fn base64_encode<S>(data: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let encoded = BASE64.encode(data);
    serializer.serialize_str(&encoded)
}

fn base64_decode<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    BASE64.decode(&s).map_err(serde::de::Error::custom)
}
