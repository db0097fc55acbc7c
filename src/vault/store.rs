//! High-level vault operations used by CLI commands.
//!
//! `VaultStore` creates and opens vault files; an open vault is a
//! `VaultSession`, which holds the cross-process lock and the password
//! for as long as it lives.  Every session operation re-reads the
//! container from disk, and every mutation goes through a full
//! decrypt, mutate, re-encrypt (fresh salt and nonce), atomic replace
//! cycle.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::errors::{CawsError, Result};

use super::format::{self, ProfileSecret, VaultPayload};
use super::lock::LockHandle;

/// Entry point for creating and opening vault files.
pub struct VaultStore;

impl VaultStore {
    /// Create a brand-new, empty vault at `path`.
    ///
    /// Fails with `VaultAlreadyExists` if a file is already there.  The
    /// parent directory is created with owner-only permissions if needed.
    pub fn initialize(path: &Path, password: &str) -> Result<()> {
        if path.exists() {
            return Err(CawsError::VaultAlreadyExists(path.to_path_buf()));
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            create_private_dir(parent)?;
        }

        let lock = LockHandle::acquire(path)?;

        // Re-check under the lock: another process may have won the race.
        if path.exists() {
            lock.release()?;
            return Err(CawsError::VaultAlreadyExists(path.to_path_buf()));
        }

        let container = format::encrypt_payload(password.as_bytes(), &VaultPayload::default())?;
        format::write_container_atomic(path, &container)?;
        lock.release()?;

        info!(vault = %path.display(), "vault initialized");
        Ok(())
    }

    /// Open an existing vault with a known password.
    pub fn open(path: &Path, password: &str) -> Result<VaultSession> {
        Self::open_with(path, || Ok(Zeroizing::new(password.to_string())))
    }

    /// Open an existing vault, asking `password_source` for the password
    /// only once the lock is held.
    ///
    /// A contended vault fails before `password_source` is ever called,
    /// so the user is not prompted for a password they cannot use yet.
    /// The password is verified by decrypting the container once.
    pub fn open_with<F>(path: &Path, password_source: F) -> Result<VaultSession>
    where
        F: FnOnce() -> Result<Zeroizing<String>>,
    {
        if !path.exists() {
            return Err(CawsError::VaultNotFound(path.to_path_buf()));
        }

        let lock = LockHandle::acquire(path)?;

        // On any error below, `lock` is dropped and the marker removed.
        let password = password_source()?;
        let container = format::read_container(path)?;
        format::decrypt_payload(password.as_bytes(), &container)?;

        debug!(vault = %path.display(), "vault session opened");
        Ok(VaultSession {
            path: path.to_path_buf(),
            password,
            lock: Some(lock),
        })
    }
}

/// An unlocked vault.
///
/// Holds the lock marker and the password; both are released when the
/// session is closed or dropped, and the password buffer is zeroed.
pub struct VaultSession {
    path: PathBuf,
    password: Zeroizing<String>,
    lock: Option<LockHandle>,
}

impl std::fmt::Debug for VaultSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultSession")
            .field("path", &self.path)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl VaultSession {
    // ------------------------------------------------------------------
    // Profile operations
    // ------------------------------------------------------------------

    /// Return the stored credentials for `profile`.
    pub fn get(&self, profile: &str) -> Result<ProfileSecret> {
        let payload = self.load()?;
        payload
            .profiles
            .get(profile)
            .cloned()
            .ok_or_else(|| CawsError::ProfileNotFound(profile.to_string()))
    }

    /// Insert or overwrite the credentials for `profile`.
    pub fn put(&self, profile: &str, secret: ProfileSecret) -> Result<()> {
        let mut payload = self.load()?;
        payload.profiles.insert(profile.to_string(), secret);
        self.save(&payload)?;
        info!(profile, "profile stored in vault");
        Ok(())
    }

    /// Remove `profile`.  Fails with `ProfileNotFound` if absent.
    pub fn remove(&self, profile: &str) -> Result<()> {
        let mut payload = self.load()?;
        if payload.profiles.remove(profile).is_none() {
            return Err(CawsError::ProfileNotFound(profile.to_string()));
        }
        self.save(&payload)?;
        info!(profile, "profile removed from vault");
        Ok(())
    }

    /// All profile names, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        Ok(self.load()?.profiles.keys().cloned().collect())
    }

    /// Returns `true` if the vault has an entry for `profile`.
    pub fn contains(&self, profile: &str) -> Result<bool> {
        Ok(self.load()?.profiles.contains_key(profile))
    }

    /// Returns the path to the vault file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock and wipe the password.
    pub fn close(mut self) -> Result<()> {
        match self.lock.take() {
            Some(lock) => lock.release(),
            None => Ok(()),
        }
        // `password` is zeroized when `self` drops here.
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    fn load(&self) -> Result<VaultPayload> {
        let container = format::read_container(&self.path)?;
        format::decrypt_payload(self.password.as_bytes(), &container)
    }

    fn save(&self, payload: &VaultPayload) -> Result<()> {
        let container = format::encrypt_payload(self.password.as_bytes(), payload)?;
        format::write_container_atomic(&self.path, &container)?;
        debug!(vault = %self.path.display(), "vault committed");
        Ok(())
    }
}

/// Create `dir` (and parents) and restrict it to the owner.
fn create_private_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        return Ok(());
    }
    fs::create_dir_all(dir).map_err(|e| CawsError::io_at("failed to create vault directory", e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(dir, fs::Permissions::from_mode(0o700))
            .map_err(|e| CawsError::io_at("failed to set vault directory permissions", e))?;
    }

    Ok(())
}
