//! Cross-process vault lock.
//!
//! The lock is a sibling marker file `<vault-path>.lock`, created with
//! exclusive-create semantics and holding the owner's process id.
//! Acquisition never waits: if the marker exists and its owner is still
//! alive, `acquire` fails with `LockContended` straight away.
//!
//! A marker whose recorded process no longer exists is considered stale.
//! Reclaiming it happens under an `flock` on `<vault-path>.lock.reclaim`,
//! so two processes that both see the same dead owner cannot both remove
//! the marker.  The guard file is left in place; the kernel drops the
//! `flock` when its holder exits.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::errors::{CawsError, Result};

/// Path of the lock marker guarding `vault_path`.
pub fn lock_path(vault_path: &Path) -> PathBuf {
    with_suffix(vault_path, ".lock")
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// An acquired vault lock.  Released on `release` or when dropped.
#[derive(Debug)]
pub struct LockHandle {
    path: PathBuf,
    released: bool,
}

impl LockHandle {
    /// Try to take the lock for `vault_path`.
    pub fn acquire(vault_path: &Path) -> Result<Self> {
        let path = lock_path(vault_path);

        match create_marker(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                let owner_pid = read_owner(&path);
                match owner_pid {
                    Some(pid) if is_stale(pid) => reclaim(&path, pid)?,
                    _ => return Err(contended(&path, owner_pid)),
                }
            }
            Err(e) => return Err(CawsError::io_at("failed to create lock file", e)),
        }

        debug!(lock = %path.display(), "vault lock acquired");
        Ok(Self {
            path,
            released: false,
        })
    }

    /// Path of the marker file held by this handle.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the marker file.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        remove_marker(&self.path)?;
        debug!(lock = %self.path.display(), "vault lock released");
        Ok(())
    }
}

impl Drop for LockHandle {
    fn drop(&mut self) {
        if !self.released {
            let _ = fs::remove_file(&self.path);
            debug!(lock = %self.path.display(), "vault lock released on drop");
        }
    }
}

fn contended(path: &Path, owner_pid: Option<u32>) -> CawsError {
    CawsError::LockContended {
        lock_path: path.to_path_buf(),
        owner_pid,
    }
}

/// Create the marker exclusively and record our pid in it.
fn create_marker(path: &Path) -> std::io::Result<()> {
    create_marker_with(path, |file| writeln!(file, "{}", std::process::id()))
}

/// Create the marker exclusively and fill it with `write`.
///
/// If `write` fails the half-made marker is removed again.
fn create_marker_with<F>(path: &Path, write: F) -> std::io::Result<()>
where
    F: FnOnce(&mut fs::File) -> std::io::Result<()>,
{
    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    if let Err(e) = write(&mut file) {
        drop(file);
        let _ = fs::remove_file(path);
        return Err(e);
    }
    Ok(())
}

fn remove_marker(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(CawsError::io_at("failed to remove lock file", e)),
    }
}

/// Pid recorded in the marker, if it can be read and parsed.
fn read_owner(path: &Path) -> Option<u32> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}

/// Replace a marker left behind by `stale_pid` with our own.
///
/// Runs under the reclaim guard.  The marker is re-read there and only
/// removed if it still names `stale_pid`; a marker another process has
/// already taken over is reported as contended.
#[cfg(unix)]
fn reclaim(path: &Path, stale_pid: u32) -> Result<()> {
    let Some(_guard) = ReclaimGuard::try_acquire(path)? else {
        debug!(lock = %path.display(), "another process is reclaiming the lock");
        return Err(contended(path, Some(stale_pid)));
    };

    match read_owner(path) {
        Some(pid) if pid == stale_pid && is_stale(pid) => {
            warn!(lock = %path.display(), pid, "removing stale vault lock");
            remove_marker(path)?;
        }
        Some(pid) => return Err(contended(path, Some(pid))),
        // Gone, or just created and not yet written: let create_new decide.
        None => {}
    }

    create_marker(path).map_err(|e| match e.kind() {
        ErrorKind::AlreadyExists => contended(path, read_owner(path)),
        _ => CawsError::io_at("failed to create lock file", e),
    })
}

#[cfg(not(unix))]
fn reclaim(path: &Path, stale_pid: u32) -> Result<()> {
    Err(contended(path, Some(stale_pid)))
}

/// Non-blocking exclusive `flock` on `<lock>.reclaim`, held while alive.
#[cfg(unix)]
struct ReclaimGuard {
    _file: fs::File,
}

#[cfg(unix)]
impl ReclaimGuard {
    /// `Ok(None)` when another process holds the guard.
    fn try_acquire(lock_path: &Path) -> Result<Option<Self>> {
        use std::os::unix::fs::OpenOptionsExt;
        use std::os::unix::io::AsRawFd;

        let guard_path = with_suffix(lock_path, ".reclaim");
        let file = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .mode(0o600)
            .open(&guard_path)
            .map_err(|e| CawsError::io_at("failed to open lock reclaim guard", e))?;

        // SAFETY: the descriptor belongs to `file`, which outlives the call.
        let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
        if rc != 0 {
            let err = std::io::Error::last_os_error();
            if err.kind() == ErrorKind::WouldBlock {
                return Ok(None);
            }
            return Err(CawsError::io_at("failed to lock reclaim guard", err));
        }

        Ok(Some(Self { _file: file }))
    }
}

/// Whether the process that wrote the marker is gone.
///
/// Our own pid is never stale: a second session in this process must
/// see the lock as held.
#[cfg(unix)]
fn is_stale(pid: u32) -> bool {
    if pid == std::process::id() {
        return false;
    }
    let Ok(raw) = libc::pid_t::try_from(pid) else {
        return false;
    };
    if raw <= 0 {
        return false;
    }
    // SAFETY: signal 0 performs the existence and permission checks only.
    let rc = unsafe { libc::kill(raw, 0) };
    rc != 0 && std::io::Error::last_os_error().raw_os_error() == Some(libc::ESRCH)
}

#[cfg(not(unix))]
fn is_stale(_pid: u32) -> bool {
    false
}
