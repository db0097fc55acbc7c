use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur in caws.
#[derive(Debug, Error)]
pub enum CawsError {
    // --- Crypto errors ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    // --- Vault errors ---
    #[error("Vault not found at {0}\nRun `caws init` to create a new vault")]
    VaultNotFound(PathBuf),

    #[error("Vault already exists at {0}")]
    VaultAlreadyExists(PathBuf),

    /// Covers a wrong password, a truncated or tampered file, and an
    /// unsupported format version alike.
    #[error("Incorrect password or corrupted vault")]
    IncorrectPasswordOrCorrupted,

    #[error("Profile '{0}' not found in vault")]
    ProfileNotFound(String),

    #[error("Vault is locked by another process{} (lock file: {})", owner_suffix(.owner_pid), .lock_path.display())]
    LockContended {
        lock_path: PathBuf,
        owner_pid: Option<u32>,
    },

    // --- Cache errors ---
    #[error("Invalid cache entry: {0}")]
    InvalidCacheEntry(String),

    // --- Token service errors ---
    #[error("Token service error: {0}")]
    TokenService(String),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    #[error("Invalid profile name: {0}")]
    InvalidProfileName(String),

    #[error("Invalid access key: {0}")]
    InvalidAccessKey(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{context}: {source}")]
    IoAt {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("Child process exited with code {0}")]
    ChildProcessFailed(i32),
}

impl CawsError {
    /// Wrap an I/O error with a short description of what was attempted.
    pub fn io_at(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::IoAt {
            context: context.into(),
            source,
        }
    }
}

fn owner_suffix(pid: &Option<u32>) -> String {
    pid.map(|p| format!(" (pid {p})")).unwrap_or_default()
}

/// Convenience type alias for caws results.
pub type Result<T> = std::result::Result<T, CawsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_contended_mentions_owner_pid() {
        let err = CawsError::LockContended {
            lock_path: PathBuf::from("/tmp/vault.enc.lock"),
            owner_pid: Some(4242),
        };
        let msg = err.to_string();
        assert!(msg.contains("pid 4242"));
        assert!(msg.contains("/tmp/vault.enc.lock"));
    }

    #[test]
    fn lock_contended_without_pid() {
        let err = CawsError::LockContended {
            lock_path: PathBuf::from("v.lock"),
            owner_pid: None,
        };
        assert_eq!(
            err.to_string(),
            "Vault is locked by another process (lock file: v.lock)"
        );
    }

    #[test]
    fn decrypt_failure_message_is_undifferentiated() {
        assert_eq!(
            CawsError::IncorrectPasswordOrCorrupted.to_string(),
            "Incorrect password or corrupted vault"
        );
    }
}
