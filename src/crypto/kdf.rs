//! Password-based key derivation using Argon2id.
//!
//! Argon2id is a memory-hard KDF that protects against brute-force and
//! GPU-based attacks.  The parameters are fixed properties of the vault
//! format: a container carries no KDF settings, so every vault ever
//! written must be openable with exactly these values.

use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;

use super::keys::{DerivedKey, KEY_LEN};
use crate::errors::{CawsError, Result};

/// Length of the salt in bytes (256 bits).
pub const SALT_LEN: usize = 32;

/// Argon2id memory cost in KiB (64 MiB).
pub const MEMORY_KIB: u32 = 64 * 1024;

/// Argon2id iteration count.
pub const ITERATIONS: u32 = 1;

/// Argon2id parallelism lanes.
pub const PARALLELISM: u32 = 4;

/// Derive a 32-byte key from a password and salt using Argon2id.
///
/// The same password + salt will always produce the same key.  The
/// function has no side effects and may be called from several threads
/// at once.
pub fn derive_key(password: &[u8], salt: &[u8; SALT_LEN]) -> Result<DerivedKey> {
    let params = Params::new(MEMORY_KIB, ITERATIONS, PARALLELISM, Some(KEY_LEN))
        .map_err(|e| CawsError::KeyDerivationFailed(format!("invalid Argon2 params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = DerivedKey::zeroed();
    argon2
        .hash_password_into(password, salt, key.as_mut_bytes())
        .map_err(|e| CawsError::KeyDerivationFailed(format!("Argon2id hashing failed: {e}")))?;

    Ok(key)
}

/// Generate a cryptographically random 32-byte salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    salt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_salt_is_random() {
        assert_ne!(generate_salt(), generate_salt());
    }

    #[test]
    fn derive_key_changes_with_single_salt_bit() {
        let salt = [7u8; SALT_LEN];
        let mut flipped = salt;
        flipped[SALT_LEN - 1] ^= 0x01;

        let k1 = derive_key(b"pw", &salt).unwrap();
        let k2 = derive_key(b"pw", &flipped).unwrap();
        assert_ne!(k1.as_bytes(), k2.as_bytes());
    }
}
