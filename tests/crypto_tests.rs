//! Integration tests for the caws crypto module.

use caws::crypto::{derive_key, generate_nonce, generate_salt, open, seal, DerivedKey};
use caws::errors::CawsError;

// ---------------------------------------------------------------------------
// Key derivation
// ---------------------------------------------------------------------------

#[test]
fn derive_key_is_deterministic() {
    let salt = [7u8; 32];

    let k1 = derive_key(b"correct horse", &salt).expect("derive 1");
    let k2 = derive_key(b"correct horse", &salt).expect("derive 2");

    assert_eq!(k1.as_bytes(), k2.as_bytes());
}

#[test]
fn derive_key_depends_on_password_and_salt() {
    let salt_a = [1u8; 32];
    let salt_b = [2u8; 32];

    let base = derive_key(b"password-1", &salt_a).unwrap();
    let other_pw = derive_key(b"password-2", &salt_a).unwrap();
    let other_salt = derive_key(b"password-1", &salt_b).unwrap();

    assert_ne!(base.as_bytes(), other_pw.as_bytes());
    assert_ne!(base.as_bytes(), other_salt.as_bytes());
}

#[test]
fn empty_password_still_derives() {
    let key = derive_key(b"", &generate_salt()).expect("empty password is allowed");
    assert_eq!(key.as_bytes().len(), 32);
}

// ---------------------------------------------------------------------------
// Seal / open
// ---------------------------------------------------------------------------

#[test]
fn seal_open_roundtrip() {
    let key = DerivedKey::new([0xABu8; 32]);
    let nonce = generate_nonce();
    let plaintext = br#"{"profiles":{}}"#;

    let ciphertext = seal(&key, &nonce, plaintext).expect("seal should succeed");

    // Ciphertext carries a 16-byte tag.
    assert_eq!(ciphertext.len(), plaintext.len() + 16);

    let recovered = open(&key, &nonce, &ciphertext).expect("open should succeed");
    assert_eq!(recovered.as_slice(), plaintext);
}

#[test]
fn open_with_wrong_key_fails_closed() {
    let key = DerivedKey::new([0x11u8; 32]);
    let wrong = DerivedKey::new([0x22u8; 32]);
    let nonce = generate_nonce();

    let ciphertext = seal(&key, &nonce, b"secret").unwrap();
    let result = open(&wrong, &nonce, &ciphertext);

    assert!(matches!(result, Err(CawsError::IncorrectPasswordOrCorrupted)));
}

#[test]
fn open_with_flipped_bit_fails() {
    let key = DerivedKey::new([0x33u8; 32]);
    let nonce = generate_nonce();

    let mut ciphertext = seal(&key, &nonce, b"secret").unwrap();
    ciphertext[0] ^= 0x01;

    assert!(open(&key, &nonce, &ciphertext).is_err());
}

// ---------------------------------------------------------------------------
// Randomness
// ---------------------------------------------------------------------------

#[test]
fn salts_and_nonces_are_fresh() {
    assert_ne!(generate_salt(), generate_salt());
    assert_ne!(generate_nonce(), generate_nonce());
}
