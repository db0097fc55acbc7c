//! Vault module: encrypted long-term credential storage.
//!
//! This module provides:
//! - The JSON container format, payload types and atomic writes (`format`)
//! - The `<vault>.lock` cross-process lock (`lock`)
//! - `VaultStore` and `VaultSession` for initializing, opening and
//!   mutating a vault (`store`)

pub mod format;
pub mod lock;
pub mod store;

// Re-export the most commonly used items.
pub use format::{ProfileSecret, VaultContainer, VaultPayload, CURRENT_VERSION};
pub use lock::LockHandle;
pub use store::{VaultSession, VaultStore};
