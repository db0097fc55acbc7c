//! Token service: exchanges long-term keys for temporary credentials.
//!
//! The vault and cache only depend on the `TokenService` trait and the
//! `CacheEntry` it returns.  `AwsCliTokenService` is the production
//! implementation; tests substitute their own.

pub mod aws_cli;
pub mod console;

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::cache::CacheEntry;
use crate::errors::Result;

pub use aws_cli::AwsCliTokenService;
pub use console::{console_login_url, login_url};

/// Long-term keys from the vault merged with the profile's settings.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct LongTermCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
    pub mfa_serial: Option<String>,
}

impl fmt::Debug for LongTermCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LongTermCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .field("region", &self.region)
            .field("mfa_serial", &self.mfa_serial)
            .finish()
    }
}

/// Something that can mint temporary credentials.
pub trait TokenService {
    /// Session credentials for running commands.  `mfa_code` is required
    /// when `creds.mfa_serial` is set.
    fn session_token(
        &self,
        creds: &LongTermCredentials,
        duration_secs: u32,
        mfa_code: Option<&str>,
    ) -> Result<CacheEntry>;

    /// Federation credentials for console sign-in.
    fn federation_token(
        &self,
        creds: &LongTermCredentials,
        duration_secs: u32,
        name: &str,
    ) -> Result<CacheEntry>;
}
