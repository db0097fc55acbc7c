//! Resolution of on-disk locations.
//!
//! `CAWS_TEST_DIR` pins everything under one directory.  Otherwise the
//! XDG base directories are used, falling back to the usual locations
//! under the home directory.

use std::ffi::OsString;
use std::path::PathBuf;

use crate::errors::{CawsError, Result};

/// Where caws keeps its files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    /// Encrypted vault container.
    pub vault: PathBuf,
    /// Directory of per-profile credential cache files.
    pub cache_dir: PathBuf,
    /// `config.toml` with `Settings`.
    pub settings: PathBuf,
    /// Plaintext AWS config holding region and MFA serial per profile.
    pub aws_config: PathBuf,
}

impl Paths {
    /// Resolve paths from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::resolve(|key| std::env::var_os(key), dirs::home_dir())
    }

    /// Resolve paths using `var` to look up environment variables.
    pub fn resolve<F>(var: F, home: Option<PathBuf>) -> Result<Self>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let non_empty = |key: &str| var(key).filter(|v| !v.is_empty()).map(PathBuf::from);

        if let Some(test_dir) = non_empty("CAWS_TEST_DIR") {
            return Ok(Self {
                vault: test_dir.join("vault.enc"),
                cache_dir: test_dir.join("cache"),
                settings: test_dir.join("config.toml"),
                aws_config: non_empty("AWS_CONFIG_FILE")
                    .unwrap_or_else(|| test_dir.join("aws-config")),
            });
        }

        let home = home.ok_or_else(|| {
            CawsError::ConfigError("could not determine the home directory".into())
        })?;

        let data_home = non_empty("XDG_DATA_HOME").unwrap_or_else(|| home.join(".local/share"));
        let cache_home = non_empty("XDG_CACHE_HOME").unwrap_or_else(|| home.join(".cache"));
        let config_home = non_empty("XDG_CONFIG_HOME").unwrap_or_else(|| home.join(".config"));

        Ok(Self {
            vault: data_home.join("caws").join("vault.enc"),
            cache_dir: cache_home.join("caws"),
            settings: config_home.join("caws").join("config.toml"),
            aws_config: non_empty("AWS_CONFIG_FILE")
                .unwrap_or_else(|| home.join(".aws").join("config")),
        })
    }
}
