//! Credential broker: cache first, vault and token service on a miss.
//!
//! `obtain` never opens the vault when the cache already holds usable
//! credentials of the right kind, so a warm cache needs no password.

use std::ffi::OsString;

use tracing::{info, warn};

use crate::cache::{CacheEntry, CredentialCache, CredentialKind};
use crate::config::{ProfileSettings, Settings};
use crate::errors::Result;
use crate::sts::{LongTermCredentials, TokenService};
use crate::vault::VaultSession;

/// What the caller needs.
#[derive(Debug, Clone)]
pub struct Request<'a> {
    pub profile: &'a str,
    pub kind: CredentialKind,
    pub settings: &'a Settings,
    pub profile_settings: &'a ProfileSettings,
}

/// Where the returned credentials came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Cache,
    Fresh,
}

/// Credentials plus their origin.
#[derive(Debug)]
pub struct Obtained {
    pub entry: CacheEntry,
    pub source: Source,
}

/// Resolve temporary credentials for `request`.
///
/// `open_vault` is only called on a cache miss.  `mfa_code` is only
/// called when a session token is needed and the profile has an MFA
/// device configured.
pub fn obtain<V, M>(
    request: &Request<'_>,
    cache: &CredentialCache,
    open_vault: V,
    mfa_code: M,
    service: &dyn TokenService,
) -> Result<Obtained>
where
    V: FnOnce() -> Result<VaultSession>,
    M: FnOnce() -> Result<String>,
{
    if let Some(entry) = cache.read_kind(request.profile, request.kind) {
        return Ok(Obtained {
            entry,
            source: Source::Cache,
        });
    }

    let session = open_vault()?;
    let secret = session.get(request.profile);
    session.close()?;
    let secret = secret?;

    let region = match &request.profile_settings.region {
        Some(region) => region.clone(),
        None => {
            warn!(
                profile = request.profile,
                region = %request.settings.default_region,
                "no region configured for profile, using default"
            );
            request.settings.default_region.clone()
        }
    };

    let creds = LongTermCredentials {
        access_key_id: secret.access_key.clone(),
        secret_access_key: secret.secret_key.clone(),
        region,
        mfa_serial: request.profile_settings.mfa_serial.clone(),
    };
    drop(secret);

    let entry = match request.kind {
        CredentialKind::Session => {
            let code = if creds.mfa_serial.is_some() {
                Some(zeroize::Zeroizing::new(mfa_code()?))
            } else {
                None
            };
            service.session_token(
                &creds,
                request.settings.session_duration_secs,
                code.as_deref().map(String::as_str),
            )?
        }
        CredentialKind::Federation => service.federation_token(
            &creds,
            request.settings.federation_duration_secs,
            request.profile,
        )?,
    };

    if let Err(e) = cache.write(request.profile, &entry) {
        warn!(profile = request.profile, error = %e, "failed to cache credentials");
    } else {
        info!(profile = request.profile, kind = %entry.kind, "fresh credentials cached");
    }

    Ok(Obtained {
        entry,
        source: Source::Fresh,
    })
}

/// Variables removed from an inherited environment before injecting.
pub const MANAGED_AWS_VARS: &[&str] = &[
    "AWS_ACCESS_KEY_ID",
    "AWS_SECRET_ACCESS_KEY",
    "AWS_SESSION_TOKEN",
    "AWS_SECURITY_TOKEN",
    "AWS_DEFAULT_REGION",
    "AWS_REGION",
    "AWS_PROFILE",
    "AWS_VAULT",
    "AWS_CREDENTIAL_EXPIRATION",
];

/// Build a child environment: `inherited` minus any managed AWS
/// variables, plus the temporary credentials for `profile`.
///
/// Inherited pairs are passed through as raw `OsString`s, so variables
/// that are not valid UTF-8 survive untouched.
pub fn aws_environment<I>(
    profile: &str,
    entry: &CacheEntry,
    inherited: I,
) -> Vec<(OsString, OsString)>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    let mut env: Vec<(OsString, OsString)> = inherited
        .into_iter()
        .filter(|(key, _)| !key.to_str().is_some_and(|k| MANAGED_AWS_VARS.contains(&k)))
        .collect();

    let mut set = |key: &str, value: &str| env.push((key.into(), value.into()));

    set("AWS_ACCESS_KEY_ID", &entry.access_key_id);
    set("AWS_SECRET_ACCESS_KEY", &entry.secret_access_key);
    set("AWS_SESSION_TOKEN", &entry.session_token);
    set("AWS_VAULT", profile);
    set("AWS_CREDENTIAL_EXPIRATION", &entry.expiration.to_rfc3339());

    if let Some(region) = entry.region.as_deref().filter(|r| !r.is_empty()) {
        set("AWS_DEFAULT_REGION", region);
        set("AWS_REGION", region);
    }

    env
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn entry() -> CacheEntry {
        CacheEntry {
            access_key_id: "ASIATEMP".into(),
            secret_access_key: "temp-secret".into(),
            session_token: "temp-token".into(),
            expiration: Utc::now() + Duration::hours(1),
            region: Some("eu-north-1".into()),
            kind: CredentialKind::Session,
        }
    }

    fn lookup<'a>(env: &'a [(OsString, OsString)], key: &str) -> Vec<&'a str> {
        env.iter()
            .filter(|(k, _)| k == key)
            .filter_map(|(_, v)| v.to_str())
            .collect()
    }

    fn pair(key: &str, value: &str) -> (OsString, OsString) {
        (key.into(), value.into())
    }

    #[test]
    fn aws_environment_replaces_inherited_credentials() {
        let inherited = vec![
            pair("PATH", "/usr/bin"),
            pair("AWS_PROFILE", "old"),
            pair("AWS_ACCESS_KEY_ID", "AKIAOLD"),
            pair("AWS_REGION", "us-east-1"),
        ];

        let env = aws_environment("prod", &entry(), inherited);

        assert_eq!(lookup(&env, "PATH"), vec!["/usr/bin"]);
        assert!(lookup(&env, "AWS_PROFILE").is_empty());
        assert_eq!(lookup(&env, "AWS_ACCESS_KEY_ID"), vec!["ASIATEMP"]);
        assert_eq!(lookup(&env, "AWS_SESSION_TOKEN"), vec!["temp-token"]);
        assert_eq!(lookup(&env, "AWS_VAULT"), vec!["prod"]);
        assert_eq!(lookup(&env, "AWS_REGION"), vec!["eu-north-1"]);
        assert_eq!(lookup(&env, "AWS_DEFAULT_REGION"), vec!["eu-north-1"]);
        assert_eq!(lookup(&env, "AWS_CREDENTIAL_EXPIRATION").len(), 1);
    }

    #[test]
    fn aws_environment_without_region_sets_no_region_vars() {
        let mut e = entry();
        e.region = None;
        let env = aws_environment("p", &e, Vec::new());
        assert!(lookup(&env, "AWS_REGION").is_empty());
        assert!(lookup(&env, "AWS_DEFAULT_REGION").is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn aws_environment_keeps_non_utf8_variables() {
        use std::os::unix::ffi::OsStringExt;

        let bad_key = OsString::from_vec(b"LEGACY_\xff".to_vec());
        let bad_value = OsString::from_vec(vec![0x66, 0x6f, 0xff]);
        let inherited = vec![
            (OsString::from("LANG_BYTES"), bad_value.clone()),
            (bad_key.clone(), OsString::from("x")),
            pair("AWS_SESSION_TOKEN", "stale"),
        ];

        let env = aws_environment("prod", &entry(), inherited);

        assert!(env.contains(&(OsString::from("LANG_BYTES"), bad_value)));
        assert!(env.contains(&(bad_key, OsString::from("x"))));
        assert_eq!(lookup(&env, "AWS_SESSION_TOKEN"), vec!["temp-token"]);
    }
}
