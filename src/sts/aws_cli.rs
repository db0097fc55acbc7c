//! `TokenService` backed by the `aws` command-line tool.
//!
//! The long-term keys are passed to the child only through its
//! environment; any AWS credential variables inherited from our own
//! environment are removed first so they cannot take precedence.

use std::process::{Command, Stdio};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info};
use zeroize::Zeroizing;

use super::{LongTermCredentials, TokenService};
use crate::cache::{CacheEntry, CredentialKind};
use crate::errors::{CawsError, Result};

/// Variables stripped from the child environment before the call.
const INHERITED_AWS_VARS: &[&str] = &[
    "AWS_ACCESS_KEY_ID",
    "AWS_SECRET_ACCESS_KEY",
    "AWS_SESSION_TOKEN",
    "AWS_SECURITY_TOKEN",
    "AWS_PROFILE",
    "AWS_DEFAULT_PROFILE",
    "AWS_REGION",
    "AWS_DEFAULT_REGION",
];

/// Runs `aws sts …` and parses its JSON output.
#[derive(Debug, Clone)]
pub struct AwsCliTokenService {
    program: String,
}

impl AwsCliTokenService {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(
        &self,
        creds: &LongTermCredentials,
        args: &[String],
        kind: CredentialKind,
    ) -> Result<CacheEntry> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("sts").args(args).args(["--output", "json"]);
        for var in INHERITED_AWS_VARS {
            cmd.env_remove(var);
        }
        cmd.env("AWS_ACCESS_KEY_ID", &creds.access_key_id)
            .env("AWS_SECRET_ACCESS_KEY", &creds.secret_access_key)
            .env("AWS_REGION", &creds.region)
            .env("AWS_DEFAULT_REGION", &creds.region)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!(program = %self.program, %kind, "calling token service");
        let output = cmd.output().map_err(|e| {
            CawsError::TokenService(format!("failed to run '{}': {e}", self.program))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CawsError::TokenService(format!(
                "'{} sts {}' failed: {}",
                self.program,
                args.first().map(String::as_str).unwrap_or_default(),
                stderr.trim()
            )));
        }

        let stdout = Zeroizing::new(output.stdout);
        let entry = parse_credentials(&stdout, kind, &creds.region)?;
        info!(%kind, expiration = %entry.expiration, "temporary credentials issued");
        Ok(entry)
    }
}

impl TokenService for AwsCliTokenService {
    fn session_token(
        &self,
        creds: &LongTermCredentials,
        duration_secs: u32,
        mfa_code: Option<&str>,
    ) -> Result<CacheEntry> {
        let mut args = vec![
            "get-session-token".to_string(),
            "--duration-seconds".to_string(),
            duration_secs.to_string(),
        ];

        if let Some(serial) = &creds.mfa_serial {
            let code = mfa_code
                .filter(|c| !c.is_empty())
                .ok_or_else(|| CawsError::TokenService("MFA code required but not provided".into()))?;
            args.extend([
                "--serial-number".to_string(),
                serial.clone(),
                "--token-code".to_string(),
                code.to_string(),
            ]);
        }

        self.run(creds, &args, CredentialKind::Session)
    }

    fn federation_token(
        &self,
        creds: &LongTermCredentials,
        duration_secs: u32,
        name: &str,
    ) -> Result<CacheEntry> {
        let args = vec![
            "get-federation-token".to_string(),
            "--name".to_string(),
            name.to_string(),
            "--duration-seconds".to_string(),
            duration_secs.to_string(),
        ];
        self.run(creds, &args, CredentialKind::Federation)
    }
}

#[derive(Deserialize)]
struct StsResponse {
    #[serde(rename = "Credentials")]
    credentials: StsCredentials,
}

#[derive(Deserialize)]
struct StsCredentials {
    #[serde(rename = "AccessKeyId")]
    access_key_id: String,
    #[serde(rename = "SecretAccessKey")]
    secret_access_key: String,
    #[serde(rename = "SessionToken")]
    session_token: String,
    #[serde(rename = "Expiration")]
    expiration: DateTime<Utc>,
}

/// Turn `aws sts` JSON output into a cache entry.
fn parse_credentials(stdout: &[u8], kind: CredentialKind, region: &str) -> Result<CacheEntry> {
    let response: StsResponse = serde_json::from_slice(stdout)
        .map_err(|e| CawsError::TokenService(format!("unexpected token service output: {e}")))?;
    let c = response.credentials;

    Ok(CacheEntry {
        access_key_id: c.access_key_id,
        secret_access_key: c.secret_access_key,
        session_token: c.session_token,
        expiration: c.expiration,
        region: Some(region.to_string()).filter(|r| !r.is_empty()),
        kind,
    })
}
