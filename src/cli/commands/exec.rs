//! `caws exec`: run a command with temporary credentials injected.

use std::process::Command;

use crate::broker::{self, Request, Source};
use crate::cache::CredentialKind;
use crate::cli::output;
use crate::cli::{prompt_mfa_code, prompt_password, validate_profile_name, Context};
use crate::errors::{CawsError, Result};
use crate::sts::AwsCliTokenService;
use crate::vault::VaultStore;

/// Execute the `exec` command.
pub fn execute(ctx: &Context, profile: &str, command: &[String]) -> Result<()> {
    validate_profile_name(profile)?;

    let profile_settings = ctx.profile_config().settings(profile)?;
    let request = Request {
        profile,
        kind: CredentialKind::Session,
        settings: &ctx.settings,
        profile_settings: &profile_settings,
    };
    let service = AwsCliTokenService::new(&ctx.settings.aws_cli);

    let obtained = broker::obtain(
        &request,
        &ctx.cache(),
        || VaultStore::open_with(&ctx.paths.vault, prompt_password),
        prompt_mfa_code,
        &service,
    )?;

    if obtained.source == Source::Fresh {
        output::info(&format!(
            "Credentials for '{profile}' valid until {}",
            obtained.entry.expiration.format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }

    let (program, args) = match command.split_first() {
        Some((program, args)) => (program.clone(), args.to_vec()),
        None => (default_shell(), Vec::new()),
    };

    let env = broker::aws_environment(profile, &obtained.entry, std::env::vars_os());
    drop(obtained);

    let status = Command::new(&program)
        .args(&args)
        .env_clear()
        .envs(env)
        .status()
        .map_err(|e| CawsError::CommandFailed(format!("failed to run '{program}': {e}")))?;

    // Forward the child's exit code.
    match status.code() {
        Some(0) => Ok(()),
        Some(code) => Err(CawsError::ChildProcessFailed(code)),
        None => Err(CawsError::CommandFailed(
            "child process terminated by signal".into(),
        )),
    }
}

fn default_shell() -> String {
    std::env::var("SHELL")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "/bin/bash".to_string())
}
