//! `caws login`: print an AWS Console sign-in URL.
//!
//! Only the URL goes to stdout so it can be piped to a browser opener.

use crate::broker::{self, Request};
use crate::cache::CredentialKind;
use crate::cli::{prompt_mfa_code, prompt_password, validate_profile_name, Context};
use crate::errors::Result;
use crate::sts::{console_login_url, AwsCliTokenService};
use crate::vault::VaultStore;

/// Execute the `login` command.
pub fn execute(ctx: &Context, profile: &str) -> Result<()> {
    validate_profile_name(profile)?;

    let profile_settings = ctx.profile_config().settings(profile)?;
    let request = Request {
        profile,
        kind: CredentialKind::Federation,
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

    let url = console_login_url(&obtained.entry)?;
    println!("{url}");
    Ok(())
}
