//! `caws add`: store long-term AWS keys for a profile.

use zeroize::Zeroizing;

use crate::cli::output;
use crate::cli::{confirm, prompt_password, validate_access_key, validate_profile_name, Context};
use crate::errors::{CawsError, Result};
use crate::vault::{ProfileSecret, VaultStore};

/// Execute the `add` command.
pub fn execute(ctx: &Context, profile: &str) -> Result<()> {
    validate_profile_name(profile)?;

    let profile_config = ctx.profile_config();
    if !profile_config.contains(profile)? {
        output::warning(&format!(
            "Profile '{profile}' not found in {}",
            profile_config.path().display()
        ));
        if confirm("Create it?", true)? {
            profile_config.append_profile(profile)?;
            output::success(&format!(
                "Added {} to {}",
                crate::config::ProfileConfig::section_header(profile),
                profile_config.path().display()
            ));
        }
    }

    let (access_key, secret_key) = read_keys()?;
    validate_access_key(&access_key)?;
    if secret_key.is_empty() {
        return Err(CawsError::CommandFailed(
            "secret access key cannot be empty".into(),
        ));
    }

    let session = VaultStore::open_with(&ctx.paths.vault, prompt_password)?;
    session.put(profile, ProfileSecret::new(access_key.as_str(), secret_key.as_str()))?;
    session.close()?;

    output::success(&format!("Credentials stored for profile '{profile}'"));

    let settings = profile_config.settings(profile)?;
    if settings.region.is_none() {
        output::tip(&format!(
            "Set a region with `region = ...` under {} in {}",
            crate::config::ProfileConfig::section_header(profile),
            profile_config.path().display()
        ));
    }
    if settings.mfa_serial.is_none() {
        output::tip("Add `mfa_serial = arn:aws:iam::<account>:mfa/<user>` to require MFA.");
    }

    Ok(())
}

/// Read the access key and secret key, from `CAWS_TEST_ACCESS_KEY` /
/// `CAWS_TEST_SECRET_KEY` when both are set, otherwise interactively.
fn read_keys() -> Result<(Zeroizing<String>, Zeroizing<String>)> {
    if let (Ok(ak), Ok(sk)) = (
        std::env::var("CAWS_TEST_ACCESS_KEY"),
        std::env::var("CAWS_TEST_SECRET_KEY"),
    ) {
        return Ok((Zeroizing::new(ak.trim().to_string()), Zeroizing::new(sk)));
    }

    let ak: String = dialoguer::Input::new()
        .with_prompt("AWS Access Key ID")
        .interact_text()
        .map_err(|e| CawsError::CommandFailed(format!("access key prompt: {e}")))?;

    let sk = dialoguer::Password::new()
        .with_prompt("AWS Secret Access Key")
        .interact()
        .map_err(|e| CawsError::CommandFailed(format!("secret key prompt: {e}")))?;

    Ok((Zeroizing::new(ak.trim().to_string()), Zeroizing::new(sk)))
}
