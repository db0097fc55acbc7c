//! `caws remove`: delete a profile from the vault.

use crate::cli::output;
use crate::cli::{confirm, prompt_password, validate_profile_name, Context};
use crate::errors::Result;
use crate::vault::VaultStore;

/// Execute the `remove` command.
pub fn execute(ctx: &Context, profile: &str, force: bool) -> Result<()> {
    validate_profile_name(profile)?;

    // Unless --force is set, ask for confirmation before removing.
    if !force && !confirm(&format!("Remove profile '{profile}'?"), false)? {
        output::info("Cancelled.");
        return Ok(());
    }

    let session = VaultStore::open_with(&ctx.paths.vault, prompt_password)?;
    session.remove(profile)?;
    session.close()?;

    ctx.cache().invalidate(profile)?;

    output::success(&format!("Removed profile '{profile}'"));
    Ok(())
}
