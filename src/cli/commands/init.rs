//! `caws init`: create a new, empty encrypted vault.

use crate::cli::output;
use crate::cli::{prompt_new_password, Context};
use crate::errors::{CawsError, Result};
use crate::vault::VaultStore;

/// Execute the `init` command.
pub fn execute(ctx: &Context) -> Result<()> {
    let vault_path = &ctx.paths.vault;

    if vault_path.exists() {
        output::tip("Use `caws add <profile>` to store credentials in the existing vault.");
        return Err(CawsError::VaultAlreadyExists(vault_path.clone()));
    }

    let password = prompt_new_password()?;
    VaultStore::initialize(vault_path, &password)?;

    output::success(&format!("Vault created at {}", vault_path.display()));
    output::tip("Run `caws add <profile>` to store AWS credentials.");
    output::tip("Run `caws exec <profile> -- <command>` to use them.");

    Ok(())
}
