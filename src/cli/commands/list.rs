//! `caws list`: show the profiles stored in the vault.

use crate::cli::output;
use crate::cli::{prompt_password, Context};
use crate::errors::Result;
use crate::vault::VaultStore;

/// Execute the `list` command.
pub fn execute(ctx: &Context) -> Result<()> {
    let session = VaultStore::open_with(&ctx.paths.vault, prompt_password)?;
    let names = session.list()?;
    session.close()?;

    let profile_config = ctx.profile_config();
    let mut rows = Vec::with_capacity(names.len());
    for name in names {
        let settings = profile_config.settings(&name)?;
        rows.push((name, settings));
    }

    output::print_profiles_table(&rows);
    Ok(())
}
