//! `caws completions`: print a shell completion script to stdout.
//!
//!   caws completions zsh > "${fpath[1]}/_caws"

use std::io;

use clap::CommandFactory;
use clap_complete::{generate, Shell};

use crate::cli::Cli;
use crate::errors::{CawsError, Result};

/// Execute the `completions` command.
pub fn execute(shell: &str) -> Result<()> {
    let shell = parse_shell(shell)?;
    let mut cmd = Cli::command();
    let bin = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin, &mut io::stdout());
    Ok(())
}

fn parse_shell(name: &str) -> Result<Shell> {
    let name = name.trim().to_ascii_lowercase();
    if name == "ps" || name == "pwsh" {
        return Ok(Shell::PowerShell);
    }
    name.parse::<Shell>().map_err(|_| {
        CawsError::CommandFailed(format!(
            "unknown shell '{name}'; expected bash, zsh, fish, powershell, or elvish"
        ))
    })
}
