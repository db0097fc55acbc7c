use clap::Parser;
use caws::cli::{commands, output, Cli, Commands, Context};
use caws::errors::{CawsError, Result};

fn main() {
    caws::logging::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        // Forward the child's exit code untouched.
        if let CawsError::ChildProcessFailed(code) = e {
            std::process::exit(code);
        }
        output::error(&e.to_string());
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Version => commands::version::execute(),
        Commands::Completions { ref shell } => commands::completions::execute(shell),
        command => {
            let ctx = Context::load()?;
            match command {
                Commands::Init => commands::init::execute(&ctx),
                Commands::Add { ref profile } => commands::add::execute(&ctx, profile),
                Commands::List => commands::list::execute(&ctx),
                Commands::Exec {
                    ref profile,
                    ref command,
                } => commands::exec::execute(&ctx, profile, command),
                Commands::Login { ref profile } => commands::login::execute(&ctx, profile),
                Commands::Remove { ref profile, force } => {
                    commands::remove::execute(&ctx, profile, force)
                }
                Commands::Version | Commands::Completions { .. } => Ok(()),
            }
        }
    }
}
