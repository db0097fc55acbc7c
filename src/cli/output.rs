//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.  Everything except the
//! console URL printed by `login` goes to stderr.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::config::ProfileSettings;

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    eprintln!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    eprintln!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    eprintln!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Print a table of profiles (Profile, Region, MFA).
pub fn print_profiles_table(profiles: &[(String, ProfileSettings)]) {
    if profiles.is_empty() {
        info("No AWS profiles found.");
        tip("Run `caws add <profile>` to add your first profile.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Profile", "Region", "MFA"]);

    for (name, settings) in profiles {
        table.add_row(vec![
            name.clone(),
            settings.region.clone().unwrap_or_else(|| "-".into()),
            if settings.mfa_serial.is_some() {
                "enabled".to_string()
            } else {
                "-".to_string()
            },
        ]);
    }

    println!("{table}");
}
