//! Per-profile settings from the plaintext AWS config file.
//!
//! Region and MFA device live here rather than in the vault, keyed by
//! the same profile name.  Only the small subset of the INI format that
//! caws needs is understood: section headers, `key = value` lines, and
//! `#` / `;` comments.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::errors::{CawsError, Result};

/// Non-secret settings for one profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileSettings {
    pub region: Option<String>,
    pub mfa_serial: Option<String>,
}

/// Handle on an AWS config file.
#[derive(Debug, Clone)]
pub struct ProfileConfig {
    path: PathBuf,
}

impl ProfileConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Section header for `profile`: `[default]` or `[profile <name>]`.
    pub fn section_header(profile: &str) -> String {
        if profile == "default" {
            "[default]".to_string()
        } else {
            format!("[profile {profile}]")
        }
    }

    /// Whether the file has a section for `profile`.
    pub fn contains(&self, profile: &str) -> Result<bool> {
        let Some(contents) = self.read()? else {
            return Ok(false);
        };
        let header = Self::section_header(profile);
        Ok(contents.lines().any(|line| line.trim() == header))
    }

    /// Region and MFA serial for `profile`.
    ///
    /// A missing file yields empty settings rather than an error.
    pub fn settings(&self, profile: &str) -> Result<ProfileSettings> {
        let Some(contents) = self.read()? else {
            return Ok(ProfileSettings::default());
        };
        Ok(parse_settings(&contents, profile))
    }

    /// Append an empty section for `profile`, creating the file if needed.
    pub fn append_profile(&self, profile: &str) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.exists() {
                fs::create_dir_all(parent)
                    .map_err(|e| CawsError::io_at("failed to create AWS config directory", e))?;
                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    fs::set_permissions(parent, fs::Permissions::from_mode(0o700))?;
                }
            }
        }

        let mut options = fs::OpenOptions::new();
        options.append(true).create(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options
            .open(&self.path)
            .map_err(|e| CawsError::io_at("failed to open AWS config file", e))?;

        let needs_separator = file.metadata()?.len() > 0;
        let mut block = String::new();
        if needs_separator {
            block.push('\n');
        }
        block.push_str(&Self::section_header(profile));
        block.push('\n');

        file.write_all(block.as_bytes())
            .map_err(|e| CawsError::io_at("failed to write AWS config file", e))?;
        Ok(())
    }

    fn read(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CawsError::io_at("failed to read AWS config file", e)),
        }
    }
}

fn parse_settings(contents: &str, profile: &str) -> ProfileSettings {
    let header = ProfileConfig::section_header(profile);
    let mut settings = ProfileSettings::default();
    let mut in_section = false;

    for line in contents.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if line.starts_with('[') {
            in_section = line == header;
            continue;
        }
        if !in_section {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.trim() {
                "region" => settings.region = Some(value.to_string()),
                "mfa_serial" => settings.mfa_serial = Some(value.to_string()),
                _ => {}
            }
        }
    }

    settings
}
