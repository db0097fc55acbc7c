use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{CawsError, Result};

/// User-level configuration, loaded from `<config-home>/caws/config.toml`.
///
/// Every field has a sensible default so caws works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Region used when the profile has none configured.
    #[serde(default = "default_region")]
    pub default_region: String,

    /// Lifetime requested for session tokens (`caws exec`).
    #[serde(default = "default_session_duration_secs")]
    pub session_duration_secs: u32,

    /// Lifetime requested for federation tokens (`caws login`).
    #[serde(default = "default_federation_duration_secs")]
    pub federation_duration_secs: u32,

    /// Program used to call the token service.
    #[serde(default = "default_aws_cli")]
    pub aws_cli: String,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_session_duration_secs() -> u32 {
    3600 // 1 hour
}

fn default_federation_duration_secs() -> u32 {
    43_200 // 12 hours
}

fn default_aws_cli() -> String {
    "aws".to_string()
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_region: default_region(),
            session_duration_secs: default_session_duration_secs(),
            federation_duration_secs: default_federation_duration_secs(),
            aws_cli: default_aws_cli(),
        }
    }
}

impl Settings {
    /// Load settings from `config_path`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            CawsError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        if settings.session_duration_secs == 0 || settings.federation_duration_secs == 0 {
            return Err(CawsError::ConfigError(format!(
                "{}: token durations must be greater than zero",
                config_path.display()
            )));
        }

        Ok(settings)
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn default_settings_are_sensible() {
        let s = Settings::default();
        assert_eq!(s.default_region, "us-east-1");
        assert_eq!(s.session_duration_secs, 3600);
        assert_eq!(s.federation_duration_secs, 43_200);
        assert_eq!(s.aws_cli, "aws");
    }

    #[test]
    fn load_returns_defaults_when_no_config_file() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings::load(&tmp.path().join("config.toml")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn load_parses_toml_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        let config = r#"
default_region = "eu-central-1"
session_duration_secs = 900
federation_duration_secs = 3600
aws_cli = "/opt/aws/bin/aws"
"#;
        fs::write(&path, config).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.default_region, "eu-central-1");
        assert_eq!(settings.session_duration_secs, 900);
        assert_eq!(settings.federation_duration_secs, 3600);
        assert_eq!(settings.aws_cli, "/opt/aws/bin/aws");
    }

    #[test]
    fn load_uses_defaults_for_missing_fields() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "default_region = \"ap-south-1\"\n").unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.default_region, "ap-south-1");
        // Rest should be defaults
        assert_eq!(settings.session_duration_secs, 3600);
        assert_eq!(settings.aws_cli, "aws");
    }

    #[test]
    fn load_errors_on_invalid_toml() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "not valid {{toml").unwrap();

        let result = Settings::load(&path);
        assert!(matches!(result, Err(CawsError::ConfigError(_))));
    }

    #[test]
    fn load_rejects_zero_duration() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "session_duration_secs = 0\n").unwrap();

        assert!(Settings::load(&path).is_err());
    }
}
