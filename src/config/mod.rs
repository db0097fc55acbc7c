//! Configuration: user settings, file locations, and per-profile
//! settings from the AWS config file.

pub mod paths;
pub mod profile;
pub mod settings;

pub use paths::Paths;
pub use profile::{ProfileConfig, ProfileSettings};
pub use settings::Settings;
