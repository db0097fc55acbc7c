pub mod add;
pub mod completions;
pub mod exec;
pub mod init;
pub mod list;
pub mod login;
pub mod remove;
pub mod version;
