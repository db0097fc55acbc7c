pub mod broker;
pub mod cache;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod logging;
pub mod sts;
pub mod vault;
