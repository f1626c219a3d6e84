//! CLI command handlers.

pub mod config;
pub mod dev_token;
pub mod login;
pub mod shell;
