//! Core Database Sentinel library (login, session, config).

pub mod auth;
pub mod config;
pub mod dev_token;
pub mod http;
pub mod logging;
