//! sheets-refresh: delegated authorization and token lifecycle for the
//! Google Sheets refresh tool

pub mod auth;
pub mod cli;
pub mod config;
pub mod http_server;
pub mod utils;

pub use auth::{AuthManager, AuthorizedClient, Credential};
pub use config::Config;
pub use utils::errors::{AuthError, AuthResult};
