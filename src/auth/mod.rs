//! Delegated authorization and token lifecycle

pub mod browser;
pub mod client;
pub mod credentials;
pub mod identity;
pub mod manager;
pub mod oauth;
pub mod provider;
pub mod store;
pub mod terminal;
pub mod token;

pub use browser::{BrowserAuthorizer, BrowserLauncher, SystemBrowser};
pub use client::AuthorizedClient;
pub use credentials::ProviderConfig;
pub use identity::AppIdentity;
pub use manager::AuthManager;
pub use oauth::OAuthExchanger;
pub use provider::{Authorizer, TokenExchanger};
pub use store::{CacheLocation, TokenStore, TOKEN_FILE_NAME};
pub use terminal::TerminalAuthorizer;
pub use token::Credential;
