//! CLI command implementations

pub mod args;

pub use args::{Cli, Command, CredentialArgs, LoginArgs};

use crate::auth::{AuthManager, TokenStore};
use crate::config::{Config, ConfigLoader};
use crate::utils::errors::AuthResult;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tracing::info;

/// Layers the configuration file, environment and command-line flags.
pub fn load_config(cli: &Cli) -> AuthResult<Config> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_file(path);
    }
    let mut config = loader.load()?;
    cli.apply(&mut config);
    Ok(config)
}

/// Makes sure a token is available and returns where it is cached.
pub async fn login(config: &Config) -> AuthResult<PathBuf> {
    let manager = AuthManager::from_config(config)?;
    let credential = manager.token().await?;
    let path = manager.token_path();
    info!(
        "Authorized as {}/{}",
        manager.identity().vendor,
        manager.identity().app_name
    );
    if let Some(expiry) = credential.expiry {
        info!("Access token valid until {}", expiry);
    }
    Ok(path)
}

pub async fn logout(config: &Config) -> AuthResult<()> {
    let manager = AuthManager::from_config(config)?;
    manager.remove_token().await
}

/// Cached token details, without triggering authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenStatus {
    pub path: PathBuf,
    pub cached: bool,
    pub expiry: Option<DateTime<Utc>>,
    pub refreshable: bool,
}

impl std::fmt::Display for TokenStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.cached {
            return write!(f, "no cached token (would be stored at {})", self.path.display());
        }
        write!(f, "token cached at {}", self.path.display())?;
        match self.expiry {
            Some(expiry) => write!(f, ", access token expires {}", expiry)?,
            None => write!(f, ", access token has no expiry")?,
        }
        if self.refreshable {
            write!(f, ", refresh token present")?;
        }
        Ok(())
    }
}

pub fn status(config: &Config) -> AuthResult<TokenStatus> {
    let manager = AuthManager::from_config(config)?;
    token_status(manager.store())
}

pub fn token_status(store: &TokenStore) -> AuthResult<TokenStatus> {
    match store.load() {
        Ok(credential) => Ok(TokenStatus {
            path: store.token_path(),
            cached: true,
            expiry: credential.expiry,
            refreshable: credential.can_refresh(),
        }),
        Err(e) if e.is_cache_miss() => Ok(TokenStatus {
            path: store.token_path(),
            cached: false,
            expiry: None,
            refreshable: false,
        }),
        Err(e) => Err(e),
    }
}

/// Runs the parsed command against an already loaded configuration.
pub async fn run(command: &Command, config: &Config) -> AuthResult<()> {
    match command {
        Command::Login(_) => {
            let path = login(config).await?;
            println!("Token stored at {}", path.display());
        }
        Command::Logout(_) => {
            logout(config).await?;
            println!("Cached token removed");
        }
        Command::Status(_) => {
            println!("{}", status(config)?);
        }
    }
    Ok(())
}
