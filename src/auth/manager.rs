//! Authorization manager
//!
//! Hands out a credential, and an HTTP client carrying it, trying in turn
//! the in-memory copy, the on-disk cache and finally the configured
//! interactive flow. Fresh credentials are written to the cache right away.

use crate::auth::browser::BrowserAuthorizer;
use crate::auth::client::AuthorizedClient;
use crate::auth::credentials::ProviderConfig;
use crate::auth::identity::AppIdentity;
use crate::auth::oauth::OAuthExchanger;
use crate::auth::provider::{Authorizer, TokenExchanger};
use crate::auth::store::{CacheLocation, TokenStore};
use crate::auth::terminal::TerminalAuthorizer;
use crate::auth::token::Credential;
use crate::config::{AuthConfig, AuthMode, Config, ConfigValidator};
use crate::utils::errors::{AuthError, AuthResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub struct AuthManager {
    identity: AppIdentity,
    store: TokenStore,
    authorizer: Arc<dyn Authorizer>,
    exchanger: Arc<dyn TokenExchanger>,
    credential: Mutex<Option<Credential>>,
}

impl AuthManager {
    /// Picks environment mode when both variable names are configured,
    /// otherwise reads the credentials file.
    pub fn from_config(config: &Config) -> AuthResult<Self> {
        match config.credentials.env_vars() {
            Some((id_var, secret_var)) => {
                Self::from_env(id_var, secret_var, &config.auth, &config.credentials.scopes)
            }
            None => Self::from_credentials_file(
                &config.credentials.file,
                &config.auth,
                &config.credentials.scopes,
            ),
        }
    }

    pub fn from_credentials_file(
        path: impl AsRef<Path>,
        auth: &AuthConfig,
        scopes: &[String],
    ) -> AuthResult<Self> {
        let provider = ProviderConfig::from_credentials_file(path, scopes)?;
        Self::new(provider, auth)
    }

    pub fn from_env(
        id_var: &str,
        secret_var: &str,
        auth: &AuthConfig,
        scopes: &[String],
    ) -> AuthResult<Self> {
        let provider = ProviderConfig::from_env(id_var, secret_var, scopes)?;
        Self::new(provider, auth)
    }

    /// Validates `auth`, resolves the application identity and wires the
    /// authorizer for the configured mode. With `reset` set, any cached
    /// token is deleted here.
    pub fn new(provider: ProviderConfig, auth: &AuthConfig) -> AuthResult<Self> {
        Self::build(provider, auth, CacheLocation::for_identity)
    }

    /// Like [`AuthManager::new`], keeping the token cache at `location`
    /// instead of the per-user directories.
    pub fn with_location(
        provider: ProviderConfig,
        auth: &AuthConfig,
        location: CacheLocation,
    ) -> AuthResult<Self> {
        Self::build(provider, auth, |_| Ok(location))
    }

    fn build(
        provider: ProviderConfig,
        auth: &AuthConfig,
        locate: impl FnOnce(&AppIdentity) -> AuthResult<CacheLocation>,
    ) -> AuthResult<Self> {
        ConfigValidator::new()
            .validate_auth(auth)
            .map_err(AuthError::Validation)?;

        let identity = AppIdentity::resolve(
            auth.vendor.as_deref(),
            auth.app_name.as_deref(),
            &provider.client_id,
        );
        let store = TokenStore::new(locate(&identity)?);

        let (exchanger, authorizer): (Arc<dyn TokenExchanger>, Arc<dyn Authorizer>) =
            match auth.mode {
                AuthMode::Web => {
                    let routes = auth.normalized();
                    let exchanger: Arc<dyn TokenExchanger> =
                        Arc::new(OAuthExchanger::new(&provider, Some(&routes.redirect_url))?);
                    let authorizer = BrowserAuthorizer::new(
                        Arc::clone(&exchanger),
                        routes,
                        identity.app_name.clone(),
                    )
                    .with_index_page(auth.use_index_page)
                    .with_timeout(auth.callback_timeout());
                    (exchanger, Arc::new(authorizer))
                }
                AuthMode::Terminal => {
                    let exchanger: Arc<dyn TokenExchanger> = Arc::new(OAuthExchanger::new(
                        &provider,
                        provider.redirect_url.as_deref(),
                    )?);
                    let authorizer = TerminalAuthorizer::new(Arc::clone(&exchanger));
                    (exchanger, Arc::new(authorizer))
                }
            };

        debug!(
            "Auth manager for {}/{} in {:?} mode",
            identity.vendor, identity.app_name, auth.mode
        );
        let manager = Self::from_parts(identity, store, authorizer, exchanger);
        if auth.reset {
            info!("Resetting cached authorization");
            manager.store.remove()?;
        }
        Ok(manager)
    }

    /// Assembles a manager from already built collaborators.
    pub fn from_parts(
        identity: AppIdentity,
        store: TokenStore,
        authorizer: Arc<dyn Authorizer>,
        exchanger: Arc<dyn TokenExchanger>,
    ) -> Self {
        Self {
            identity,
            store,
            authorizer,
            exchanger,
            credential: Mutex::new(None),
        }
    }

    /// Replaces the interactive flow chosen from the configuration.
    pub fn with_authorizer(mut self, authorizer: Arc<dyn Authorizer>) -> Self {
        self.authorizer = authorizer;
        self
    }

    pub fn identity(&self) -> &AppIdentity {
        &self.identity
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    pub fn token_path(&self) -> PathBuf {
        self.store.token_path()
    }

    /// The credential for this process, authorizing interactively when
    /// nothing usable is cached.
    pub async fn token(&self) -> AuthResult<Credential> {
        let mut held = self.credential.lock().await;
        if let Some(credential) = held.as_ref() {
            return Ok(credential.clone());
        }

        let credential = match self.store.load() {
            Ok(credential) => {
                debug!("Using cached token");
                credential
            }
            Err(e) => {
                match e {
                    AuthError::TokenNotFound(_) => debug!("No cached token: {}", e),
                    _ => warn!("Ignoring unreadable cached token: {}", e),
                }
                let credential = self.authorizer.authorize().await?;
                let path = self.store.save(&credential)?;
                info!("Token cached at {}", path.display());
                credential
            }
        };

        *held = Some(credential.clone());
        Ok(credential)
    }

    pub async fn client(&self) -> AuthResult<AuthorizedClient> {
        let credential = self.token().await?;
        Ok(AuthorizedClient::new(credential, Arc::clone(&self.exchanger)))
    }

    /// Forgets the credential in memory and on disk.
    pub async fn remove_token(&self) -> AuthResult<()> {
        self.credential.lock().await.take();
        self.store.remove()
    }
}
