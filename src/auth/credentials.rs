//! Client identity loading
//!
//! Produces the [`ProviderConfig`] either from the provider's client secret
//! JSON document or from a pair of environment variables.

use crate::utils::errors::{AuthError, AuthResult};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// Anything larger is almost certainly not a client secret file.
pub const MAX_CRED_FILE_SIZE: u64 = 32 * 1024;

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Connection parameters for the identity provider.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub client_id: String,
    pub client_secret: String,
    pub auth_url: String,
    pub token_url: String,
    /// Redirect registered with the provider, used by the terminal flow.
    pub redirect_url: Option<String>,
    pub scopes: Vec<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("auth_url", &self.auth_url)
            .field("token_url", &self.token_url)
            .field("redirect_url", &self.redirect_url)
            .field("scopes", &self.scopes)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    #[serde(default)]
    web: Option<ClientSecretEntry>,
    #[serde(default)]
    installed: Option<ClientSecretEntry>,
}

#[derive(Debug, Deserialize)]
struct ClientSecretEntry {
    client_id: String,
    client_secret: String,
    #[serde(default)]
    redirect_uris: Vec<String>,
    #[serde(default = "default_auth_uri")]
    auth_uri: String,
    #[serde(default = "default_token_uri")]
    token_uri: String,
}

fn default_auth_uri() -> String {
    GOOGLE_AUTH_URL.to_string()
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URL.to_string()
}

impl ProviderConfig {
    /// Loads the client secret JSON at `path`.
    ///
    /// The file must be non-empty, at most [`MAX_CRED_FILE_SIZE`] bytes, and
    /// on Unix readable by its owner only (mode 0600 or 0400).
    pub fn from_credentials_file(path: impl AsRef<Path>, scopes: &[String]) -> AuthResult<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path).map_err(|source| AuthError::CredentialsFile {
            path: path.to_path_buf(),
            source,
        })?;

        let size = metadata.len();
        if size == 0 || size > MAX_CRED_FILE_SIZE {
            return Err(AuthError::CredentialsSize {
                path: path.to_path_buf(),
                size,
            });
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = metadata.permissions().mode() & 0o777;
            if mode != 0o600 && mode != 0o400 {
                return Err(AuthError::CredentialsPermissions {
                    path: path.to_path_buf(),
                    mode,
                });
            }
        }

        let data = std::fs::read(path).map_err(|source| AuthError::CredentialsFile {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Loaded client secret file {}", path.display());

        Self::from_json(&data, scopes)
    }

    /// Parses a client secret document. `web` credentials win over
    /// `installed` ones when both are present.
    pub fn from_json(data: &[u8], scopes: &[String]) -> AuthResult<Self> {
        let file: ClientSecretFile =
            serde_json::from_slice(data).map_err(|e| AuthError::CredentialsParse(e.to_string()))?;

        let entry = file
            .web
            .or(file.installed)
            .ok_or_else(|| AuthError::CredentialsParse("no credentials found".to_string()))?;

        if entry.client_id.is_empty() {
            return Err(AuthError::CredentialsParse("client_id is empty".to_string()));
        }

        Ok(Self {
            client_id: entry.client_id,
            client_secret: entry.client_secret,
            auth_url: entry.auth_uri,
            token_url: entry.token_uri,
            redirect_url: entry.redirect_uris.into_iter().next(),
            scopes: scopes.to_vec(),
        })
    }

    /// Reads the client id and secret from the named environment variables.
    pub fn from_env(id_var: &str, secret_var: &str, scopes: &[String]) -> AuthResult<Self> {
        let id = std::env::var(id_var).unwrap_or_default();
        let secret = std::env::var(secret_var).unwrap_or_default();
        if id.is_empty() || secret.is_empty() {
            return Err(AuthError::MissingEnv {
                id_var: id_var.to_string(),
                secret_var: secret_var.to_string(),
            });
        }

        Ok(Self {
            client_id: id,
            client_secret: secret,
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            redirect_url: None,
            scopes: scopes.to_vec(),
        })
    }
}
