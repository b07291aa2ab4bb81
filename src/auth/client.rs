use crate::auth::provider::TokenExchanger;
use crate::auth::token::Credential;
use crate::utils::errors::{AuthError, AuthResult};
use reqwest::{IntoUrl, Method, RequestBuilder, Response};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// HTTP client that attaches the credential to every request and refreshes
/// it when it has expired. Refreshed tokens are kept in memory only.
pub struct AuthorizedClient {
    http: reqwest::Client,
    exchanger: Arc<dyn TokenExchanger>,
    credential: Mutex<Credential>,
}

impl AuthorizedClient {
    pub fn new(credential: Credential, exchanger: Arc<dyn TokenExchanger>) -> Self {
        Self::with_http(reqwest::Client::new(), credential, exchanger)
    }

    pub fn with_http(
        http: reqwest::Client,
        credential: Credential,
        exchanger: Arc<dyn TokenExchanger>,
    ) -> Self {
        Self {
            http,
            exchanger,
            credential: Mutex::new(credential),
        }
    }

    /// A currently valid credential.
    pub async fn credential(&self) -> AuthResult<Credential> {
        let mut current = self.credential.lock().await;
        if !current.is_expired() {
            return Ok(current.clone());
        }
        if !current.can_refresh() {
            return Err(AuthError::Exchange(
                "access token expired and no refresh token is available".to_string(),
            ));
        }

        debug!("Access token expired, refreshing");
        let refreshed = self.exchanger.refresh(&current).await?;
        info!("Access token refreshed");
        *current = refreshed.clone();
        Ok(refreshed)
    }

    /// Request builder with the `Authorization` header already set.
    pub async fn request(&self, method: Method, url: impl IntoUrl) -> AuthResult<RequestBuilder> {
        let credential = self.credential().await?;
        Ok(self
            .http
            .request(method, url)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("{} {}", credential.token_type, credential.access_token),
            ))
    }

    pub async fn get(&self, url: impl IntoUrl) -> AuthResult<Response> {
        Ok(self.request(Method::GET, url).await?.send().await?)
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }
}

impl std::fmt::Debug for AuthorizedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizedClient").finish_non_exhaustive()
    }
}
