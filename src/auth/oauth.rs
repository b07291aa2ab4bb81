//! Authorization code grant against the provider's endpoints
use crate::auth::credentials::ProviderConfig;
use crate::auth::provider::TokenExchanger;
use crate::auth::token::Credential;
use crate::utils::errors::{AuthError, AuthResult};
use async_trait::async_trait;
use chrono::Utc;
use oauth2::{
    basic::{BasicClient, BasicErrorResponse, BasicTokenResponse, BasicTokenType},
    reqwest::async_http_client,
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, RedirectUrl, RefreshToken,
    RequestTokenError, Scope, TokenResponse, TokenUrl,
};
use tracing::{debug, info};

/// [`TokenExchanger`] backed by the `oauth2` crate.
pub struct OAuthExchanger {
    client: BasicClient,
    scopes: Vec<String>,
}

impl OAuthExchanger {
    pub fn new(config: &ProviderConfig, redirect_url: Option<&str>) -> AuthResult<Self> {
        let mut client = BasicClient::new(
            ClientId::new(config.client_id.clone()),
            Some(ClientSecret::new(config.client_secret.clone())),
            AuthUrl::new(config.auth_url.clone()).map_err(|e| AuthError::Config(e.to_string()))?,
            Some(
                TokenUrl::new(config.token_url.clone())
                    .map_err(|e| AuthError::Config(e.to_string()))?,
            ),
        );

        if let Some(url) = redirect_url {
            client = client.set_redirect_uri(
                RedirectUrl::new(url.to_string()).map_err(|e| AuthError::Config(e.to_string()))?,
            );
        }

        Ok(Self {
            client,
            scopes: config.scopes.clone(),
        })
    }

    fn to_credential(response: &BasicTokenResponse) -> Credential {
        let token_type = match response.token_type() {
            BasicTokenType::Bearer => "Bearer".to_string(),
            BasicTokenType::Mac => "MAC".to_string(),
            BasicTokenType::Extension(other) => other.clone(),
        };

        Credential {
            access_token: response.access_token().secret().to_string(),
            token_type,
            refresh_token: response.refresh_token().map(|t| t.secret().to_string()),
            expiry: response
                .expires_in()
                .and_then(|d| chrono::Duration::from_std(d).ok())
                .map(|d| Utc::now() + d),
        }
    }
}

fn describe_error<RE>(error: RequestTokenError<RE, BasicErrorResponse>) -> String
where
    RE: std::error::Error + 'static,
{
    match error {
        RequestTokenError::ServerResponse(response) => response.to_string(),
        RequestTokenError::Request(e) => format!("request failed: {}", e),
        RequestTokenError::Parse(e, _) => format!("unexpected response: {}", e),
        RequestTokenError::Other(msg) => msg,
    }
}

#[async_trait]
impl TokenExchanger for OAuthExchanger {
    fn authorize_url(&self, state: &str) -> String {
        let state = state.to_string();
        let (url, _) = self
            .client
            .authorize_url(move || CsrfToken::new(state))
            .add_scopes(self.scopes.iter().cloned().map(Scope::new))
            .add_extra_param("access_type", "offline")
            .url();
        url.to_string()
    }

    async fn exchange_code(&self, code: &str) -> AuthResult<Credential> {
        debug!("Exchanging authorization code");
        let response = self
            .client
            .exchange_code(AuthorizationCode::new(code.trim().to_string()))
            .request_async(async_http_client)
            .await
            .map_err(|e| AuthError::Exchange(describe_error(e)))?;

        info!("Authorization code exchanged for a token");
        Ok(Self::to_credential(&response))
    }

    async fn refresh(&self, credential: &Credential) -> AuthResult<Credential> {
        let refresh_token = credential
            .refresh_token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::Exchange("no refresh token available".to_string()))?;

        debug!("Refreshing access token");
        let response = self
            .client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.clone()))
            .request_async(async_http_client)
            .await
            .map_err(|e| AuthError::Exchange(describe_error(e)))?;

        let mut refreshed = Self::to_credential(&response);
        if refreshed.refresh_token.is_none() {
            refreshed.refresh_token = Some(refresh_token);
        }
        Ok(refreshed)
    }
}
