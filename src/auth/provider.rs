//! Seams between the authorization flows and the identity provider
use crate::auth::token::Credential;
use crate::utils::errors::AuthResult;
use async_trait::async_trait;

/// Talks to the identity provider's authorization and token endpoints.
#[async_trait]
pub trait TokenExchanger: Send + Sync {
    /// Authorization URL requesting offline access, carrying `state`.
    fn authorize_url(&self, state: &str) -> String;

    /// Exchange an authorization code for a credential
    async fn exchange_code(&self, code: &str) -> AuthResult<Credential>;

    /// Obtain a fresh access token. The refresh token is carried over when
    /// the provider does not issue a new one.
    async fn refresh(&self, credential: &Credential) -> AuthResult<Credential>;
}

/// One interactive authorization attempt.
#[async_trait]
pub trait Authorizer: Send + Sync {
    async fn authorize(&self) -> AuthResult<Credential>;
}
