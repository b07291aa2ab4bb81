use crate::config::ValidationError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid configuration:\n{}", format_validation(.0))]
    Validation(Vec<ValidationError>),

    #[error("unable to read the client secret file {}: {source}", .path.display())]
    CredentialsFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("suspicious file size of {}: {size} bytes", .path.display())]
    CredentialsSize { path: PathBuf, size: u64 },

    #[error(
        "credentials file is too permissive ({mode:o}), to fix - run:\n\tchmod 600 {}",
        .path.display()
    )]
    CredentialsPermissions { path: PathBuf, mode: u32 },

    #[error("unable to parse the client secret file: {0}")]
    CredentialsParse(String),

    #[error("environment variables {id_var:?} and/or {secret_var:?} are not set")]
    MissingEnv { id_var: String, secret_var: String },

    #[error("token not found: {0}")]
    TokenNotFound(String),

    #[error("unable to decode cached token {}: {reason}", .path.display())]
    TokenDecode { path: PathBuf, reason: String },

    #[error("unable to retrieve token from web: {0}")]
    Exchange(String),

    #[error("callback listener error: {0}")]
    Listener(String),

    #[error("no authorization callback received within {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("unable to read authorization code: {0}")]
    Stdin(String),

    #[error(
        "unable to cache oauth token at {}: {source} (check that the directory is writable by the current user)",
        .path.display()
    )]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to return the token from callback")]
    Handoff,

    #[error("template error: {0}")]
    Render(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

fn format_validation(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

impl From<askama::Error> for AuthError {
    fn from(e: askama::Error) -> Self {
        AuthError::Render(e.to_string())
    }
}

impl AuthError {
    /// A missing or unreadable token cache triggers interactive
    /// authorization instead of failing.
    pub fn is_cache_miss(&self) -> bool {
        matches!(self, Self::TokenNotFound(_) | Self::TokenDecode { .. })
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Exchange(_) => StatusCode::BAD_GATEWAY,
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::TokenNotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) | Self::Validation(_) => "CONFIG_ERROR",
            Self::CredentialsFile { .. }
            | Self::CredentialsSize { .. }
            | Self::CredentialsPermissions { .. }
            | Self::CredentialsParse(_)
            | Self::MissingEnv { .. } => "CREDENTIALS_ERROR",
            Self::TokenNotFound(_) => "TOKEN_NOT_FOUND",
            Self::TokenDecode { .. } => "TOKEN_DECODE_ERROR",
            Self::Exchange(_) => "EXCHANGE_ERROR",
            Self::Listener(_) => "LISTENER_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::Stdin(_) => "STDIN_ERROR",
            Self::Persistence { .. } => "PERSISTENCE_ERROR",
            Self::Handoff => "HANDOFF_ERROR",
            Self::Render(_) => "RENDER_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Http(_) => "HTTP_ERROR",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = format!("{}: {}", self.error_code(), self);
        (status, body).into_response()
    }
}

pub type AuthResult<T> = Result<T, AuthError>;
