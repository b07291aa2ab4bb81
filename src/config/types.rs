use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_LISTENER_HOST: &str = "localhost";
// 6061 stays clear of the usual local dev-tooling ports.
pub const DEFAULT_LISTENER_PORT: u16 = 6061;
pub const DEFAULT_ROOT_PATH: &str = "/";
pub const DEFAULT_CALLBACK_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_CREDENTIALS_FILE: &str = "~/.refresh-credentials.json";

pub const LOGIN_PATH: &str = "login";
pub const CALLBACK_PATH: &str = "callback";

pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
pub const DRIVE_FILE_SCOPE: &str = "https://www.googleapis.com/auth/drive.file";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// How the interactive authorization is carried out.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// Local callback listener plus the system browser.
    #[default]
    Web,
    /// Print the URL and read the code from standard input.
    Terminal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AuthConfig {
    pub mode: AuthMode,
    /// Public base the provider redirects back to, when it differs from
    /// the listener address (e.g. behind a tunnel).
    pub redirect_url_base: Option<String>,
    /// `host:port` the callback listener binds to.
    pub listener_addr: String,
    pub root_path: String,
    pub vendor: Option<String>,
    pub app_name: Option<String>,
    pub use_index_page: bool,
    /// Delete the cached token before the first use.
    pub reset: bool,
    /// 0 waits for the browser callback indefinitely.
    pub callback_timeout_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            mode: AuthMode::Web,
            redirect_url_base: None,
            listener_addr: format!("{}:{}", DEFAULT_LISTENER_HOST, DEFAULT_LISTENER_PORT),
            root_path: DEFAULT_ROOT_PATH.to_string(),
            vendor: None,
            app_name: None,
            use_index_page: true,
            reset: false,
            callback_timeout_secs: DEFAULT_CALLBACK_TIMEOUT_SECS,
        }
    }
}

impl AuthConfig {
    pub fn callback_timeout(&self) -> Option<Duration> {
        match self.callback_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Resolves the derived routes and redirect URL. Call after validation.
    pub fn normalized(&self) -> WebRoutes {
        let listener_addr = if self.listener_addr.trim().is_empty() {
            format!("{}:{}", DEFAULT_LISTENER_HOST, DEFAULT_LISTENER_PORT)
        } else {
            self.listener_addr.trim().to_string()
        };

        let mut root = if self.root_path.is_empty() {
            DEFAULT_ROOT_PATH.to_string()
        } else {
            self.root_path.clone()
        };
        if !root.ends_with('/') {
            root.push('/');
        }

        let login = format!("{}{}/", root, LOGIN_PATH);
        let callback = format!("{}{}/", root, CALLBACK_PATH);

        let redirect_url = match self.redirect_url_base.as_deref().map(str::trim) {
            Some(base) if !base.is_empty() => {
                format!("{}{}", base.trim_end_matches('/'), callback)
            }
            _ => format!("http://{}{}", listener_addr, callback),
        };

        WebRoutes {
            listener_addr,
            root,
            login,
            callback,
            redirect_url,
        }
    }
}

/// Paths and addresses served by the callback listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebRoutes {
    pub listener_addr: String,
    /// Always ends with `/`.
    pub root: String,
    pub login: String,
    pub callback: String,
    pub redirect_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CredentialsConfig {
    /// Client secret JSON downloaded from the provider console.
    pub file: PathBuf,
    /// When both are set, the client id and secret come from these
    /// environment variables instead of `file`.
    pub client_id_env: Option<String>,
    pub client_secret_env: Option<String>,
    pub scopes: Vec<String>,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from(DEFAULT_CREDENTIALS_FILE),
            client_id_env: None,
            client_secret_env: None,
            scopes: vec![SPREADSHEETS_SCOPE.to_string(), DRIVE_FILE_SCOPE.to_string()],
        }
    }
}

impl CredentialsConfig {
    pub fn env_vars(&self) -> Option<(&str, &str)> {
        match (&self.client_id_env, &self.client_secret_env) {
            (Some(id), Some(secret)) => Some((id.as_str(), secret.as_str())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}
