//! Configuration validation
//!
//! Every problem is collected and reported together instead of failing on
//! the first one.

use crate::config::{AuthConfig, Config, CredentialsConfig, LoggingConfig};

/// Validation error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Configuration validator
#[derive(Debug, Default)]
pub struct ConfigValidator;

impl ConfigValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, config: &Config) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        self.validate_auth_config(&config.auth, &mut errors);
        self.validate_credentials_config(&config.credentials, &mut errors);
        self.validate_logging_config(&config.logging, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn validate_auth(&self, auth: &AuthConfig) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        self.validate_auth_config(auth, &mut errors);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_auth_config(&self, auth: &AuthConfig, errors: &mut Vec<ValidationError>) {
        // An empty address falls back to the default listener.
        let addr = auth.listener_addr.trim();
        if !addr.is_empty() {
            match addr.rsplit_once(':') {
                None => errors.push(ValidationError::new(
                    "auth.listener_addr",
                    format!("expected host:port, got {:?}", addr),
                )),
                Some((host, port)) => {
                    if host.is_empty() {
                        errors.push(ValidationError::new(
                            "auth.listener_addr",
                            "host cannot be empty",
                        ));
                    }
                    match port.parse::<u16>() {
                        Err(_) => errors.push(ValidationError::new(
                            "auth.listener_addr",
                            format!("invalid port {:?}", port),
                        )),
                        // the redirect URL is derived from the listener port
                        Ok(0) if auth.redirect_url_base.is_none() => {
                            errors.push(ValidationError::new(
                                "auth.listener_addr",
                                "port 0 requires redirect_url_base",
                            ))
                        }
                        Ok(_) => {}
                    }
                }
            }
        }

        if !auth.root_path.is_empty() {
            if !auth.root_path.starts_with('/') {
                errors.push(ValidationError::new(
                    "auth.root_path",
                    "must start with '/'",
                ));
            }
            if auth.root_path.contains(['?', '#']) {
                errors.push(ValidationError::new(
                    "auth.root_path",
                    "cannot contain a query or fragment",
                ));
            }
            if auth.root_path.contains(['{', '}', '*'])
                || auth.root_path.split('/').any(|s| s.starts_with(':'))
            {
                errors.push(ValidationError::new(
                    "auth.root_path",
                    "cannot contain route parameters or wildcards",
                ));
            }
        }

        if let Some(base) = auth.redirect_url_base.as_deref() {
            match url::Url::parse(base.trim()) {
                Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {
                    if url.query().is_some() || url.fragment().is_some() {
                        errors.push(ValidationError::new(
                            "auth.redirect_url_base",
                            "cannot contain a query or fragment",
                        ));
                    }
                }
                Ok(url) => errors.push(ValidationError::new(
                    "auth.redirect_url_base",
                    format!("unsupported scheme {:?}", url.scheme()),
                )),
                Err(e) => errors.push(ValidationError::new(
                    "auth.redirect_url_base",
                    format!("invalid URL: {}", e),
                )),
            }
        }

        for (path, value) in [
            ("auth.vendor", auth.vendor.as_deref()),
            ("auth.app_name", auth.app_name.as_deref()),
        ] {
            if let Some(name) = value {
                if let Some(message) = path_component_problem(name) {
                    errors.push(ValidationError::new(path, message));
                }
            }
        }
    }

    fn validate_credentials_config(
        &self,
        credentials: &CredentialsConfig,
        errors: &mut Vec<ValidationError>,
    ) {
        if credentials.scopes.is_empty() {
            errors.push(ValidationError::new(
                "credentials.scopes",
                "at least one scope is required",
            ));
        }
        for (idx, scope) in credentials.scopes.iter().enumerate() {
            if scope.trim().is_empty() || scope.contains(char::is_whitespace) {
                errors.push(ValidationError::new(
                    format!("credentials.scopes[{}]", idx),
                    format!("invalid scope {:?}", scope),
                ));
            }
        }

        match (&credentials.client_id_env, &credentials.client_secret_env) {
            (Some(_), None) => errors.push(ValidationError::new(
                "credentials.client_secret_env",
                "must be set together with client_id_env",
            )),
            (None, Some(_)) => errors.push(ValidationError::new(
                "credentials.client_id_env",
                "must be set together with client_secret_env",
            )),
            (Some(id), Some(secret)) if id.is_empty() || secret.is_empty() => {
                errors.push(ValidationError::new(
                    "credentials",
                    "environment variable names cannot be empty",
                ))
            }
            _ => {}
        }

        if credentials.env_vars().is_none() && credentials.file.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "credentials.file",
                "a credentials file or environment variables are required",
            ));
        }
    }

    fn validate_logging_config(&self, logging: &LoggingConfig, errors: &mut Vec<ValidationError>) {
        if logging.level.trim().is_empty() {
            errors.push(ValidationError::new("logging.level", "cannot be empty"));
        }
    }
}

fn path_component_problem(name: &str) -> Option<&'static str> {
    if name.is_empty() {
        Some("cannot be empty")
    } else if name == "." || name == ".." {
        Some("cannot be a relative directory reference")
    } else if name.contains(['/', '\\']) {
        Some("must be a single directory name")
    } else {
        None
    }
}
