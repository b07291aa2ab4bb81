use crate::config::{Config, ConfigValidator};
use crate::utils::errors::{AuthError, AuthResult};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Prefix for environment overrides, e.g. `SHEETS_REFRESH_AUTH__MODE=terminal`.
pub const ENV_PREFIX: &str = "SHEETS_REFRESH_";

/// Layers defaults, an optional TOML file and environment overrides.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    path: Option<PathBuf>,
    use_env: bool,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            path: None,
            use_env: true,
        }
    }

    /// A missing file is an error once a path is given explicitly.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let expanded = shellexpand::tilde(&path.as_ref().to_string_lossy()).to_string();
        self.path = Some(PathBuf::from(expanded));
        self
    }

    pub fn without_env(mut self) -> Self {
        self.use_env = false;
        self
    }

    pub fn figment(&self) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = &self.path {
            figment = figment.merge(Toml::file(path));
        }
        if self.use_env {
            figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        }
        figment
    }

    pub fn load(&self) -> AuthResult<Config> {
        if let Some(path) = &self.path {
            if !path.exists() {
                return Err(AuthError::Config(format!(
                    "configuration file {} does not exist",
                    path.display()
                )));
            }
            debug!("Loading configuration from {}", path.display());
        }

        let mut config: Config = self
            .figment()
            .extract()
            .map_err(|e| AuthError::Config(e.to_string()))?;

        config.credentials.file = expand_path(&config.credentials.file);

        ConfigValidator::new()
            .validate(&config)
            .map_err(AuthError::Validation)?;

        Ok(config)
    }
}

fn expand_path(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).to_string())
}
