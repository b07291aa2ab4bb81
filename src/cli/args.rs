//! CLI argument types - shared between binary and tests

use crate::config::{AuthMode, Config};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Cache directory names used by the command-line tool unless configured.
pub const CLI_VENDOR: &str = "rusq";
pub const CLI_APP_NAME: &str = "sheets-refresh";

#[derive(Parser, Debug)]
#[command(name = "sheets-refresh")]
#[command(about = "Authorize access to Google Sheets and manage the cached token")]
#[command(version)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    /// Log level
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,
    /// Log as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Obtain a token, from the cache or interactively
    Login(LoginArgs),
    /// Delete the cached token
    Logout(CredentialArgs),
    /// Show where the token is cached and when it expires
    Status(CredentialArgs),
}

#[derive(Args, Debug, Default, Clone)]
pub struct CredentialArgs {
    /// Client secret JSON file
    #[arg(short, long)]
    pub auth: Option<PathBuf>,
}

#[derive(Args, Debug, Default, Clone)]
pub struct LoginArgs {
    #[command(flatten)]
    pub credentials: CredentialArgs,
    /// Paste the authorization code in the terminal instead of using the browser
    #[arg(long)]
    pub console: bool,
    /// Discard the cached token first
    #[arg(long)]
    pub reset: bool,
    /// Go straight to the provider login instead of showing the landing page
    #[arg(long)]
    pub no_index: bool,
}

impl Cli {
    /// Command-line flags override whatever the configuration layers set.
    pub fn apply(&self, config: &mut Config) {
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if self.log_json {
            config.logging.json = true;
        }
        config
            .auth
            .vendor
            .get_or_insert_with(|| CLI_VENDOR.to_string());
        config
            .auth
            .app_name
            .get_or_insert_with(|| CLI_APP_NAME.to_string());

        let credentials = match &self.command {
            Command::Login(args) => {
                if args.console {
                    config.auth.mode = AuthMode::Terminal;
                }
                if args.reset {
                    config.auth.reset = true;
                }
                if args.no_index {
                    config.auth.use_index_page = false;
                }
                &args.credentials
            }
            Command::Logout(args) | Command::Status(args) => args,
        };

        if let Some(file) = &credentials.auth {
            let expanded = shellexpand::tilde(&file.to_string_lossy()).to_string();
            config.credentials.file = PathBuf::from(expanded);
            config.credentials.client_id_env = None;
            config.credentials.client_secret_env = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_flags_override_config() {
        let cli = Cli::parse_from([
            "sheets-refresh",
            "--log-level",
            "debug",
            "login",
            "--console",
            "--reset",
            "--no-index",
            "--auth",
            "/tmp/creds.json",
        ]);
        let mut config = Config::default();
        config.credentials.client_id_env = Some("ID".to_string());
        config.credentials.client_secret_env = Some("SECRET".to_string());
        cli.apply(&mut config);

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.auth.mode, AuthMode::Terminal);
        assert!(config.auth.reset);
        assert!(!config.auth.use_index_page);
        assert_eq!(config.credentials.file, PathBuf::from("/tmp/creds.json"));
        assert!(config.credentials.env_vars().is_none());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["sheets-refresh", "status", "--log-json"]);
        let mut config = Config::default();
        cli.apply(&mut config);
        assert!(config.logging.json);
        assert_eq!(config.auth.mode, AuthMode::Web);
    }

    #[test]
    fn test_cache_names_default_to_the_tool() {
        let cli = Cli::parse_from(["sheets-refresh", "login"]);
        let mut config = Config::default();
        cli.apply(&mut config);
        assert_eq!(config.auth.vendor.as_deref(), Some(CLI_VENDOR));
        assert_eq!(config.auth.app_name.as_deref(), Some(CLI_APP_NAME));

        let mut config = Config::default();
        config.auth.vendor = Some("acme".to_string());
        config.auth.app_name = Some("reports".to_string());
        cli.apply(&mut config);
        assert_eq!(config.auth.vendor.as_deref(), Some("acme"));
        assert_eq!(config.auth.app_name.as_deref(), Some("reports"));
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
