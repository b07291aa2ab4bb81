//! Configuration loading tests

use sheets_refresh::config::{AuthMode, ConfigLoader, ConfigValidator};
use sheets_refresh::AuthError;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_full_config_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[auth]
mode = "web"
redirect_url_base = "https://tunnel.example.test"
listener_addr = "127.0.0.1:8080"
root_path = "/oauth"
vendor = "acme"
use_index_page = false
callback_timeout_secs = 60

[credentials]
client_id_env = "ACME_CLIENT_ID"
client_secret_env = "ACME_CLIENT_SECRET"

[logging]
level = "warn"
json = true
"#
    )
    .unwrap();

    let config = ConfigLoader::new()
        .with_file(file.path())
        .without_env()
        .load()
        .unwrap();

    assert_eq!(config.auth.mode, AuthMode::Web);
    assert!(!config.auth.use_index_page);
    assert_eq!(
        config.credentials.env_vars(),
        Some(("ACME_CLIENT_ID", "ACME_CLIENT_SECRET"))
    );
    assert!(config.logging.json);

    let routes = config.auth.normalized();
    assert_eq!(routes.listener_addr, "127.0.0.1:8080");
    assert_eq!(routes.login, "/oauth/login/");
    assert_eq!(
        routes.redirect_url,
        "https://tunnel.example.test/oauth/callback/"
    );
}

#[test]
fn test_malformed_toml() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "[auth\nmode = ").unwrap();

    let result = ConfigLoader::new().with_file(file.path()).without_env().load();
    assert!(matches!(result, Err(AuthError::Config(_))));
}

#[test]
fn test_unknown_mode_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "[auth]\nmode = \"carrier-pigeon\"\n").unwrap();

    let result = ConfigLoader::new().with_file(file.path()).without_env().load();
    assert!(matches!(result, Err(AuthError::Config(_))));
}

#[test]
fn test_validation_errors_listed_in_message() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[auth]
root_path = "/{{id}}"
vendor = "a/b"

[credentials]
scopes = []
"#
    )
    .unwrap();

    let err = ConfigLoader::new()
        .with_file(file.path())
        .without_env()
        .load()
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("auth.root_path"));
    assert!(message.contains("auth.vendor"));
    assert!(message.contains("credentials.scopes"));
}

#[test]
fn test_default_config_validates() {
    let config = ConfigLoader::new().without_env().load().unwrap();
    assert!(ConfigValidator::new().validate(&config).is_ok());
}
