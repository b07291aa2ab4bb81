//! Error type tests

use axum::http::StatusCode;
use axum::response::IntoResponse;
use sheets_refresh::AuthError;
use std::time::Duration;

#[test]
fn test_error_codes() {
    assert_eq!(
        AuthError::Timeout(Duration::from_secs(1)).error_code(),
        "TIMEOUT"
    );
    assert_eq!(AuthError::Validation(vec![]).error_code(), "CONFIG_ERROR");
    assert_eq!(
        AuthError::MissingEnv {
            id_var: "ID".to_string(),
            secret_var: "SECRET".to_string(),
        }
        .error_code(),
        "CREDENTIALS_ERROR"
    );
}

#[tokio::test]
async fn test_response_carries_code_and_message() {
    let response = AuthError::Handoff.into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(
        String::from_utf8(body.to_vec()).unwrap(),
        "HANDOFF_ERROR: failed to return the token from callback"
    );
}

#[test]
fn test_timeout_message() {
    let err = AuthError::Timeout(Duration::from_secs(300));
    assert_eq!(
        err.to_string(),
        "no authorization callback received within 300s"
    );
}
