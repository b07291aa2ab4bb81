//! Browser authorization flow against a real local listener

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::StatusCode;
use sheets_refresh::auth::{
    Authorizer, BrowserAuthorizer, BrowserLauncher, Credential, TokenExchanger,
};
use sheets_refresh::config::{AuthConfig, WebRoutes};
use sheets_refresh::utils::StateGenerator;
use sheets_refresh::{AuthError, AuthResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

const STATE: &str = "fixedstatetoken0123456789";

struct StubProvider;

#[async_trait]
impl TokenExchanger for StubProvider {
    fn authorize_url(&self, state: &str) -> String {
        format!("https://provider.test/auth?state={}", state)
    }

    async fn exchange_code(&self, code: &str) -> AuthResult<Credential> {
        match code {
            "good" => Ok(Credential::new("ya29.browser").with_refresh_token("1//browser")),
            "slow" => {
                tokio::time::sleep(Duration::from_millis(400)).await;
                Ok(Credential::new("ya29.slow"))
            }
            _ => Err(AuthError::Exchange("invalid_grant".to_string())),
        }
    }

    async fn refresh(&self, credential: &Credential) -> AuthResult<Credential> {
        Ok(credential.clone())
    }
}

struct FixedState;

impl StateGenerator for FixedState {
    fn generate(&self) -> String {
        STATE.to_string()
    }
}

/// Plays the user's browser: forged callback, failed exchange, then the
/// real one.
#[derive(Default)]
struct ScriptedBrowser {
    run: Mutex<Option<JoinHandle<Vec<(String, StatusCode)>>>>,
}

impl BrowserLauncher for ScriptedBrowser {
    fn open(&self, url: &str) -> std::io::Result<()> {
        let base = url.to_string();
        let handle = tokio::spawn(async move {
            let client = reqwest::Client::builder()
                .redirect(reqwest::redirect::Policy::none())
                .build()
                .unwrap();
            let mut seen = Vec::new();
            for path in [
                String::new(),
                "login/".to_string(),
                "callback/?state=forged&code=good".to_string(),
                format!("callback/?state={}&code=bad", STATE),
                format!("callback/?state={}&code=good", STATE),
            ] {
                let response = client
                    .get(format!("{}{}", base, path))
                    .send()
                    .await
                    .unwrap();
                let location = response
                    .headers()
                    .get(reqwest::header::LOCATION)
                    .map(|v| v.to_str().unwrap().to_string())
                    .unwrap_or_default();
                seen.push((location, response.status()));
            }
            seen
        });
        *self.run.lock() = Some(handle);
        Ok(())
    }
}

/// Sends a slow valid callback, then a fast one that completes first.
#[derive(Default)]
struct DuplicateCallbackBrowser {
    slow: Mutex<Option<JoinHandle<StatusCode>>>,
}

impl BrowserLauncher for DuplicateCallbackBrowser {
    fn open(&self, url: &str) -> std::io::Result<()> {
        let slow_url = format!("{}callback/?state={}&code=slow", url, STATE);
        let fast_url = format!("{}callback/?state={}&code=good", url, STATE);
        let slow = tokio::spawn(async move { reqwest::get(slow_url).await.unwrap().status() });
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            reqwest::get(fast_url).await.unwrap();
        });
        *self.slow.lock() = Some(slow);
        Ok(())
    }
}

/// Remembers the URL without visiting it.
#[derive(Default)]
struct IdleBrowser {
    url: Mutex<Option<String>>,
}

impl BrowserLauncher for IdleBrowser {
    fn open(&self, url: &str) -> std::io::Result<()> {
        *self.url.lock() = Some(url.to_string());
        Err(std::io::Error::new(std::io::ErrorKind::NotFound, "no browser"))
    }
}

fn routes(listener_addr: &str) -> WebRoutes {
    AuthConfig {
        listener_addr: listener_addr.to_string(),
        ..Default::default()
    }
    .normalized()
}

#[tokio::test]
async fn test_browser_flow_delivers_credential() {
    let browser = Arc::new(ScriptedBrowser::default());
    let authorizer =
        BrowserAuthorizer::new(Arc::new(StubProvider), routes("127.0.0.1:0"), "sheets")
            .with_state_generator(Arc::new(FixedState))
            .with_launcher(browser.clone())
            .with_timeout(Some(Duration::from_secs(30)));

    let credential = authorizer.authorize().await.unwrap();
    assert_eq!(credential.access_token, "ya29.browser");

    let handle = browser.run.lock().take().unwrap();
    let seen = handle.await.unwrap();
    assert_eq!(seen[0].1, StatusCode::OK);
    assert_eq!(seen[1].1, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(seen[1].0, format!("https://provider.test/auth?state={}", STATE));
    // forged state and failed exchange send the user back to the start
    assert_eq!(seen[2], ("/".to_string(), StatusCode::TEMPORARY_REDIRECT));
    assert_eq!(seen[3], ("/".to_string(), StatusCode::TEMPORARY_REDIRECT));
    assert_eq!(seen[4].1, StatusCode::OK);
}

#[tokio::test]
async fn test_late_duplicate_callback_is_refused() {
    let browser = Arc::new(DuplicateCallbackBrowser::default());
    let authorizer =
        BrowserAuthorizer::new(Arc::new(StubProvider), routes("127.0.0.1:0"), "sheets")
            .with_state_generator(Arc::new(FixedState))
            .with_launcher(browser.clone())
            .with_timeout(Some(Duration::from_secs(30)));

    let credential = authorizer.authorize().await.unwrap();
    assert_eq!(credential.access_token, "ya29.browser");

    // the slower callback finishes after delivery and must not report success
    let slow = browser.slow.lock().take().unwrap();
    assert_eq!(slow.await.unwrap(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_timeout_shuts_listener_down() {
    let browser = Arc::new(IdleBrowser::default());
    let authorizer =
        BrowserAuthorizer::new(Arc::new(StubProvider), routes("127.0.0.1:0"), "sheets")
            .with_launcher(browser.clone())
            .with_timeout(Some(Duration::from_millis(200)));

    let err = authorizer.authorize().await.unwrap_err();
    assert!(matches!(err, AuthError::Timeout(_)));

    let url = browser.url.lock().clone().unwrap();
    let addr = url
        .trim_start_matches("http://")
        .trim_end_matches('/')
        .to_string();
    // nothing is listening any more
    assert!(reqwest::get(&url).await.is_err());
    tokio::net::TcpListener::bind(&addr).await.unwrap();
}

#[tokio::test]
async fn test_bind_failure_is_reported() {
    let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = taken.local_addr().unwrap().to_string();

    let authorizer = BrowserAuthorizer::new(Arc::new(StubProvider), routes(&addr), "sheets")
        .with_launcher(Arc::new(IdleBrowser::default()));
    let err = authorizer.authorize().await.unwrap_err();
    assert!(matches!(err, AuthError::Listener(_)));
}

#[tokio::test]
async fn test_successive_attempts_use_fresh_state() {
    let browser = Arc::new(IdleBrowser::default());
    let mut states = Vec::new();
    for _ in 0..2 {
        let authorizer =
            BrowserAuthorizer::new(Arc::new(StubProvider), routes("127.0.0.1:0"), "sheets")
                .with_launcher(browser.clone())
                .with_timeout(Some(Duration::from_millis(500)));
        let run = tokio::spawn(async move { authorizer.authorize().await });

        let url = loop {
            if let Some(url) = browser.url.lock().take() {
                break url;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        };
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();
        let response = client.get(format!("{}login/", url)).send().await.unwrap();
        let location = response.headers()[reqwest::header::LOCATION]
            .to_str()
            .unwrap()
            .to_string();
        states.push(location);

        assert!(matches!(run.await.unwrap(), Err(AuthError::Timeout(_))));
    }
    assert_ne!(states[0], states[1]);
}
