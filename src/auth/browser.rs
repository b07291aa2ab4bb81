//! Browser authorization flow
//!
//! A local listener serves a landing page, redirects to the provider and
//! receives the callback. The caller waits for whichever comes first: a
//! credential from the callback handler, a listener failure, or the
//! optional timeout. The listener is shut down and awaited before
//! returning in every case.

use crate::auth::provider::{Authorizer, TokenExchanger};
use crate::auth::token::Credential;
use crate::config::WebRoutes;
use crate::http_server::pages::{AskamaPages, PageRenderer};
use crate::http_server::routes::{self, CallbackContext};
use crate::http_server::server::CallbackServer;
use crate::utils::errors::{AuthError, AuthResult};
use crate::utils::random::{AlphanumericState, StateGenerator};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Opens a URL in the user's browser.
pub trait BrowserLauncher: Send + Sync {
    fn open(&self, url: &str) -> std::io::Result<()>;
}

/// Uses the platform's default browser.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBrowser;

impl BrowserLauncher for SystemBrowser {
    fn open(&self, url: &str) -> std::io::Result<()> {
        open::that_detached(url)
    }
}

pub struct BrowserAuthorizer {
    exchanger: Arc<dyn TokenExchanger>,
    routes: WebRoutes,
    app_name: String,
    use_index_page: bool,
    timeout: Option<Duration>,
    pages: Arc<dyn PageRenderer>,
    state: Arc<dyn StateGenerator>,
    launcher: Arc<dyn BrowserLauncher>,
}

impl BrowserAuthorizer {
    pub fn new(
        exchanger: Arc<dyn TokenExchanger>,
        routes: WebRoutes,
        app_name: impl Into<String>,
    ) -> Self {
        Self {
            exchanger,
            routes,
            app_name: app_name.into(),
            use_index_page: true,
            timeout: None,
            pages: Arc::new(AskamaPages),
            state: Arc::new(AlphanumericState::default()),
            launcher: Arc::new(SystemBrowser),
        }
    }

    pub fn with_index_page(mut self, enabled: bool) -> Self {
        self.use_index_page = enabled;
        self
    }

    /// `None` waits until the callback arrives or the listener fails.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_pages(mut self, pages: Arc<dyn PageRenderer>) -> Self {
        self.pages = pages;
        self
    }

    pub fn with_state_generator(mut self, state: Arc<dyn StateGenerator>) -> Self {
        self.state = state;
        self
    }

    pub fn with_launcher(mut self, launcher: Arc<dyn BrowserLauncher>) -> Self {
        self.launcher = launcher;
        self
    }
}

async fn wait_for(timeout: Option<Duration>) {
    match timeout {
        Some(duration) => tokio::time::sleep(duration).await,
        None => std::future::pending().await,
    }
}

#[async_trait]
impl Authorizer for BrowserAuthorizer {
    async fn authorize(&self) -> AuthResult<Credential> {
        let (handoff, mut received) = mpsc::channel(1);
        let ctx = Arc::new(CallbackContext {
            state: self.state.generate(),
            app_name: self.app_name.clone(),
            routes: self.routes.clone(),
            use_index_page: self.use_index_page,
            exchanger: Arc::clone(&self.exchanger),
            pages: Arc::clone(&self.pages),
            handoff,
        });

        let mut server =
            CallbackServer::bind(&self.routes.listener_addr, routes::router(ctx)).await?;
        let url = format!("http://{}{}", server.local_addr(), self.routes.root);

        println!(
            "Please follow the instructions in your browser to authorize {}\n\
             or press [Ctrl]+[C] to cancel...",
            self.app_name
        );
        if let Err(e) = self.launcher.open(&url) {
            debug!("Unable to open the browser: {}", e);
        }
        println!(
            "If your browser does not open automatically, please open this link:\n{}",
            url
        );

        let outcome = tokio::select! {
            error = server.failed() => Err(error),
            credential = received.recv() => credential.ok_or(AuthError::Handoff),
            _ = wait_for(self.timeout) => {
                Err(AuthError::Timeout(self.timeout.unwrap_or_default()))
            }
        };

        // Callbacks still in flight during shutdown must see the handoff as closed.
        received.close();
        server.shutdown().await;
        if outcome.is_ok() {
            info!("Browser authorization complete");
        }
        outcome
    }
}
