use crate::auth::provider::TokenExchanger;
use crate::auth::token::Credential;
use crate::config::WebRoutes;
use crate::http_server::pages::PageRenderer;
use crate::utils::errors::AuthError;
use crate::utils::security::constant_time_eq;
use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

/// Everything the handlers of one authorization attempt share.
pub struct CallbackContext {
    /// Expected `state` for this attempt.
    pub state: String,
    pub app_name: String,
    pub routes: WebRoutes,
    pub use_index_page: bool,
    pub exchanger: Arc<dyn TokenExchanger>,
    pub pages: Arc<dyn PageRenderer>,
    pub handoff: mpsc::Sender<Credential>,
}

pub type AppState = Arc<CallbackContext>;

#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

/// Root, login and callback routes, each also reachable without the
/// trailing slash.
pub fn router(ctx: AppState) -> Router {
    let routes = ctx.routes.clone();
    let mut router = Router::new()
        .route(&routes.root, get(root_handler))
        .route(&routes.login, get(login_handler))
        .route(routes.login.trim_end_matches('/'), get(login_handler))
        .route(&routes.callback, get(callback_handler))
        .route(routes.callback.trim_end_matches('/'), get(callback_handler));

    let bare_root = routes.root.trim_end_matches('/');
    if !bare_root.is_empty() {
        router = router.route(bare_root, get(root_handler));
    }

    router.layer(TraceLayer::new_for_http()).with_state(ctx)
}

pub async fn root_handler(State(ctx): State<AppState>) -> Response {
    if !ctx.use_index_page {
        return Redirect::temporary(&ctx.routes.login).into_response();
    }
    match ctx.pages.index(&ctx.app_name, &ctx.routes.login) {
        Ok(page) => Html(page).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn login_handler(State(ctx): State<AppState>) -> Redirect {
    debug!("Redirecting to the provider authorization page");
    Redirect::temporary(&ctx.exchanger.authorize_url(&ctx.state))
}

pub async fn callback_handler(
    State(ctx): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Response {
    let state = params.state.unwrap_or_default();
    if !constant_time_eq(state.as_bytes(), ctx.state.as_bytes()) {
        warn!("Invalid oauth state on callback, ignoring");
        return Redirect::temporary(&ctx.routes.root).into_response();
    }

    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        warn!("Callback without an authorization code");
        return Redirect::temporary(&ctx.routes.root).into_response();
    };

    let credential = match ctx.exchanger.exchange_code(&code).await {
        Ok(credential) => credential,
        Err(e) => {
            warn!("Code exchange failed: {}", e);
            return Redirect::temporary(&ctx.routes.root).into_response();
        }
    };

    // The page is rendered before the handoff since the listener may be
    // torn down as soon as the credential is delivered.
    let page = ctx.pages.success(&ctx.app_name);

    if ctx.handoff.try_send(credential).is_err() {
        warn!("No one is waiting for the credential");
        return AuthError::Handoff.into_response();
    }
    info!("Credential received on callback");

    match page {
        Ok(page) => Html(page).into_response(),
        Err(e) => e.into_response(),
    }
}
