use crate::utils::errors::AuthResult;
use askama::Template;

/// HTML shown by the callback listener.
pub trait PageRenderer: Send + Sync {
    /// Landing page linking to the login route.
    fn index(&self, app_name: &str, login_path: &str) -> AuthResult<String>;

    /// Shown once the credential has been obtained.
    fn success(&self, app_name: &str) -> AuthResult<String>;
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexPage<'a> {
    app_name: &'a str,
    login_path: &'a str,
}

#[derive(Template)]
#[template(path = "success.html")]
struct SuccessPage<'a> {
    app_name: &'a str,
}

/// Pages compiled from `templates/`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AskamaPages;

impl PageRenderer for AskamaPages {
    fn index(&self, app_name: &str, login_path: &str) -> AuthResult<String> {
        Ok(IndexPage {
            app_name,
            login_path,
        }
        .render()?)
    }

    fn success(&self, app_name: &str) -> AuthResult<String> {
        Ok(SuccessPage { app_name }.render()?)
    }
}
