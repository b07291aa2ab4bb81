//! Local callback listener for the browser authorization flow

pub mod pages;
pub mod routes;
pub mod server;

pub use pages::{AskamaPages, PageRenderer};
pub use routes::{router, AppState, CallbackContext};
pub use server::CallbackServer;
