pub mod manager;
pub mod types;
pub mod validation;

pub use manager::{ConfigLoader, ENV_PREFIX};
pub use types::*;
pub use validation::{ConfigValidator, ValidationError};
