pub mod errors;
pub mod logging;
pub mod random;
pub mod security;

pub use errors::{AuthError, AuthResult};
pub use logging::init_logging;
pub use random::{AlphanumericState, StateGenerator, MIN_STATE_LEN};
pub use security::{constant_time_eq, mask_token};
