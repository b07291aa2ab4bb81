//! Random state tokens for authorization attempts.

use rand::distr::Alphanumeric;
use rand::Rng;

/// Shortest state token accepted by the browser flow.
pub const MIN_STATE_LEN: usize = 16;

/// Produces the single-use correlation value for one authorization attempt.
pub trait StateGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Alphanumeric tokens drawn from the thread-local CSPRNG.
#[derive(Debug, Clone)]
pub struct AlphanumericState {
    len: usize,
}

impl AlphanumericState {
    /// Lengths below [`MIN_STATE_LEN`] are raised to it.
    pub fn new(len: usize) -> Self {
        Self {
            len: len.max(MIN_STATE_LEN),
        }
    }
}

impl Default for AlphanumericState {
    fn default() -> Self {
        Self::new(32)
    }
}

impl StateGenerator for AlphanumericState {
    fn generate(&self) -> String {
        rand::rng()
            .sample_iter(&Alphanumeric)
            .take(self.len)
            .map(char::from)
            .collect()
    }
}
