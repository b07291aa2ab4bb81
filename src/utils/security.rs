//! Token masking and constant-time comparison helpers.

use subtle::ConstantTimeEq;

const MASK_PREFIX_LEN: usize = 6;
const MASK_SUFFIX_LEN: usize = 4;

/// Shortens a secret to something safe to print in logs.
pub fn mask_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let len = trimmed.len();
    if len <= MASK_PREFIX_LEN + MASK_SUFFIX_LEN || !trimmed.is_ascii() {
        return "*".repeat(len.min(8));
    }

    let prefix = &trimmed[..MASK_PREFIX_LEN];
    let suffix = &trimmed[len - MASK_SUFFIX_LEN..];
    format!("{prefix}...{suffix}")
}

pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}
