use sha2::{Digest, Sha256};

pub const DEFAULT_VENDOR: &str = "xls2sheets";
pub const DEFAULT_APP_PREFIX: &str = "auth-";

/// Vendor and application name that together select the token cache
/// directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppIdentity {
    pub vendor: String,
    pub app_name: String,
}

impl AppIdentity {
    /// Explicit names win. Without an application name, one is derived from
    /// the client id so the same client always lands in the same directory.
    pub fn resolve(vendor: Option<&str>, app_name: Option<&str>, client_id: &str) -> Self {
        let vendor = match vendor {
            Some(v) if !v.is_empty() => v.to_string(),
            _ => DEFAULT_VENDOR.to_string(),
        };
        let app_name = match app_name {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => default_app_name(client_id),
        };
        Self { vendor, app_name }
    }
}

pub fn default_app_name(client_id: &str) -> String {
    format!("{}{}", DEFAULT_APP_PREFIX, client_id_hash(client_id))
}

/// Lowercase hex SHA-256 of the client id.
pub fn client_id_hash(client_id: &str) -> String {
    let digest = Sha256::digest(client_id.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}
