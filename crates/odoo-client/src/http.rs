//! HTTP transport setup

use std::time::Duration;

use reqwest::{Client, Url};

use crate::config::validate_timeout;
use crate::error::{OdooError, OdooResult};

pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Path of Odoo's JSON-RPC entry point
pub const JSONRPC_PATH: &str = "jsonrpc";

/// Create a reqwest HTTP client with the given request timeout (at least 1 second)
pub fn create_http_client(timeout_secs: u64) -> OdooResult<Client> {
    let timeout_secs = validate_timeout(timeout_secs)?;

    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS.min(timeout_secs)))
        .user_agent(concat!("odoo-client/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| OdooError::Config(format!("Failed to build HTTP client: {}", e)))
}

/// Resolve `<base>/jsonrpc`, keeping any path prefix on the base URL
pub fn jsonrpc_endpoint(base: &str) -> OdooResult<Url> {
    let mut url = Url::parse(base.trim())
        .map_err(|e| OdooError::Config(format!("Invalid server URL '{}': {}", base, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(OdooError::Config(format!(
            "Unsupported URL scheme '{}', expected http or https",
            url.scheme()
        )));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    url.join(JSONRPC_PATH)
        .map_err(|e| OdooError::Config(format!("Invalid server URL '{}': {}", base, e)))
}
