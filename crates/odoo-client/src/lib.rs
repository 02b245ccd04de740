//! Client for the Odoo ERP external API over JSON-RPC.
//!
//! ```no_run
//! # async fn run() -> odoo_client::OdooResult<()> {
//! use odoo_client::{connect, ClientConfig, SearchOptions};
//! use serde_json::json;
//!
//! let config = ClientConfig::new("https://erp.example.com", "prod", "admin", "secret");
//! let client = connect(&config).await?;
//! let partners = client
//!     .search_read(
//!         "res.partner",
//!         json!([["is_company", "=", true]]),
//!         &SearchOptions::new().limit(10),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod jsonrpc;
pub mod orm;

pub use client::{connect, OdooClient, ServerVersion, Session};
pub use config::ClientConfig;
pub use error::{AuthFailure, OdooError, OdooResult, RemoteError};
pub use jsonrpc::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
pub use orm::{RecordId, SearchOptions};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");
