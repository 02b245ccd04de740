//! Error Types
//!
//! Unified error handling for the client with JSON-RPC style code mapping.

use std::fmt;

use serde_json::Value;

use crate::jsonrpc::JsonRpcError;

/// Exception class Odoo raises for rejected credentials.
const ACCESS_DENIED: &str = "odoo.exceptions.AccessDenied";

/// Client-side error codes, in the JSON-RPC implementation-defined range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    ParseError = -32700,
    InvalidParams = -32602,

    AuthenticationFailed = -32010,
    NotAuthenticated = -32011,
    TransportFailed = -32012,
    InvalidResponse = -32013,
    ConfigInvalid = -32014,
}

impl ErrorCode {
    pub fn code(&self) -> i32 {
        *self as i32
    }
}

/// Why an authentication handshake failed.
#[derive(Debug, Clone)]
pub enum AuthFailure {
    /// The server answered the login with `false`.
    Rejected,
    /// The server could not be reached or answered with a non-success status.
    Unreachable(String),
    /// The server raised an error, e.g. an unknown database.
    Server(RemoteError),
    /// The server answered with something other than an Odoo login result,
    /// e.g. an HTML page from a proxy.
    UnexpectedResponse(String),
}

impl fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthFailure::Rejected => write!(f, "invalid login or password"),
            AuthFailure::Unreachable(reason) => write!(f, "server unreachable: {}", reason),
            AuthFailure::Server(err) => write!(f, "server error: {}", err),
            AuthFailure::UnexpectedResponse(reason) => {
                write!(f, "not an Odoo JSON-RPC endpoint: {}", reason)
            }
        }
    }
}

/// An application-level error payload returned by the Odoo server.
#[derive(Debug, Clone)]
pub struct RemoteError {
    /// JSON-RPC error code (Odoo uses 200 for server exceptions, 100 for session expiry)
    pub code: i32,

    /// Top-level message, usually "Odoo Server Error"
    pub message: String,

    /// Python exception class, e.g. "odoo.exceptions.ValidationError"
    pub name: Option<String>,

    /// Human readable message from the exception
    pub detail: Option<String>,

    /// Server-side traceback
    pub debug: Option<String>,

    /// Exception arguments
    pub arguments: Vec<Value>,
}

impl RemoteError {
    pub fn is_access_denied(&self) -> bool {
        self.name.as_deref() == Some(ACCESS_DENIED)
    }

    /// The most specific message available.
    pub fn display_message(&self) -> &str {
        self.detail.as_deref().unwrap_or(&self.message)
    }
}

impl From<JsonRpcError> for RemoteError {
    fn from(err: JsonRpcError) -> Self {
        let data = err.data.unwrap_or(Value::Null);
        let text = |key: &str| data.get(key).and_then(|v| v.as_str()).map(str::to_string);

        Self {
            code: err.code,
            name: text("name"),
            detail: text("message").filter(|m| !m.is_empty()),
            debug: text("debug"),
            arguments: data
                .get("arguments")
                .and_then(|v| v.as_array())
                .cloned()
                .unwrap_or_default(),
            message: err.message,
        }
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "[{}] {} ({})", self.code, self.display_message(), name),
            None => write!(f, "[{}] {}", self.code, self.display_message()),
        }
    }
}

impl std::error::Error for RemoteError {}

/// Errors returned by [`crate::OdooClient`] and [`crate::connect`].
#[derive(Debug, thiserror::Error)]
pub enum OdooError {
    #[error("Authentication failed for '{username}' on database '{database}': {failure}")]
    Authentication {
        database: String,
        username: String,
        failure: AuthFailure,
    },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Remote error: {0}")]
    Remote(RemoteError),

    #[error("Client is not authenticated; call authenticate() first")]
    NotAuthenticated,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl OdooError {
    /// Convert to a JSON-RPC style error code
    pub fn code(&self) -> i32 {
        match self {
            OdooError::Authentication { .. } => ErrorCode::AuthenticationFailed.code(),
            OdooError::Transport(_) => ErrorCode::TransportFailed.code(),
            OdooError::Remote(err) => err.code,
            OdooError::NotAuthenticated => ErrorCode::NotAuthenticated.code(),
            OdooError::InvalidResponse(_) => ErrorCode::InvalidResponse.code(),
            OdooError::InvalidArgument(_) => ErrorCode::InvalidParams.code(),
            OdooError::Config(_) => ErrorCode::ConfigInvalid.code(),
            OdooError::Json(_) => ErrorCode::ParseError.code(),
        }
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, OdooError::Authentication { .. })
    }

    pub fn remote(&self) -> Option<&RemoteError> {
        match self {
            OdooError::Remote(err) => Some(err),
            OdooError::Authentication {
                failure: AuthFailure::Server(err),
                ..
            } => Some(err),
            _ => None,
        }
    }
}

impl From<RemoteError> for OdooError {
    fn from(err: RemoteError) -> Self {
        OdooError::Remote(err)
    }
}

/// Result alias used throughout the crate
pub type OdooResult<T> = Result<T, OdooError>;
