//! Odoo JSON-RPC client
//!
//! One [`OdooClient`] owns one HTTP client and at most one authenticated
//! [`Session`]. Every operation is a single POST to `<url>/jsonrpc`; nothing
//! is retried, batched or cached.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::config::{ClientConfig, DEFAULT_TIMEOUT_SECS};
use crate::error::{AuthFailure, OdooError, OdooResult};
use crate::http::{create_http_client, jsonrpc_endpoint};
use crate::jsonrpc::{
    JsonRpcRequest, JsonRpcResponse, SERVICE_COMMON, SERVICE_DB, SERVICE_OBJECT,
};

/// Longest response body excerpt quoted in an error message.
const BODY_EXCERPT_CHARS: usize = 200;

/// Authenticated state binding a client to one database and user.
pub struct Session {
    database: String,
    username: String,
    uid: i64,
    password: Zeroizing<String>,
}

impl Session {
    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn uid(&self) -> i64 {
        self.uid
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("database", &self.database)
            .field("username", &self.username)
            .field("uid", &self.uid)
            .finish_non_exhaustive()
    }
}

/// Payload of `common.version`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerVersion {
    pub server_version: String,
    #[serde(default)]
    pub server_version_info: Vec<Value>,
    #[serde(default)]
    pub server_serie: String,
    #[serde(default)]
    pub protocol_version: i64,
}

pub struct OdooClient {
    http: Client,
    endpoint: Url,
    session: Option<Session>,
    next_id: AtomicU64,
}

impl OdooClient {
    /// Create an unauthenticated client for the server at `url`
    pub fn new(url: &str) -> OdooResult<Self> {
        Self::build(url, DEFAULT_TIMEOUT_SECS)
    }

    /// Create an unauthenticated client using the URL and timeout of `config`
    pub fn with_config(config: &ClientConfig) -> OdooResult<Self> {
        Self::build(&config.url, config.timeout_secs)
    }

    fn build(url: &str, timeout_secs: u64) -> OdooResult<Self> {
        Ok(Self {
            http: create_http_client(timeout_secs)?,
            endpoint: jsonrpc_endpoint(url)?,
            session: None,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn uid(&self) -> Option<i64> {
        self.session.as_ref().map(Session::uid)
    }

    /// Log in and store the resulting session, returning the user id.
    ///
    /// Any previous session is discarded first, so a failed re-authentication
    /// leaves the client unauthenticated.
    pub async fn authenticate(
        &mut self,
        database: &str,
        username: &str,
        password: &str,
    ) -> OdooResult<i64> {
        self.session = None;

        let fail = |failure: AuthFailure| OdooError::Authentication {
            database: database.to_string(),
            username: username.to_string(),
            failure,
        };

        let args = vec![json!(database), json!(username), json!(password)];
        let result = match self.rpc(SERVICE_COMMON, "login", args).await {
            Ok(result) => result,
            Err(OdooError::Transport(e)) => {
                return Err(fail(AuthFailure::Unreachable(e.to_string())));
            }
            Err(OdooError::Remote(err)) if err.is_access_denied() => {
                return Err(fail(AuthFailure::Rejected));
            }
            Err(OdooError::Remote(err)) => return Err(fail(AuthFailure::Server(err))),
            Err(OdooError::InvalidResponse(reason)) => {
                warn!(database, username, "Login answered by a non-Odoo endpoint");
                return Err(fail(AuthFailure::UnexpectedResponse(reason)));
            }
            Err(e) => return Err(e),
        };

        let uid = match result {
            Value::Number(n) => n.as_i64().ok_or_else(|| {
                fail(AuthFailure::UnexpectedResponse(format!("non-integer uid {}", n)))
            })?,
            Value::Bool(false) | Value::Null => {
                warn!(database, username, "Odoo rejected login");
                return Err(fail(AuthFailure::Rejected));
            }
            other => {
                return Err(fail(AuthFailure::UnexpectedResponse(format!(
                    "unexpected login result: {}",
                    excerpt(&other.to_string())
                ))));
            }
        };

        info!(database, username, uid, "Authenticated against Odoo");
        self.session = Some(Session {
            database: database.to_string(),
            username: username.to_string(),
            uid,
            password: Zeroizing::new(password.to_string()),
        });

        Ok(uid)
    }

    /// Drop the session. JSON-RPC is stateless, so nothing is sent.
    pub fn logout(&mut self) {
        if let Some(session) = self.session.take() {
            debug!(database = %session.database, uid = session.uid, "Session cleared");
        }
    }

    /// Invoke `method` on `model` through `object.execute_kw`.
    ///
    /// `args` is the positional argument list (`null` for none, a scalar is
    /// wrapped in a one-element list); `kwargs` must be an object or `null`.
    pub async fn call(
        &self,
        model: &str,
        method: &str,
        args: Value,
        kwargs: Value,
    ) -> OdooResult<Value> {
        let session = self.session.as_ref().ok_or(OdooError::NotAuthenticated)?;

        let args = match args {
            Value::Null => Value::Array(Vec::new()),
            Value::Array(items) => Value::Array(items),
            other => Value::Array(vec![other]),
        };
        let kwargs = match kwargs {
            Value::Null => Value::Object(Map::new()),
            Value::Object(map) => Value::Object(map),
            other => {
                return Err(OdooError::InvalidArgument(format!(
                    "kwargs must be a JSON object, got {}",
                    other
                )));
            }
        };

        debug!(model, method, uid = session.uid, "execute_kw");
        self.rpc(
            SERVICE_OBJECT,
            "execute_kw",
            vec![
                json!(session.database),
                json!(session.uid),
                json!(session.password.as_str()),
                json!(model),
                json!(method),
                args,
                kwargs,
            ],
        )
        .await
    }

    /// Server version information. Needs no session.
    pub async fn version(&self) -> OdooResult<ServerVersion> {
        let result = self.rpc(SERVICE_COMMON, "version", Vec::new()).await?;
        decode(result, "common.version")
    }

    /// Databases hosted by the server. Needs no session, but fails with a
    /// remote error when the server disables database listing.
    pub async fn list_databases(&self) -> OdooResult<Vec<String>> {
        let result = self.rpc(SERVICE_DB, "list", Vec::new()).await?;
        decode(result, "db.list")
    }

    async fn rpc(&self, service: &str, method: &str, args: Vec<Value>) -> OdooResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest::service_call(service, method, args, id);
        debug!(service, method, id, "Sending JSON-RPC request");

        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await?
            .error_for_status()?;
        debug!(status = %response.status(), id, "Received JSON-RPC response");

        let body = response.text().await?;
        let envelope: JsonRpcResponse = serde_json::from_str(&body).map_err(|e| {
            OdooError::InvalidResponse(format!(
                "Failed to parse JSON-RPC response: {} (body: {})",
                e,
                excerpt(&body)
            ))
        })?;

        envelope.into_result(&json!(id)).inspect_err(|e| {
            if let OdooError::Remote(err) = e {
                warn!(service, method, id, error = %err, "Odoo returned an error");
            }
        })
    }
}

impl fmt::Debug for OdooClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OdooClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

/// Build a client from `config`, log in with its credentials and return it.
pub async fn connect(config: &ClientConfig) -> OdooResult<OdooClient> {
    let mut client = OdooClient::with_config(config)?;
    client
        .authenticate(&config.database, &config.username, &config.password)
        .await?;
    Ok(client)
}

// Keeps error messages readable when a proxy answers with a full HTML page.
fn excerpt(body: &str) -> String {
    match body.char_indices().nth(BODY_EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}... ({} bytes)", &body[..cut], body.len()),
        None => body.to_string(),
    }
}

pub(crate) fn decode<T: serde::de::DeserializeOwned>(value: Value, what: &str) -> OdooResult<T> {
    serde_json::from_value(value)
        .map_err(|e| OdooError::InvalidResponse(format!("unexpected {} result: {}", what, e)))
}
