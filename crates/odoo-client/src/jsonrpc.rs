//! JSON-RPC 2.0 Envelopes
//!
//! Request and response shapes for Odoo's `/jsonrpc` endpoint. Every request
//! uses the JSON-RPC method `call`; the Odoo service and method travel in
//! `params`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

use crate::error::{OdooError, OdooResult, RemoteError};

/// Odoo service that owns login and version.
pub const SERVICE_COMMON: &str = "common";
/// Odoo service that executes model methods.
pub const SERVICE_OBJECT: &str = "object";
/// Odoo service that manages databases.
pub const SERVICE_DB: &str = "db";

/// JSON-RPC 2.0 Request
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,

    pub method: String,

    pub params: Value,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
}

impl JsonRpcRequest {
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: method.into(),
            params,
            id: None,
        }
    }

    /// Build an Odoo service call: `{"service": .., "method": .., "args": [..]}`
    pub fn service_call(service: &str, method: &str, args: Vec<Value>, id: u64) -> Self {
        let mut req = Self::new(
            "call",
            json!({
                "service": service,
                "method": method,
                "args": args,
            }),
        );
        req.id = Some(json!(id));
        req
    }
}

/// JSON-RPC 2.0 Response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub jsonrpc: String,

    #[serde(default)]
    pub id: Value,

    /// `Some(Value::Null)` when the server returned `"result": null`
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub result: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Unwrap the envelope into its result, checking it answers `request_id`.
    ///
    /// A null response id is accepted; some proxies strip it.
    pub fn into_result(self, request_id: &Value) -> OdooResult<Value> {
        if !self.id.is_null() && &self.id != request_id {
            return Err(OdooError::InvalidResponse(format!(
                "response id {} does not match request id {}",
                self.id, request_id
            )));
        }

        match (self.result, self.error) {
            (_, Some(error)) => Err(OdooError::Remote(RemoteError::from(error))),
            (Some(result), None) => Ok(result),
            (None, None) => Err(OdooError::InvalidResponse(
                "response carries neither result nor error".to_string(),
            )),
        }
    }
}

// Distinguishes an explicit null from an absent field.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// JSON-RPC 2.0 Error Object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,

    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_call_shape() {
        let req = JsonRpcRequest::service_call(
            SERVICE_COMMON,
            "login",
            vec![json!("prod"), json!("admin"), json!("secret")],
            7,
        );
        let encoded = serde_json::to_value(&req).unwrap();
        assert_eq!(
            encoded,
            json!({
                "jsonrpc": "2.0",
                "method": "call",
                "id": 7,
                "params": {
                    "service": "common",
                    "method": "login",
                    "args": ["prod", "admin", "secret"]
                }
            })
        );
    }

    #[test]
    fn test_into_result_success() {
        let resp: JsonRpcResponse =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":3,"result":[1,2]}"#).unwrap();
        assert_eq!(resp.into_result(&json!(3)).unwrap(), json!([1, 2]));
    }

    #[test]
    fn test_into_result_false_is_a_result() {
        let resp: JsonRpcResponse =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":1,"result":false}"#).unwrap();
        assert_eq!(resp.into_result(&json!(1)).unwrap(), json!(false));
    }

    #[test]
    fn test_into_result_null_is_a_result() {
        let resp: JsonRpcResponse =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":2,"result":null}"#).unwrap();
        assert_eq!(resp.into_result(&json!(2)).unwrap(), Value::Null);
    }

    #[test]
    fn test_into_result_error_payload() {
        let resp: JsonRpcResponse = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":200,"message":"Odoo Server Error",
                "data":{"name":"odoo.exceptions.UserError","message":"Nope",
                "arguments":["Nope"]}}}"#,
        )
        .unwrap();
        match resp.into_result(&json!(1)) {
            Err(OdooError::Remote(err)) => {
                assert_eq!(err.code, 200);
                assert_eq!(err.display_message(), "Nope");
                assert_eq!(err.name.as_deref(), Some("odoo.exceptions.UserError"));
            }
            other => panic!("expected remote error, got {:?}", other),
        }
    }

    #[test]
    fn test_into_result_rejects_mismatched_id() {
        let resp: JsonRpcResponse =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":9,"result":1}"#).unwrap();
        assert!(matches!(
            resp.into_result(&json!(1)),
            Err(OdooError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_into_result_accepts_null_id() {
        let resp: JsonRpcResponse =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":null,"result":"ok"}"#).unwrap();
        assert_eq!(resp.into_result(&json!(4)).unwrap(), json!("ok"));
    }

    #[test]
    fn test_into_result_empty_envelope() {
        let resp: JsonRpcResponse = serde_json::from_str(r#"{"jsonrpc":"2.0","id":1}"#).unwrap();
        assert!(matches!(
            resp.into_result(&json!(1)),
            Err(OdooError::InvalidResponse(_))
        ));
    }
}
