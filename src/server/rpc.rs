//! JSON-RPC envelope types

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const INVALID_PARAMS: i64 = -32602;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INTERNAL_ERROR: i64 = -32603;

fn default_version() -> String {
    JSONRPC_VERSION.to_string()
}

/// Incoming request or notification
///
/// A request carries an `id` and expects a response; a notification does not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    #[serde(default = "default_version")]
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
}

impl RpcRequest {
    pub fn new(method: impl Into<String>, params: Option<Value>, id: Option<Value>) -> Self {
        Self {
            jsonrpc: default_version(),
            method: method.into(),
            params,
            id,
        }
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// Decode one envelope from a raw body.
    ///
    /// An envelope that cannot be decoded yields the error response to send
    /// back instead, carrying the request id whenever one can be read.
    pub fn decode(body: &[u8]) -> Result<Self, RpcResponse> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| RpcResponse::error(None, PARSE_ERROR, format!("Parse error: {e}")))?;
        let id = value.get("id").filter(|id| !id.is_null()).cloned();

        if !value.get("method").is_some_and(Value::is_string) {
            return Err(RpcResponse::method_not_found(id, "undefined"));
        }

        serde_json::from_value(value)
            .map_err(|e| RpcResponse::error(id, INVALID_REQUEST, format!("Invalid request: {e}")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

/// Response envelope; exactly one of `result` and `error` is set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: default_version(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Option<Value>, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: default_version(),
            id,
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
            }),
        }
    }

    pub fn method_not_found(id: Option<Value>, method: &str) -> Self {
        Self::error(id, METHOD_NOT_FOUND, format!("Method not found: {method}"))
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_notification_has_no_id() {
        let req: RpcRequest =
            serde_json::from_value(json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
                .unwrap();
        assert!(req.is_notification());

        let req: RpcRequest =
            serde_json::from_value(json!({"method": "tools/list", "id": 0})).unwrap();
        assert!(!req.is_notification());
        assert_eq!(req.jsonrpc, "2.0");
    }

    #[test]
    fn test_decode_without_method_echoes_id() {
        let resp = RpcRequest::decode(br#"{"jsonrpc":"2.0","id":11,"params":{}}"#).unwrap_err();
        assert_eq!(resp.id, Some(json!(11)));
        assert_eq!(resp.error.unwrap().code, METHOD_NOT_FOUND);
    }

    #[test]
    fn test_decode_bad_fields() {
        let resp = RpcRequest::decode(br#"{"jsonrpc":2,"id":"a","method":"tools/list"}"#).unwrap_err();
        assert_eq!(resp.id, Some(json!("a")));
        assert_eq!(resp.error.unwrap().code, INVALID_REQUEST);

        let resp = RpcRequest::decode(b"{not json").unwrap_err();
        assert_eq!(resp.id, None);
        assert_eq!(resp.error.unwrap().code, PARSE_ERROR);

        let req = RpcRequest::decode(br#"{"method":"tools/list","id":null}"#).unwrap();
        assert!(req.is_notification());
    }

    #[test]
    fn test_error_envelope_shape() {
        let resp = RpcResponse::method_not_found(Some(json!("abc")), "foo/bar");
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(
            json,
            json!({
                "jsonrpc": "2.0",
                "id": "abc",
                "error": {"code": -32601, "message": "Method not found: foo/bar"}
            })
        );
    }
}
