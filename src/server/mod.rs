//! Tool server - exposes the tool registry over JSON-RPC.
//!
//! [`ToolServer::handle`] answers one envelope at a time and keeps no state
//! between requests beyond the immutable registry:
//!
//! - `initialize` — protocol version, capabilities and server identity
//! - `notifications/initialized` — readiness signal, acknowledged silently
//! - `tools/list` — the full tool catalog
//! - `tools/call` — validate arguments, run one tool, wrap its text
//!
//! [`http`] mounts the same handler on an axum router.

pub mod http;
pub mod rpc;

use std::sync::Arc;
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::Error;
use crate::tools::ToolRegistry;
use crate::upstream::FixtureUpstream;

pub use rpc::{RpcError, RpcRequest, RpcResponse};

pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Identity reported by `initialize`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: "lounge_server".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Liveness report for `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: String,
}

impl HealthStatus {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// JSON-RPC handler over a [`ToolRegistry`]
pub struct ToolServer {
    registry: Arc<ToolRegistry>,
    info: ServerInfo,
    call_timeout: Option<Duration>,
}

impl ToolServer {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            info: ServerInfo::default(),
            call_timeout: None,
        }
    }

    /// Bound each tool execution; an expired call is reported as an internal error.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    /// Server over the default lounge tools, backed by the configured fixtures.
    pub fn from_config(config: &Config) -> crate::Result<Self> {
        let upstream = Arc::new(FixtureUpstream::new(config.upstream.clone()));
        let registry = ToolRegistry::new_with_defaults(upstream)?;
        let server = Self::new(Arc::new(registry));
        Ok(match config.tool_timeout() {
            Some(limit) => server.with_call_timeout(limit),
            None => server,
        })
    }

    /// Handle one envelope.
    ///
    /// Returns `None` when the envelope is a notification that gets no reply.
    pub async fn handle(&self, request: RpcRequest) -> Option<RpcResponse> {
        debug!(method = %request.method, id = ?request.id, "MCP request");
        let id = request.id.clone();

        match request.method.as_str() {
            "initialize" => Some(RpcResponse::success(id, self.initialize_result())),
            "notifications/initialized" => id.map(|id| RpcResponse::success(Some(id), json!({}))),
            "tools/list" => Some(RpcResponse::success(
                id,
                json!({ "tools": self.registry.list_tools() }),
            )),
            "tools/call" => Some(self.call_tool(id, request.params).await),
            other if request.is_notification() => {
                info!(method = other, "Received notification");
                None
            }
            other => {
                warn!(method = other, "Unknown method");
                Some(RpcResponse::method_not_found(id, other))
            }
        }
    }

    fn initialize_result(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": {} },
            "serverInfo": self.info,
        })
    }

    async fn call_tool(&self, id: Option<Value>, params: Option<Value>) -> RpcResponse {
        let Some(Value::Object(mut params)) = params else {
            return RpcResponse::error(id, rpc::INVALID_PARAMS, "params must be an object with a tool name");
        };
        let Some(name) = params.get("name").and_then(|v| v.as_str()).map(str::to_string) else {
            return RpcResponse::error(id, rpc::INVALID_PARAMS, "params.name must be a string");
        };
        let arguments = params
            .remove("arguments")
            .unwrap_or_else(|| Value::Object(Default::default()));

        let outcome = match self.call_timeout {
            Some(limit) => tokio::time::timeout(limit, self.registry.execute(&name, arguments))
                .await
                .unwrap_or(Err(Error::Timeout(limit))),
            None => self.registry.execute(&name, arguments).await,
        };

        match outcome {
            Ok(text) => {
                debug!(tool = %name, chars = text.len(), "Tool call succeeded");
                RpcResponse::success(id, json!({ "content": [{ "type": "text", "text": text }] }))
            }
            Err(Error::UnknownTool(_)) => {
                warn!(tool = %name, "Unknown tool");
                RpcResponse::error(id, rpc::METHOD_NOT_FOUND, format!("Unknown tool: {name}"))
            }
            Err(Error::Validation(reason)) => {
                warn!(tool = %name, %reason, "Rejected tool arguments");
                RpcResponse::error(
                    id,
                    rpc::INVALID_PARAMS,
                    format!("Invalid arguments for {name}: {reason}"),
                )
            }
            Err(e) => {
                error!(tool = %name, error = %e, "Error in tool");
                let message = match e {
                    Error::Upstream(message) => message,
                    other => other.to_string(),
                };
                RpcResponse::error(
                    id,
                    rpc::INTERNAL_ERROR,
                    format!("Internal error in {name}: {message}"),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::{ScheduleQuery, Upstream};
    use crate::Result;
    use async_trait::async_trait;
    use std::sync::Mutex;

    const SESSION: &str = "00009223581026309436128527";

    /// Upstream that records every schedule lookup it receives
    #[derive(Default)]
    struct RecordingUpstream {
        schedule_calls: Mutex<Vec<ScheduleQuery>>,
        hang: bool,
    }

    #[async_trait]
    impl Upstream for RecordingUpstream {
        async fn get_lounge(&self, session_id: &str) -> Result<Vec<String>> {
            if self.hang {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            if session_id == "unknown" {
                return Err(Error::Upstream("session lookup failed".to_string()));
            }
            Ok(vec!["LoungeA".to_string(), "LoungeB".to_string()])
        }

        async fn get_schedule(&self, query: &ScheduleQuery) -> Result<String> {
            self.schedule_calls.lock().unwrap().push(query.clone());
            Ok("on time".to_string())
        }
    }

    fn server_with(upstream: Arc<RecordingUpstream>) -> ToolServer {
        let registry = ToolRegistry::new_with_defaults(upstream).unwrap();
        ToolServer::new(Arc::new(registry))
    }

    fn call(id: Value, name: &str, arguments: Value) -> RpcRequest {
        RpcRequest::new(
            "tools/call",
            Some(json!({"name": name, "arguments": arguments})),
            Some(id),
        )
    }

    fn flight_args() -> Value {
        json!({
            "sessionId": SESSION,
            "direction": "D",
            "travelDate": "20241225",
            "airportId": "NMIA",
            "flightId": "AC920"
        })
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let server = server_with(Arc::default());
        let first = server
            .handle(RpcRequest::new("initialize", None, Some(json!(1))))
            .await
            .unwrap();
        let second = server
            .handle(RpcRequest::new("initialize", None, Some(json!(2))))
            .await
            .unwrap();

        let (a, b) = (first.result.unwrap(), second.result.unwrap());
        assert_eq!(a["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(a["protocolVersion"], b["protocolVersion"]);
        assert_eq!(a["capabilities"], json!({"tools": {}}));
        assert_eq!(a["capabilities"], b["capabilities"]);
        assert_eq!(second.id, Some(json!(2)));
    }

    #[tokio::test]
    async fn test_initialized_notification() {
        let server = server_with(Arc::default());
        let silent = server
            .handle(RpcRequest::new("notifications/initialized", None, None))
            .await;
        assert!(silent.is_none());

        let acked = server
            .handle(RpcRequest::new("notifications/initialized", None, Some(json!(7))))
            .await
            .unwrap();
        assert_eq!(acked.result, Some(json!({})));
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let server = server_with(Arc::default());
        let resp = server
            .handle(RpcRequest::new("resources/list", None, Some(json!("r1"))))
            .await
            .unwrap();
        assert_eq!(resp.error.unwrap().code, rpc::METHOD_NOT_FOUND);
        assert_eq!(resp.id, Some(json!("r1")));

        let notification = server
            .handle(RpcRequest::new("notifications/cancelled", None, None))
            .await;
        assert!(notification.is_none());
    }

    #[tokio::test]
    async fn test_unknown_tool_echoes_id() {
        let server = server_with(Arc::default());
        for id in [json!(42), json!("req-9")] {
            let resp = server
                .handle(call(id.clone(), "book_lounge", json!({})))
                .await
                .unwrap();
            let error = resp.error.unwrap();
            assert_eq!(error.code, -32601);
            assert_eq!(error.message, "Unknown tool: book_lounge");
            assert_eq!(resp.id, Some(id));
        }
    }

    #[tokio::test]
    async fn test_listed_tools_are_callable() {
        let server = server_with(Arc::default());
        let list = server
            .handle(RpcRequest::new("tools/list", None, Some(json!(1))))
            .await
            .unwrap();

        let tools = list.result.unwrap()["tools"].as_array().unwrap().clone();
        assert_eq!(tools.len(), 2);
        for tool in tools {
            let name = tool["name"].as_str().unwrap();
            let resp = server.handle(call(json!(2), name, json!({}))).await.unwrap();
            if let Some(error) = resp.error {
                assert_ne!(error.code, rpc::METHOD_NOT_FOUND);
            }
        }
    }

    #[tokio::test]
    async fn test_get_lounge_scenario() {
        let server = server_with(Arc::default());
        let resp = server
            .handle(call(json!(5), "get_lounge", json!({"sessionId": SESSION})))
            .await
            .unwrap();

        assert_eq!(resp.id, Some(json!(5)));
        let result = resp.result.unwrap();
        assert_eq!(result["content"][0]["type"], "text");
        assert!(result["content"][0]["text"]
            .as_str()
            .unwrap()
            .contains("Please Choose the lounge from LoungeA,LoungeB"));
    }

    #[tokio::test]
    async fn test_flight_handler_receives_exact_fields() {
        let upstream = Arc::new(RecordingUpstream::default());
        let server = server_with(upstream.clone());
        let resp = server
            .handle(call(json!(3), "get_flight_data", flight_args()))
            .await
            .unwrap();
        assert!(!resp.is_error());

        let calls = upstream.schedule_calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0],
            ScheduleQuery {
                session_id: SESSION.to_string(),
                direction: "D".to_string(),
                travel_date: "20241225".to_string(),
                airport_id: "NMIA".to_string(),
                flight_id: "AC920".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_bad_travel_date_never_reaches_handler() {
        let upstream = Arc::new(RecordingUpstream::default());
        let server = server_with(upstream.clone());

        for date in ["2024-12-25", "2024122", "202412251", "tomorrow"] {
            let mut args = flight_args();
            args["travelDate"] = json!(date);
            let resp = server
                .handle(call(json!(4), "get_flight_data", args))
                .await
                .unwrap();
            assert_eq!(resp.error.unwrap().code, rpc::INVALID_PARAMS);
        }

        assert!(upstream.schedule_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upstream_failure_is_internal_error() {
        let server = server_with(Arc::default());
        let resp = server
            .handle(call(json!(6), "get_lounge", json!({"sessionId": "unknown"})))
            .await
            .unwrap();
        let error = resp.error.unwrap();
        assert_eq!(error.code, rpc::INTERNAL_ERROR);
        assert_eq!(error.message, "Internal error in get_lounge: session lookup failed");

        // The server keeps answering afterwards
        let next = server
            .handle(call(json!(7), "get_lounge", json!({"sessionId": SESSION})))
            .await
            .unwrap();
        assert!(!next.is_error());
    }

    #[tokio::test]
    async fn test_call_timeout() {
        let upstream = Arc::new(RecordingUpstream {
            hang: true,
            ..Default::default()
        });
        let server = server_with(upstream).with_call_timeout(Duration::from_millis(20));
        let resp = server
            .handle(call(json!(8), "get_lounge", json!({"sessionId": SESSION})))
            .await
            .unwrap();
        let error = resp.error.unwrap();
        assert_eq!(error.code, rpc::INTERNAL_ERROR);
        assert_eq!(error.message, "Internal error in get_lounge: Timed out after 20ms");
    }

    #[tokio::test]
    async fn test_call_without_params() {
        let server = server_with(Arc::default());
        let resp = server
            .handle(RpcRequest::new("tools/call", None, Some(json!(9))))
            .await
            .unwrap();
        assert_eq!(resp.error.unwrap().code, rpc::INVALID_PARAMS);
    }

    #[test]
    fn test_health_status() {
        let health = HealthStatus::healthy();
        assert_eq!(health.status, "healthy");
        assert!(chrono::DateTime::parse_from_rfc3339(&health.timestamp).is_ok());
    }
}
