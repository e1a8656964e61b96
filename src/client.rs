//! Tool clients - how the agent reaches the tool server.
//!
//! The agent loop only talks to [`ToolClient`]. [`LocalToolClient`] routes
//! calls through an in-process [`ToolServer`]; [`HttpToolClient`] speaks the
//! same envelopes to a server over HTTP.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::Error;
use crate::server::{RpcRequest, RpcResponse, ToolServer, PROTOCOL_VERSION};
use crate::tools::ToolDefinition;
use crate::Result;

/// Model-facing tool-call interface
#[async_trait]
pub trait ToolClient: Send + Sync {
    /// Tools the server advertises
    async fn list_tools(&self) -> Result<Vec<ToolDefinition>>;

    /// Run one tool and return its text output
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<String>;
}

fn into_result(response: RpcResponse) -> Result<Value> {
    if let Some(error) = response.error {
        return Err(Error::Rpc {
            code: error.code,
            message: error.message,
        });
    }
    Ok(response.result.unwrap_or(Value::Null))
}

fn parse_tools(result: Value) -> Result<Vec<ToolDefinition>> {
    let tools = result.get("tools").cloned().unwrap_or_else(|| json!([]));
    Ok(serde_json::from_value(tools)?)
}

/// Join the text items of a `tools/call` result.
fn parse_content(result: &Value) -> String {
    result
        .get("content")
        .and_then(|c| c.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("text").and_then(|t| t.as_str()))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default()
}

fn call_params(name: &str, arguments: Value) -> Value {
    json!({ "name": name, "arguments": arguments })
}

/// Calls an in-process [`ToolServer`] through its `tools/call` path
#[derive(Clone)]
pub struct LocalToolClient {
    server: Arc<ToolServer>,
    next_id: Arc<AtomicU64>,
}

impl LocalToolClient {
    pub fn new(server: Arc<ToolServer>) -> Self {
        Self {
            server,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let response = self
            .server
            .handle(RpcRequest::new(method, params, Some(json!(id))))
            .await
            .ok_or_else(|| Error::Other(format!("no response to {method}")))?;
        into_result(response)
    }
}

#[async_trait]
impl ToolClient for LocalToolClient {
    async fn list_tools(&self) -> Result<Vec<ToolDefinition>> {
        parse_tools(self.request("tools/list", None).await?)
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<String> {
        let result = self.request("tools/call", Some(call_params(name, arguments))).await?;
        Ok(parse_content(&result))
    }
}

/// JSON-RPC over HTTP to a remote tool server
#[derive(Clone)]
pub struct HttpToolClient {
    url: String,
    client: Client,
    next_id: Arc<AtomicU64>,
}

impl HttpToolClient {
    /// Connect and complete the `initialize` handshake.
    pub async fn connect(url: &str) -> Result<Self> {
        let this = Self {
            url: url.to_string(),
            client: Client::new(),
            next_id: Arc::new(AtomicU64::new(1)),
        };

        info!(url, "Connecting to MCP server");
        let init = this
            .request(
                "initialize",
                Some(json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": {},
                    "clientInfo": {
                        "name": env!("CARGO_PKG_NAME"),
                        "version": env!("CARGO_PKG_VERSION")
                    }
                })),
            )
            .await?;
        debug!(server = %init["serverInfo"], "Initialized");

        this.notify("notifications/initialized").await?;
        Ok(this)
    }

    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest::new(method, params, Some(json!(id)));

        let response: RpcResponse = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await?
            .json()
            .await?;

        if response.id != request.id {
            return Err(Error::Other(format!(
                "response id {:?} does not match request id {}",
                response.id, id
            )));
        }
        into_result(response)
    }

    async fn notify(&self, method: &str) -> Result<()> {
        self.client
            .post(&self.url)
            .json(&RpcRequest::new(method, None, None))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[async_trait]
impl ToolClient for HttpToolClient {
    async fn list_tools(&self) -> Result<Vec<ToolDefinition>> {
        parse_tools(self.request("tools/list", None).await?)
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<String> {
        let result = self.request("tools/call", Some(call_params(name, arguments))).await?;
        Ok(parse_content(&result))
    }
}
