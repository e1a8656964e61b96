//! HTTP transport for the tool server

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::Result;

use super::rpc::{self, RpcRequest, RpcResponse};
use super::{HealthStatus, ToolServer};

/// Build the router: `POST /` for envelopes, `GET /health` for liveness.
pub fn router(server: Arc<ToolServer>) -> Router {
    Router::new()
        .route("/", post(handle_rpc))
        .route("/health", get(health))
        .with_state(server)
}

async fn handle_rpc(State(server): State<Arc<ToolServer>>, body: Bytes) -> Response {
    let request = match RpcRequest::decode(&body) {
        Ok(request) => request,
        Err(response) => {
            warn!(id = ?response.id, error = ?response.error, "Rejected envelope");
            return (status_for(&response), Json(response)).into_response();
        }
    };

    match server.handle(request).await {
        Some(response) => (status_for(&response), Json(response)).into_response(),
        None => StatusCode::OK.into_response(),
    }
}

async fn health() -> Json<HealthStatus> {
    Json(HealthStatus::healthy())
}

fn status_for(response: &RpcResponse) -> StatusCode {
    match response.error.as_ref().map(|e| e.code) {
        None => StatusCode::OK,
        Some(rpc::INTERNAL_ERROR) => StatusCode::INTERNAL_SERVER_ERROR,
        Some(_) => StatusCode::BAD_REQUEST,
    }
}

/// Handle returned by [`serve`] - holds the bound address and shutdown trigger.
pub struct ServeHandle {
    pub addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    join: Option<tokio::task::JoinHandle<std::io::Result<()>>>,
}

impl ServeHandle {
    /// Trigger graceful shutdown and wait for the server to stop.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        self.wait().await
    }

    /// Wait until the server task ends.
    pub async fn wait(mut self) -> Result<()> {
        if let Some(join) = self.join.take() {
            join.await
                .map_err(|e| crate::Error::Other(format!("server task failed: {e}")))??;
        }
        Ok(())
    }
}

/// Bind `bind` and serve the tool server in a spawned task.
pub async fn serve(server: Arc<ToolServer>, bind: &str) -> Result<ServeHandle> {
    let listener = TcpListener::bind(bind).await?;
    let addr = listener.local_addr()?;
    info!("MCP server running at http://{addr}");
    info!("Health check: http://{addr}/health");

    let app = router(server);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let join = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("received shutdown signal");
            })
            .await
    });

    Ok(ServeHandle {
        addr,
        shutdown_tx: Some(shutdown_tx),
        join: Some(join),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolRegistry;
    use crate::upstream::{FixtureUpstream, UpstreamFixtures};
    use serde_json::{json, Value};

    async fn start() -> ServeHandle {
        let mut fixtures = UpstreamFixtures::default();
        fixtures
            .lounges
            .insert("s1".to_string(), vec!["LoungeA".to_string(), "LoungeB".to_string()]);
        let registry = ToolRegistry::new_with_defaults(Arc::new(FixtureUpstream::new(fixtures))).unwrap();
        serve(Arc::new(ToolServer::new(Arc::new(registry))), "127.0.0.1:0")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let handle = start().await;
        let body: Value = reqwest::get(format!("http://{}/health", handle.addr))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "healthy");
        assert!(body["timestamp"].is_string());
        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_status_codes() {
        let handle = start().await;
        let client = reqwest::Client::new();
        let url = format!("http://{}/", handle.addr);

        let ok = client
            .post(&url)
            .json(&json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}))
            .send()
            .await
            .unwrap();
        assert_eq!(ok.status().as_u16(), 200);

        let missing = client
            .post(&url)
            .json(&json!({"jsonrpc": "2.0", "id": 2, "method": "tools/call", "params": {"name": "nope"}}))
            .send()
            .await
            .unwrap();
        assert_eq!(missing.status().as_u16(), 400);
        let body: Value = missing.json().await.unwrap();
        assert_eq!(body["id"], 2);
        assert_eq!(body["error"]["code"], -32601);

        let failed = client
            .post(&url)
            .json(&json!({"jsonrpc": "2.0", "id": 3, "method": "tools/call",
                          "params": {"name": "get_lounge", "arguments": {"sessionId": "s2"}}}))
            .send()
            .await
            .unwrap();
        assert_eq!(failed.status().as_u16(), 500);

        let notification = client
            .post(&url)
            .json(&json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
            .send()
            .await
            .unwrap();
        assert_eq!(notification.status().as_u16(), 200);
        assert!(notification.text().await.unwrap().is_empty());

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_malformed_envelope_gets_rpc_error() {
        let handle = start().await;
        let client = reqwest::Client::new();
        let url = format!("http://{}/", handle.addr);

        let no_method = client
            .post(&url)
            .json(&json!({"jsonrpc": "2.0", "id": 11, "params": {}}))
            .send()
            .await
            .unwrap();
        assert_eq!(no_method.status().as_u16(), 400);
        let body: Value = no_method.json().await.unwrap();
        assert_eq!(body["jsonrpc"], "2.0");
        assert_eq!(body["id"], 11);
        assert_eq!(body["error"]["code"], -32601);
        assert_eq!(body["error"]["message"], "Method not found: undefined");

        let garbage = client
            .post(&url)
            .header("content-type", "application/json")
            .body("{\"id\": 12,")
            .send()
            .await
            .unwrap();
        assert_eq!(garbage.status().as_u16(), 400);
        let body: Value = garbage.json().await.unwrap();
        assert_eq!(body["error"]["code"], -32700);
        assert!(body["id"].is_null());

        handle.shutdown().await.unwrap();
    }
}
