//! Context for agent runs.
//!
//! Holds everything a step needs besides the conversation itself: the tool
//! client, the tool definitions shown to the model, and the tool timeout.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::client::ToolClient;
use crate::error::Error;
use crate::tools::ToolDefinition;
use crate::Result;

use super::message::{ToolCallRequest, ToolCallResult};

/// Context holds the tool-side dependencies of an agent run.
pub struct Context {
    tools: Arc<dyn ToolClient>,
    definitions: Vec<ToolDefinition>,
    tool_timeout: Option<Duration>,
}

impl Context {
    /// Create a context with already known tool definitions.
    pub fn new(tools: Arc<dyn ToolClient>, definitions: Vec<ToolDefinition>) -> Self {
        Self {
            tools,
            definitions,
            tool_timeout: None,
        }
    }

    /// Create a context from the tools the client advertises.
    pub async fn connect(tools: Arc<dyn ToolClient>) -> Result<Self> {
        let definitions = tools.list_tools().await?;
        info!(
            tools = ?definitions.iter().map(|d| d.name.as_str()).collect::<Vec<_>>(),
            "Available tools"
        );
        Ok(Self::new(tools, definitions))
    }

    /// Bound each tool call made through this context.
    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = Some(timeout);
        self
    }

    /// Tool definitions shown to the model.
    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    /// Run one tool call; failures come back as error text for the model.
    pub async fn invoke(&self, call: &ToolCallRequest) -> ToolCallResult {
        debug!("Executing tool: {} with args: {}", call.name, call.arguments);

        let pending = self.tools.call_tool(&call.name, call.arguments.clone());
        let outcome = match self.tool_timeout {
            Some(limit) => tokio::time::timeout(limit, pending)
                .await
                .unwrap_or(Err(Error::Timeout(limit))),
            None => pending.await,
        };

        match outcome {
            Ok(result) => {
                debug!("Tool {} succeeded: {} chars", call.name, result.len());
                ToolCallResult::ok(&call.id, result)
            }
            Err(e) => {
                let error_msg = match e {
                    Error::Rpc { message, .. } => format!("Error: {message}"),
                    other => format!("Error: {other}"),
                };
                warn!("Tool {} failed: {}", call.name, error_msg);
                ToolCallResult::error(&call.id, error_msg)
            }
        }
    }
}
