//! Tools module - capabilities exposed to the agent
//!
//! Tools are the external actions the model may request, such as looking
//! up lounges or flight schedules for a booking session.

mod lounge;
mod registry;
mod schema;

pub use lounge::{GetFlightDataTool, GetLoungeTool};
pub use registry::{ToolDefinition, ToolRegistry};
pub use schema::{FieldSpec, FieldType, InputSchema};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Error;
use crate::Result;

/// Tool trait - interface for all agent tools
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name used in function calls
    fn name(&self) -> &str;

    /// Description of what the tool does
    fn description(&self) -> &str;

    /// Argument contract, validated before [`Tool::execute`] runs
    fn input_schema(&self) -> &InputSchema;

    /// Execute the tool with already validated arguments
    async fn execute(&self, params: Value) -> Result<String>;

    /// Convert to tool definition for the protocol and the LLM
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema().to_json(),
        }
    }
}

/// Read a string argument that the schema has already checked.
pub(crate) fn str_arg<'a>(params: &'a Value, name: &str) -> Result<&'a str> {
    params
        .get(name)
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::Validation(format!("missing required field '{name}'")))
}

/// Dummy tool for testing
#[cfg(test)]
pub struct DummyTool {
    pub name: String,
    pub result: String,
    pub schema: InputSchema,
}

#[cfg(test)]
impl DummyTool {
    pub fn new(name: &str, result: &str) -> Self {
        Self {
            name: name.to_string(),
            result: result.to_string(),
            schema: InputSchema::default(),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl Tool for DummyTool {
    fn name(&self) -> &str { &self.name }
    fn description(&self) -> &str { "Dummy tool for testing" }
    fn input_schema(&self) -> &InputSchema { &self.schema }

    async fn execute(&self, _params: Value) -> Result<String> {
        Ok(self.result.clone())
    }
}
