//! ToolExecutor trait definition.
//!
//! Implementations live in afm-infra (`McpToolset`). The runner only sees
//! tool definitions and text results.

use afm_types::error::ToolError;
use afm_types::llm::ToolDefinition;
use serde_json::Value;

pub trait ToolExecutor: Send + Sync {
    /// Open connections and list the tools the model may call.
    fn connect(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<ToolDefinition>, ToolError>> + Send;

    /// Run one tool call and return its result as text.
    fn call(
        &self,
        name: &str,
        arguments: Value,
    ) -> impl std::future::Future<Output = Result<String, ToolError>> + Send;

    /// Close connections. Safe to call when never connected.
    fn disconnect(&self) -> impl std::future::Future<Output = ()> + Send;
}

/// Executor for agents without MCP servers.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTools;

impl ToolExecutor for NoTools {
    async fn connect(&self) -> Result<Vec<ToolDefinition>, ToolError> {
        Ok(Vec::new())
    }

    async fn call(&self, name: &str, _arguments: Value) -> Result<String, ToolError> {
        Err(ToolError::NotFound(name.to_string()))
    }

    async fn disconnect(&self) {}
}
