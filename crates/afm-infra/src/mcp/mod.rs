//! MCP tool servers as a [`ToolExecutor`].
//!
//! Each server declared under `tools.mcp` is reached over streamable HTTP with
//! `rmcp`. Its tools pass through the server's allow/deny filter and are
//! routed back to it by name.

mod auth;
mod connection;

pub use auth::bearer_token;
pub use connection::McpConnection;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::RwLock;

use afm_core::tools::{ToolExecutor, filter_tools};
use afm_types::agent::{AgentRecord, McpServer};
use afm_types::error::ToolError;
use afm_types::llm::ToolDefinition;

/// Limit for connecting, listing and each tool call.
pub const DEFAULT_MCP_TIMEOUT: Duration = Duration::from_secs(60);

pub struct McpToolset {
    servers: Vec<McpServer>,
    timeout: Duration,
    registry: RwLock<Registry>,
}

#[derive(Default)]
struct Registry {
    connections: Vec<Arc<McpConnection>>,
    /// Tool name -> index into `connections`.
    routes: HashMap<String, usize>,
}

impl McpToolset {
    pub fn new(servers: Vec<McpServer>) -> Self {
        Self {
            servers,
            timeout: DEFAULT_MCP_TIMEOUT,
            registry: RwLock::default(),
        }
    }

    /// Toolset for the servers an agent document declares.
    pub fn from_record(record: &AgentRecord) -> Self {
        let servers = record
            .metadata
            .tools
            .as_ref()
            .and_then(|t| t.mcp.clone())
            .unwrap_or_default();
        Self::new(servers)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn server_names(&self) -> Vec<&str> {
        self.servers.iter().map(|s| s.name.as_str()).collect()
    }

    async fn open(&self, server: &McpServer) -> Result<(McpConnection, Vec<ToolDefinition>), ToolError> {
        let timed_out = || ToolError::Connection {
            server: server.name.clone(),
            message: format!("timed out after {}s", self.timeout.as_secs()),
        };
        let bearer = bearer_token(&server.name, server.transport.authentication.as_ref())?;
        let connection = tokio::time::timeout(
            self.timeout,
            McpConnection::connect_http(&server.name, &server.transport.url, bearer),
        )
        .await
        .map_err(|_| timed_out())??;

        let listed = tokio::time::timeout(self.timeout, connection.list_tools())
            .await
            .map_err(|_| timed_out())
            .and_then(|r| r);
        match listed {
            Ok(tools) => Ok((connection, tools)),
            Err(e) => {
                connection.shutdown().await;
                Err(e)
            }
        }
    }
}

/// Merge per-server tool lists in server order. A name offered by more than
/// one server stays with the first.
fn register(listed: Vec<(usize, String, Vec<ToolDefinition>)>) -> (Vec<ToolDefinition>, HashMap<String, usize>) {
    let mut definitions = Vec::new();
    let mut routes = HashMap::new();
    for (index, server, tools) in listed {
        for tool in tools {
            if routes.contains_key(&tool.name) {
                tracing::warn!(server = %server, tool = %tool.name, "duplicate MCP tool name, keeping the first");
                continue;
            }
            routes.insert(tool.name.clone(), index);
            definitions.push(tool);
        }
    }
    (definitions, routes)
}

impl ToolExecutor for McpToolset {
    async fn connect(&self) -> Result<Vec<ToolDefinition>, ToolError> {
        if self.servers.is_empty() {
            return Ok(Vec::new());
        }
        tracing::info!(servers = ?self.server_names(), "connecting to MCP servers");

        let mut connections = Vec::new();
        let mut listed = Vec::new();
        let mut errors = Vec::new();
        for server in &self.servers {
            match self.open(server).await {
                Ok((connection, tools)) => {
                    let offered = tools.len();
                    let kept = filter_tools(tools, server.tool_filter.as_ref());
                    tracing::info!(
                        server = %server.name,
                        loaded = kept.len(),
                        offered,
                        "MCP tools loaded"
                    );
                    listed.push((connections.len(), server.name.clone(), kept));
                    connections.push(Arc::new(connection));
                }
                Err(e) => {
                    tracing::error!(server = %server.name, error = %e, "MCP server unavailable");
                    errors.push(e.to_string());
                }
            }
        }

        let (definitions, routes) = register(listed);
        if !errors.is_empty() && definitions.is_empty() {
            for connection in &connections {
                connection.shutdown().await;
            }
            return Err(ToolError::Connection {
                server: self.server_names().join(", "),
                message: format!("no MCP server reachable: {}", errors.join("; ")),
            });
        }

        *self.registry.write().await = Registry {
            connections,
            routes,
        };
        Ok(definitions)
    }

    async fn call(&self, name: &str, arguments: Value) -> Result<String, ToolError> {
        let connection = {
            let registry = self.registry.read().await;
            registry
                .routes
                .get(name)
                .and_then(|&index| registry.connections.get(index))
                .cloned()
                .ok_or_else(|| ToolError::NotFound(name.to_string()))?
        };
        tracing::debug!(server = %connection.server(), tool = %name, "calling MCP tool");

        tokio::time::timeout(self.timeout, connection.call_tool(name, arguments))
            .await
            .map_err(|_| ToolError::Call {
                tool: name.to_string(),
                message: format!("timed out after {}s", self.timeout.as_secs()),
            })?
    }

    async fn disconnect(&self) {
        let registry = std::mem::take(&mut *self.registry.write().await);
        for connection in &registry.connections {
            connection.shutdown().await;
        }
        if !registry.connections.is_empty() {
            tracing::info!("disconnected from MCP servers");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use afm_types::agent::{AgentMetadata, Tools, Transport, TransportKind};
    use serde_json::json;

    fn tool(name: &str) -> ToolDefinition {
        ToolDefinition {
            name: name.to_string(),
            description: None,
            parameters: json!({"type": "object"}),
        }
    }

    fn server(name: &str, url: &str) -> McpServer {
        McpServer {
            name: name.to_string(),
            transport: Transport {
                kind: TransportKind::Http,
                url: url.to_string(),
                authentication: None,
            },
            tool_filter: None,
        }
    }

    #[test]
    fn test_register_routes_by_server_and_keeps_first_duplicate() {
        let (definitions, routes) = register(vec![
            (0, "github".to_string(), vec![tool("search"), tool("read")]),
            (1, "jira".to_string(), vec![tool("search"), tool("ticket")]),
        ]);
        let names: Vec<&str> = definitions.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["search", "read", "ticket"]);
        assert_eq!(routes["search"], 0);
        assert_eq!(routes["ticket"], 1);
    }

    #[test]
    fn test_from_record() {
        let record = AgentRecord {
            metadata: AgentMetadata {
                tools: Some(Tools {
                    mcp: Some(vec![server("github", "https://mcp.example.com")]),
                }),
                ..AgentMetadata::default()
            },
            ..AgentRecord::default()
        };
        assert_eq!(McpToolset::from_record(&record).server_names(), ["github"]);
        assert!(McpToolset::from_record(&AgentRecord::default()).server_names().is_empty());
    }

    #[tokio::test]
    async fn test_no_servers_connects_without_tools() {
        let toolset = McpToolset::new(Vec::new());
        assert!(toolset.connect().await.unwrap().is_empty());
        let err = toolset.call("search", json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
        toolset.disconnect().await;
    }

    #[tokio::test]
    async fn test_unreachable_servers_fail_connect() {
        let toolset = McpToolset::new(vec![server("down", "http://127.0.0.1:1/mcp")])
            .with_timeout(Duration::from_secs(5));
        let err = toolset.connect().await.unwrap_err();
        assert!(matches!(err, ToolError::Connection { .. }));
        assert!(err.to_string().contains("down"));
    }

    #[tokio::test]
    async fn test_bad_credentials_fail_before_connecting() {
        let mut declared = server("github", "http://127.0.0.1:1/mcp");
        declared.transport.authentication = Some(afm_types::agent::ClientAuthentication {
            kind: "bearer".to_string(),
            token: None,
            username: None,
            password: None,
            api_key: None,
            extra: Default::default(),
        });
        let err = McpToolset::new(vec![declared]).connect().await.unwrap_err();
        assert!(err.to_string().contains("requires 'token'"));
    }
}
