//! One MCP server session over streamable HTTP.

use std::borrow::Cow;

use rmcp::ServiceExt;
use rmcp::model::{CallToolRequestParams, Content, Tool};
use rmcp::service::{RoleClient, RunningService};
use rmcp::transport::StreamableHttpClientTransport;
use rmcp::transport::streamable_http_client::StreamableHttpClientTransportConfig;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tokio::sync::RwLock;

use afm_types::error::ToolError;
use afm_types::llm::ToolDefinition;

type McpService = RunningService<RoleClient, ()>;

pub struct McpConnection {
    server: String,
    service: RwLock<Option<McpService>>,
}

impl McpConnection {
    /// Run the MCP initialize handshake against `url`.
    pub async fn connect_http(
        server: &str,
        url: &str,
        bearer: Option<SecretString>,
    ) -> Result<Self, ToolError> {
        let mut config = StreamableHttpClientTransportConfig::with_uri(url.to_string());
        if let Some(token) = bearer {
            config = config.auth_header(token.expose_secret().to_string());
        }
        let service = ()
            .serve(StreamableHttpClientTransport::from_config(config))
            .await
            .map_err(|e| ToolError::Connection {
                server: server.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            server: server.to_string(),
            service: RwLock::new(Some(service)),
        })
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub async fn list_tools(&self) -> Result<Vec<ToolDefinition>, ToolError> {
        let guard = self.service.read().await;
        let service = guard.as_ref().ok_or_else(|| self.inactive())?;
        let tools = service
            .list_all_tools()
            .await
            .map_err(|e| ToolError::Connection {
                server: self.server.clone(),
                message: format!("failed to list tools: {e}"),
            })?;
        Ok(tools.into_iter().map(definition).collect())
    }

    /// Call `name` and return the text content of its result.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<String, ToolError> {
        let call_error = |message: String| ToolError::Call {
            tool: name.to_string(),
            message,
        };
        let arguments = match arguments {
            Value::Object(object) => Some(object),
            Value::Null => None,
            other => {
                return Err(call_error(format!(
                    "arguments must be a JSON object, got {other}"
                )));
            }
        };
        let request = CallToolRequestParams {
            meta: None,
            name: name.to_string().into(),
            arguments,
            task: None,
        };

        let guard = self.service.read().await;
        let service = guard.as_ref().ok_or_else(|| self.inactive())?;
        let result = service
            .call_tool(request)
            .await
            .map_err(|e| call_error(e.to_string()))?;

        let text = result_text(&result.content);
        if result.is_error == Some(true) {
            return Err(call_error(text));
        }
        Ok(text)
    }

    pub async fn shutdown(&self) {
        let service = self.service.write().await.take();
        if let Some(service) = service
            && let Err(e) = service.cancel().await
        {
            tracing::warn!(server = %self.server, error = %e, "MCP session did not close cleanly");
        }
    }

    fn inactive(&self) -> ToolError {
        ToolError::Connection {
            server: self.server.clone(),
            message: "connection is closed".to_string(),
        }
    }

    #[cfg(test)]
    pub(crate) fn closed(server: &str) -> Self {
        Self {
            server: server.to_string(),
            service: RwLock::new(None),
        }
    }
}

fn definition(tool: Tool) -> ToolDefinition {
    ToolDefinition {
        name: tool.name.into_owned(),
        description: tool.description.map(Cow::into_owned),
        parameters: Value::Object(tool.input_schema.as_ref().clone()),
    }
}

/// Text items of a tool result, one per line. Other content kinds are dropped.
fn result_text(contents: &[Content]) -> String {
    contents
        .iter()
        .filter_map(|c| c.raw.as_text().map(|t| t.text.as_str()))
        .collect::<Vec<_>>()
        .join("\n")
}
