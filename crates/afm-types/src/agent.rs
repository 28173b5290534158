//! The parsed agent record and its frontmatter metadata.
//!
//! `AgentRecord` is what the document parser produces: YAML frontmatter
//! deserialized into [`AgentMetadata`], plus the `# Role` and
//! `# Instructions` markdown sections.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::interface::Interface;

/// A fully parsed AFM document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentRecord {
    pub metadata: AgentMetadata,
    pub role: String,
    pub instructions: String,
}

/// YAML frontmatter of an AFM document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<Provider>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<Model>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interfaces: Option<Vec<Interface>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Tools>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<u32>,
}

/// The organization publishing the agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Provider {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// LLM model selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Model {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<ClientAuthentication>,
}

/// Credentials used when calling out to a model provider, hub or MCP server.
///
/// Unknown keys are kept in `extra` so provider-specific shapes survive parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientAuthentication {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ClientAuthentication {
    /// Check that the fields required by `type` are present.
    pub fn validate(&self) -> Result<(), String> {
        match self.kind.to_lowercase().as_str() {
            "bearer" if self.token.is_none() => Err("type 'bearer' requires 'token' field".into()),
            "basic" if self.username.is_none() || self.password.is_none() => {
                Err("type 'basic' requires 'username' and 'password' fields".into())
            }
            "api-key" if self.api_key.is_none() => {
                Err("type 'api-key' requires 'api_key' field".into())
            }
            _ => Ok(()),
        }
    }

    /// Every string value carried by this block, including extras.
    pub fn string_values(&self) -> Vec<&str> {
        let mut values = vec![self.kind.as_str()];
        values.extend(
            [&self.token, &self.username, &self.password, &self.api_key]
                .into_iter()
                .filter_map(|v| v.as_deref()),
        );
        values.extend(self.extra.values().filter_map(|v| v.as_str()));
        values
    }
}

/// Tool configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Tools {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mcp: Option<Vec<McpServer>>,
}

/// A remote MCP server the agent may call tools on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct McpServer {
    pub name: String,
    pub transport: Transport,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_filter: Option<ToolFilter>,
}

/// Transport kinds supported for MCP servers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    #[default]
    Http,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Transport {
    #[serde(rename = "type", default)]
    pub kind: TransportKind,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<ClientAuthentication>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deny: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth(kind: &str) -> ClientAuthentication {
        ClientAuthentication {
            kind: kind.to_string(),
            token: None,
            username: None,
            password: None,
            api_key: None,
            extra: BTreeMap::new(),
        }
    }

    #[test]
    fn test_bearer_requires_token() {
        assert!(auth("bearer").validate().is_err());
        let mut a = auth("Bearer");
        a.token = Some("t".into());
        assert!(a.validate().is_ok());
    }

    #[test]
    fn test_basic_requires_username_and_password() {
        let mut a = auth("basic");
        a.username = Some("u".into());
        assert!(a.validate().unwrap_err().contains("password"));
    }

    #[test]
    fn test_unknown_auth_type_is_accepted() {
        assert!(auth("oauth2").validate().is_ok());
    }

    #[test]
    fn test_extra_fields_are_kept() {
        let yaml = "type: custom\napiKey: abc\n";
        let a: ClientAuthentication = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(a.extra.get("apiKey").and_then(|v| v.as_str()), Some("abc"));
        assert!(a.string_values().contains(&"abc"));
    }

    #[test]
    fn test_metadata_rejects_unknown_fields() {
        let yaml = "name: x\nbogus: 1\n";
        assert!(serde_yaml_ng::from_str::<AgentMetadata>(yaml).is_err());
    }
}
