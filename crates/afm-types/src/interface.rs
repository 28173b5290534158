//! Interface definitions: how an agent is exposed (console, web chat, webhook).

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::agent::ClientAuthentication;

/// Default HTTP path for the web chat interface.
pub const DEFAULT_WEBCHAT_PATH: &str = "/chat";

/// Default HTTP path for the webhook interface.
pub const DEFAULT_WEBHOOK_PATH: &str = "/webhook";

/// Interface discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterfaceKind {
    ConsoleChat,
    WebChat,
    Webhook,
}

impl InterfaceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterfaceKind::ConsoleChat => "consolechat",
            InterfaceKind::WebChat => "webchat",
            InterfaceKind::Webhook => "webhook",
        }
    }
}

impl fmt::Display for InterfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of `metadata.interfaces`, tagged by its `type` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Interface {
    #[serde(rename = "consolechat")]
    ConsoleChat(ConsoleChatInterface),
    #[serde(rename = "webchat")]
    WebChat(WebChatInterface),
    #[serde(rename = "webhook")]
    Webhook(WebhookInterface),
}

impl Interface {
    pub fn kind(&self) -> InterfaceKind {
        match self {
            Interface::ConsoleChat(_) => InterfaceKind::ConsoleChat,
            Interface::WebChat(_) => InterfaceKind::WebChat,
            Interface::Webhook(_) => InterfaceKind::Webhook,
        }
    }

    pub fn signature(&self) -> &Signature {
        match self {
            Interface::ConsoleChat(i) => &i.signature,
            Interface::WebChat(i) => &i.signature,
            Interface::Webhook(i) => &i.signature,
        }
    }

    /// HTTP path for HTTP-exposed interfaces, `None` for the console.
    pub fn http_path(&self) -> Option<&str> {
        match self {
            Interface::ConsoleChat(_) => None,
            Interface::WebChat(i) => Some(i.http_path()),
            Interface::Webhook(i) => Some(i.http_path()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConsoleChatInterface {
    #[serde(default)]
    pub signature: Signature,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WebChatInterface {
    #[serde(default)]
    pub signature: Signature,
    #[serde(default = "Exposure::webchat")]
    pub exposure: Exposure,
}

impl WebChatInterface {
    pub fn http_path(&self) -> &str {
        self.exposure
            .http
            .as_ref()
            .map_or(DEFAULT_WEBCHAT_PATH, |h| h.path.as_str())
    }
}

impl Default for WebChatInterface {
    fn default() -> Self {
        Self {
            signature: Signature::default(),
            exposure: Exposure::webchat(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WebhookInterface {
    /// Prompt template; may reference `${http:payload...}` and `${http:header...}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default)]
    pub signature: Signature,
    #[serde(default = "Exposure::webhook")]
    pub exposure: Exposure,
    pub subscription: Subscription,
}

impl WebhookInterface {
    pub fn http_path(&self) -> &str {
        self.exposure
            .http
            .as_ref()
            .map_or(DEFAULT_WEBHOOK_PATH, |h| h.path.as_str())
    }
}

/// Input/output contract of an interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Signature {
    #[serde(default = "JsonSchema::string")]
    pub input: JsonSchema,
    #[serde(default = "JsonSchema::string")]
    pub output: JsonSchema,
}

impl Default for Signature {
    fn default() -> Self {
        Self {
            input: JsonSchema::string(),
            output: JsonSchema::string(),
        }
    }
}

/// The subset of JSON Schema AFM documents use. Unknown keywords are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonSchema {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, JsonSchema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<JsonSchema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl JsonSchema {
    pub fn string() -> Self {
        Self::of_type("string")
    }

    pub fn of_type(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            properties: None,
            required: None,
            items: None,
            description: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn is_string(&self) -> bool {
        self.kind == "string"
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Exposure {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpExposure>,
}

impl Exposure {
    fn with_path(path: &str) -> Self {
        Self {
            http: Some(HttpExposure {
                path: path.to_string(),
            }),
        }
    }

    pub fn webchat() -> Self {
        Self::with_path(DEFAULT_WEBCHAT_PATH)
    }

    pub fn webhook() -> Self {
        Self::with_path(DEFAULT_WEBHOOK_PATH)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpExposure {
    pub path: String,
}

/// Event subscription settings of a webhook interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Subscription {
    /// Protocol tag, e.g. `websub`.
    pub protocol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<ClientAuthentication>,
}

impl Subscription {
    /// Whether a hub handshake should be attempted.
    pub fn has_hub(&self) -> bool {
        self.hub.is_some() && self.topic.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interface_tagged_by_type() {
        let yaml = r#"
- type: consolechat
- type: webchat
  exposure:
    http:
      path: /talk
- type: webhook
  prompt: "Event: ${http:payload.event}"
  subscription:
    protocol: websub
    hub: https://hub.example.com
    topic: https://example.com/feed
"#;
        let interfaces: Vec<Interface> = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(interfaces.len(), 3);
        assert_eq!(interfaces[0].kind(), InterfaceKind::ConsoleChat);
        assert_eq!(interfaces[1].http_path(), Some("/talk"));
        match &interfaces[2] {
            Interface::Webhook(w) => {
                assert_eq!(w.http_path(), DEFAULT_WEBHOOK_PATH);
                assert!(w.subscription.has_hub());
                assert!(w.signature.output.is_string());
            }
            other => panic!("expected webhook, got {other:?}"),
        }
    }

    #[test]
    fn test_webhook_requires_subscription() {
        let yaml = "- type: webhook\n  prompt: hi\n";
        assert!(serde_yaml_ng::from_str::<Vec<Interface>>(yaml).is_err());
    }

    #[test]
    fn test_unknown_interface_type_rejected() {
        let yaml = "- type: carrier-pigeon\n";
        assert!(serde_yaml_ng::from_str::<Vec<Interface>>(yaml).is_err());
    }

    #[test]
    fn test_json_schema_keeps_extra_keywords() {
        let yaml = "type: object\nproperties:\n  n:\n    type: integer\n    minimum: 1\nrequired: [n]\n";
        let schema: JsonSchema = serde_yaml_ng::from_str(yaml).unwrap();
        let n = &schema.properties.as_ref().unwrap()["n"];
        assert_eq!(n.kind, "integer");
        assert_eq!(n.extra.get("minimum"), Some(&serde_json::json!(1)));
    }
}
