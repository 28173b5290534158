//! Post-parse validation of an agent record.

use serde_json::Value;

use afm_types::agent::{AgentRecord, ClientAuthentication};
use afm_types::error::AfmError;
use afm_types::interface::{Exposure, Interface, JsonSchema, Signature, Subscription};

const HTTP_MARKER: &str = "${http:";

fn has_http(s: &str) -> bool {
    s.contains(HTTP_MARKER)
}

fn opt_has_http(s: &Option<String>) -> bool {
    s.as_deref().is_some_and(has_http)
}

/// Reject `${http:...}` everywhere except the webhook `prompt`.
pub fn validate_http_variables(record: &AgentRecord) -> Result<(), AfmError> {
    let mut fields: Vec<&str> = Vec::new();
    let meta = &record.metadata;

    if has_http(&record.role) {
        fields.push("role");
    }
    if has_http(&record.instructions) {
        fields.push("instructions");
    }
    for (name, value) in [
        ("spec_version", &meta.spec_version),
        ("name", &meta.name),
        ("description", &meta.description),
        ("version", &meta.version),
        ("author", &meta.author),
        ("icon_url", &meta.icon_url),
        ("license", &meta.license),
    ] {
        if opt_has_http(value) {
            fields.push(name);
        }
    }
    if meta.authors.iter().flatten().any(|a| has_http(a)) {
        fields.push("authors");
    }
    if let Some(provider) = &meta.provider {
        if opt_has_http(&provider.name) {
            fields.push("provider.name");
        }
        if opt_has_http(&provider.url) {
            fields.push("provider.url");
        }
    }
    if let Some(model) = &meta.model {
        if opt_has_http(&model.name) {
            fields.push("model.name");
        }
        if opt_has_http(&model.provider) {
            fields.push("model.provider");
        }
        if opt_has_http(&model.url) {
            fields.push("model.url");
        }
        if auth_has_http(model.authentication.as_ref()) {
            fields.push("model.authentication");
        }
    }
    for interface in meta.interfaces.iter().flatten() {
        match interface {
            Interface::ConsoleChat(i) => {
                if signature_has_http(&i.signature) {
                    fields.push("interfaces.consolechat.signature");
                }
            }
            Interface::WebChat(i) => {
                if signature_has_http(&i.signature) {
                    fields.push("interfaces.webchat.signature");
                }
                if exposure_has_http(&i.exposure) {
                    fields.push("interfaces.webchat.exposure");
                }
            }
            Interface::Webhook(i) => {
                if signature_has_http(&i.signature) {
                    fields.push("interfaces.webhook.signature");
                }
                if exposure_has_http(&i.exposure) {
                    fields.push("interfaces.webhook.exposure");
                }
                if subscription_has_http(&i.subscription) {
                    fields.push("interfaces.webhook.subscription");
                }
            }
        }
    }
    for server in meta.tools.iter().flat_map(|t| t.mcp.iter().flatten()) {
        if has_http(&server.name) {
            fields.push("tools.mcp.name");
        }
        if has_http(&server.transport.url) {
            fields.push("tools.mcp.transport.url");
        }
        if auth_has_http(server.transport.authentication.as_ref()) {
            fields.push("tools.mcp.transport.authentication");
        }
        if let Some(filter) = &server.tool_filter {
            let mut names = filter.allow.iter().flatten().chain(filter.deny.iter().flatten());
            if names.any(|t| has_http(t)) {
                fields.push("tools.mcp.tool_filter");
            }
        }
    }

    if fields.is_empty() {
        return Ok(());
    }
    Err(AfmError::Validation(format!(
        "http: variables are only supported in webhook prompt fields, found in: {}",
        fields.join(", ")
    )))
}

/// Check every authentication block for its type's required fields.
pub fn validate_authentication(record: &AgentRecord) -> Result<(), AfmError> {
    let meta = &record.metadata;
    let mut blocks: Vec<(&str, &ClientAuthentication)> = Vec::new();

    if let Some(auth) = meta.model.as_ref().and_then(|m| m.authentication.as_ref()) {
        blocks.push(("model.authentication", auth));
    }
    for interface in meta.interfaces.iter().flatten() {
        if let Interface::Webhook(w) = interface
            && let Some(auth) = &w.subscription.authentication
        {
            blocks.push(("interfaces.webhook.subscription.authentication", auth));
        }
    }
    for server in meta.tools.iter().flat_map(|t| t.mcp.iter().flatten()) {
        if let Some(auth) = &server.transport.authentication {
            blocks.push(("tools.mcp.transport.authentication", auth));
        }
    }

    for (field, auth) in blocks {
        auth.validate()
            .map_err(|reason| AfmError::Validation(format!("{field}: {reason}")))?;
    }
    Ok(())
}

fn auth_has_http(auth: Option<&ClientAuthentication>) -> bool {
    auth.is_some_and(|a| a.string_values().into_iter().any(has_http))
}

fn signature_has_http(signature: &Signature) -> bool {
    schema_has_http(&signature.input) || schema_has_http(&signature.output)
}

fn schema_has_http(schema: &JsonSchema) -> bool {
    serde_json::to_value(schema).is_ok_and(|v| value_has_http(&v))
}

fn value_has_http(value: &Value) -> bool {
    match value {
        Value::String(s) => has_http(s),
        Value::Array(items) => items.iter().any(value_has_http),
        Value::Object(map) => map.values().any(value_has_http),
        _ => false,
    }
}

fn exposure_has_http(exposure: &Exposure) -> bool {
    exposure.http.as_ref().is_some_and(|h| has_http(&h.path))
}

fn subscription_has_http(sub: &Subscription) -> bool {
    has_http(&sub.protocol)
        || opt_has_http(&sub.hub)
        || opt_has_http(&sub.topic)
        || opt_has_http(&sub.callback)
        || opt_has_http(&sub.secret)
        || auth_has_http(sub.authentication.as_ref())
}
