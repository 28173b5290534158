//! Shaping agent output into HTTP response bodies.

use serde_json::{Map, Value};

use afm_types::runner::AgentOutput;

/// Envelope key used by the webhook interface.
pub const WEBHOOK_RESULT_KEY: &str = "result";

/// Envelope key used by the web chat interface.
pub const WEBCHAT_RESPONSE_KEY: &str = "response";

/// Shape `output` for a JSON response.
///
/// String contract: the output, stringified if needed, wrapped as `{key: s}`.
/// Structured contract: objects pass through, strings are decoded as JSON
/// when possible, anything else is wrapped as `{key: value}`.
pub fn shape_output(output: AgentOutput, output_is_string: bool, key: &str) -> Value {
    if output_is_string {
        let text = match output {
            AgentOutput::Text(s) => s,
            AgentOutput::Structured(v) => v.to_string(),
        };
        return wrap(key, Value::String(text));
    }

    match output.into_value() {
        obj @ Value::Object(_) => obj,
        Value::String(s) => {
            serde_json::from_str::<Value>(&s).unwrap_or_else(|_| wrap(key, Value::String(s)))
        }
        other => wrap(key, other),
    }
}

/// Plain-text rendering for string-to-string chat.
pub fn output_text(output: AgentOutput) -> String {
    match output {
        AgentOutput::Text(s) => s,
        AgentOutput::Structured(v) => v.to_string(),
    }
}

fn wrap(key: &str, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(key.to_string(), value);
    Value::Object(map)
}

/// Body returned by the webhook endpoint for `output`.
pub fn webhook_response(output: AgentOutput, output_is_string: bool) -> Value {
    shape_output(output, output_is_string, WEBHOOK_RESULT_KEY)
}
