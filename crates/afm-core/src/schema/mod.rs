//! Output coercion against an interface's output schema.
//!
//! Only the top-level JSON type and the `required` keys of objects are
//! checked. This is not a JSON Schema validator.

use serde_json::Value;

use afm_types::error::OutputValidationError;
use afm_types::interface::JsonSchema;
use afm_types::runner::{AgentInput, AgentOutput};

/// Pull JSON text out of a model response.
///
/// Prefers the first ```` ```json ```` fence, then the first plain fence,
/// then the whole trimmed response.
pub fn extract_json_from_response(response: &str) -> &str {
    if let Some(body) = fenced(response, "```json") {
        return body;
    }
    if let Some(body) = fenced(response, "```") {
        return body;
    }
    response.trim()
}

fn fenced<'a>(response: &'a str, opener: &str) -> Option<&'a str> {
    let start = response.find(opener)? + opener.len();
    let rest = &response[start..];
    // Skip a language tag on a plain fence, e.g. ```javascript
    let rest = match rest.find('\n') {
        Some(nl) if opener == "```" && !rest[..nl].trim().is_empty() => &rest[nl + 1..],
        _ => rest,
    };
    let end = rest.find("```")?;
    Some(rest[..end].trim())
}

/// Turn raw model text into the output the interface contract promises.
pub fn coerce_output(text: &str, schema: &JsonSchema) -> Result<AgentOutput, OutputValidationError> {
    if schema.is_string() {
        return Ok(AgentOutput::Text(text.to_string()));
    }

    let json = extract_json_from_response(text);
    let value: Value = serde_json::from_str(json).map_err(|e| {
        OutputValidationError(format!("response is not valid JSON: {e}"))
    })?;
    check_type(&value, schema)?;
    Ok(AgentOutput::Structured(value))
}

/// Check structured input against the input schema. Text input is always
/// accepted: every interface hands the agent a prompt string at minimum.
pub fn validate_input(input: &AgentInput, schema: &JsonSchema) -> Result<(), String> {
    match input {
        AgentInput::Text(_) => Ok(()),
        AgentInput::Structured(value) => check_type(value, schema).map_err(|e| e.0),
    }
}

fn check_type(value: &Value, schema: &JsonSchema) -> Result<(), OutputValidationError> {
    let ok = match schema.kind.as_str() {
        "object" => value.is_object(),
        "array" => value.is_array(),
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "null" => value.is_null(),
        _ => true,
    };
    if !ok {
        return Err(OutputValidationError(format!(
            "expected {}, got {}",
            schema.kind,
            type_name(value)
        )));
    }

    if let (Value::Object(map), Some(required)) = (value, &schema.required) {
        let missing: Vec<&str> = required
            .iter()
            .filter(|k| !map.contains_key(k.as_str()))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(OutputValidationError(format!(
                "missing required properties: {}",
                missing.join(", ")
            )));
        }
    }
    Ok(())
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// System-prompt paragraph asking the model to answer with matching JSON.
pub fn output_schema_instruction(schema: &JsonSchema) -> String {
    let rendered = serde_json::to_string_pretty(schema).unwrap_or_else(|_| schema.kind.clone());
    format!(
        "# Output Format\nRespond only with JSON that conforms to the following JSON Schema. \
         Do not include any other text.\n```json\n{rendered}\n```"
    )
}
