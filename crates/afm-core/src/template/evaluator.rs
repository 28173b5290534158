//! Renders a compiled template against a JSON payload and request headers.

use serde_json::Value;

use afm_types::error::TemplateEvalError;
use afm_types::template::{CompiledTemplate, HeaderSet, Segment};

use super::path::access;

/// Render `compiled` into the final prompt string.
///
/// Only payload references can fail. A header reference that is absent, or
/// evaluated with no headers at all, renders as an empty string.
pub fn evaluate(
    compiled: &CompiledTemplate,
    payload: &Value,
    headers: Option<&HeaderSet>,
) -> Result<String, TemplateEvalError> {
    let mut out = String::new();

    for segment in compiled.segments() {
        match segment {
            Segment::Literal { text } => out.push_str(text),
            Segment::PayloadRef { path } if path.is_empty() => {
                out.push_str(&payload.to_string());
            }
            Segment::PayloadRef { path } => match access(payload, path)? {
                Value::String(s) => out.push_str(s),
                other => out.push_str(&other.to_string()),
            },
            Segment::HeaderRef { name } => {
                if let Some(value) = headers.and_then(|h| h.get(name)) {
                    out.push_str(&value);
                }
            }
        }
    }

    Ok(out)
}
