//! Compiles `${http:...}` prompt templates into segment lists.

use afm_types::error::TemplateCompileError;
use afm_types::template::{CompiledTemplate, Segment};

const HTTP_PREFIX: &str = "http:";

/// Compile a template string.
///
/// Non-`http:` expressions are kept verbatim as literals, including their
/// `${...}` wrapper. An unterminated `${` turns the rest of the input into a
/// trailing literal.
pub fn compile(template: &str) -> Result<CompiledTemplate, TemplateCompileError> {
    let mut segments = Vec::new();
    let mut pos = 0;

    while pos < template.len() {
        let Some(open) = template[pos..].find("${").map(|i| pos + i) else {
            segments.push(literal(&template[pos..]));
            break;
        };
        let Some(close) = template[open..].find('}').map(|i| open + i) else {
            segments.push(literal(&template[pos..]));
            break;
        };

        if open > pos {
            segments.push(literal(&template[pos..open]));
        }

        let expr = &template[open + 2..close];
        match expr.strip_prefix(HTTP_PREFIX) {
            Some(http_part) => segments.push(http_variable(template, expr, http_part)?),
            None => segments.push(literal(&template[open..=close])),
        }

        pos = close + 1;
    }

    Ok(CompiledTemplate::new(template, segments))
}

fn literal(text: &str) -> Segment {
    Segment::Literal {
        text: text.to_string(),
    }
}

fn http_variable(
    template: &str,
    expr: &str,
    http_part: &str,
) -> Result<Segment, TemplateCompileError> {
    let error = |reason: String| TemplateCompileError {
        template: template.to_string(),
        reason,
    };

    if http_part == "payload" {
        return Ok(Segment::PayloadRef {
            path: String::new(),
        });
    }
    if let Some(path) = http_part.strip_prefix("payload.") {
        if path.is_empty() {
            return Err(error(format!("invalid http variable format: ${{{expr}}}")));
        }
        return Ok(Segment::PayloadRef {
            path: path.to_string(),
        });
    }
    if let Some(name) = http_part.strip_prefix("header.") {
        if name.is_empty() {
            return Err(error(format!("invalid http variable format: ${{{expr}}}")));
        }
        return Ok(Segment::HeaderRef {
            name: name.to_string(),
        });
    }

    let prefix = http_part.split('.').next().unwrap_or(http_part);
    Err(error(format!("unknown http variable prefix: {prefix}")))
}
