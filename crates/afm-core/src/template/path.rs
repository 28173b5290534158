//! Dot/bracket field-path access into a JSON value.
//!
//! Grammar:
//! - `field` or `.field` -- object field, runs until the next `.` or `[`
//! - `[3]` -- array index (negative indices are out of bounds)
//! - `['a.b']` / `["a.b"]` -- quoted object field, may contain `.`, `[` and `]`
//!
//! Every dereference is checked and reports a [`PathAccessError`] carrying
//! the full path.

use serde_json::Value;

use afm_types::error::PathAccessError;

/// Resolve `path` against `root`. An empty path returns `root`.
pub fn access<'a>(root: &'a Value, path: &str) -> Result<&'a Value, PathAccessError> {
    let fail = |reason: String| PathAccessError::new(path, reason);

    let mut current = root;
    let mut rest = path;

    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix('[') {
            let (next, remaining) = bracket(current, after).map_err(fail)?;
            current = next;
            rest = remaining;
            continue;
        }

        let body = match rest.strip_prefix('.') {
            Some(after) if after.is_empty() || after.starts_with(['.', '[']) => {
                return Err(fail(format!("Empty field name in path: {rest}")));
            }
            Some(after) => after,
            None => rest,
        };
        let end = body.find(['.', '[']).unwrap_or(body.len());
        let (name, remaining) = body.split_at(end);
        current = field(current, name).map_err(fail)?;
        rest = remaining;
    }

    Ok(current)
}

/// Handle the text following a `[`. Returns the selected value and the unparsed tail.
fn bracket<'a, 'p>(current: &'a Value, after: &'p str) -> Result<(&'a Value, &'p str), String> {
    if let Some(quote) = after.chars().next().filter(|c| *c == '\'' || *c == '"') {
        let inner = &after[1..];
        let close = inner
            .find(quote)
            .ok_or_else(|| format!("Unterminated quoted field in path: [{after}"))?;
        let name = &inner[..close];
        let tail = inner[close + 1..]
            .strip_prefix(']')
            .ok_or_else(|| format!("Expected ']' after quoted field '{name}'"))?;
        return Ok((field(current, name)?, tail));
    }

    let close = after
        .find(']')
        .ok_or_else(|| format!("Invalid bracket notation in path: [{after}"))?;
    let content = &after[..close];
    let index: i64 = content
        .trim()
        .parse()
        .map_err(|_| format!("Invalid array index: {content}"))?;
    Ok((element(current, index)?, &after[close + 1..]))
}

fn field<'a>(current: &'a Value, name: &str) -> Result<&'a Value, String> {
    match current {
        Value::Object(map) => map
            .get(name)
            .ok_or_else(|| format!("Field '{name}' not found")),
        _ => Err(format!("Cannot access field '{name}' on non-object")),
    }
}

fn element(current: &Value, index: i64) -> Result<&Value, String> {
    let Value::Array(items) = current else {
        return Err(format!("Cannot access index {index} on non-array"));
    };
    usize::try_from(index)
        .ok()
        .and_then(|i| items.get(i))
        .ok_or_else(|| format!("Array index out of bounds: {index}"))
}
