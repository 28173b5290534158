//! `${...}` substitution over raw document text.
//!
//! `${env:NAME}` and `${NAME}` are replaced with environment values.
//! `${http:...}` is left for the webhook template compiler. Occurrences on a
//! markdown heading line are skipped.

use afm_types::error::AfmError;

/// Resolve variables using the process environment.
pub fn resolve_variables(content: &str) -> Result<String, AfmError> {
    resolve_variables_with(content, |name| std::env::var(name).ok())
}

/// Resolve variables using `lookup` for environment values.
///
/// Inserted values are never re-scanned.
pub fn resolve_variables_with<F>(content: &str, lookup: F) -> Result<String, AfmError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(content.len());
    let mut pos = 0;

    while let Some((start, end)) = next_variable(content, pos) {
        let expr = &content[start + 2..end - 1];
        out.push_str(&content[pos..start]);
        pos = end;

        let line_start = content[..start].rfind('\n').map_or(0, |i| i + 1);
        if content[line_start..start].trim().starts_with('#') {
            out.push_str(&content[start..end]);
            continue;
        }

        let (prefix, name) = expr.split_once(':').unwrap_or(("", expr));
        match prefix {
            "http" => out.push_str(&content[start..end]),
            "" | "env" => match lookup(name).filter(|v| !v.is_empty()) {
                Some(value) => out.push_str(&value),
                None => {
                    return Err(AfmError::VariableResolution(format!(
                        "${{{expr}}}: environment variable '{name}' not found"
                    )));
                }
            },
            other => {
                return Err(AfmError::VariableResolution(format!(
                    "${{{expr}}}: unsupported variable prefix '{other}:', \
                     only 'env:' and 'http:' are supported"
                )));
            }
        }
    }

    out.push_str(&content[pos..]);
    Ok(out)
}

/// Byte range of the next `${expr}` at or after `from`, where `expr` is
/// non-empty and contains no `}`.
fn next_variable(content: &str, from: usize) -> Option<(usize, usize)> {
    let mut search = from;
    loop {
        let start = search + content[search..].find("${")?;
        let body = start + 2;
        match content[body..].find('}') {
            Some(0) => search = body,
            Some(len) => return Some((start, body + len + 1)),
            None => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(name: &str) -> Option<String> {
        match name {
            "API_KEY" => Some("sk-123".to_string()),
            "EMPTY" => Some(String::new()),
            "LOOP" => Some("${API_KEY}".to_string()),
            _ => None,
        }
    }

    #[test]
    fn test_env_and_bare_forms() {
        let out = resolve_variables_with("a=${env:API_KEY} b=${API_KEY}", env).unwrap();
        assert_eq!(out, "a=sk-123 b=sk-123");
    }

    #[test]
    fn test_http_variables_untouched() {
        let text = "prompt: \"${http:payload.event} ${http:header.X}\"";
        assert_eq!(resolve_variables_with(text, env).unwrap(), text);
    }

    #[test]
    fn test_heading_lines_are_skipped() {
        let text = "# Title ${MISSING}\n  ## Sub ${env:ALSO_MISSING}\nkey: ${API_KEY}";
        let out = resolve_variables_with(text, env).unwrap();
        assert_eq!(
            out,
            "# Title ${MISSING}\n  ## Sub ${env:ALSO_MISSING}\nkey: sk-123"
        );
    }

    #[test]
    fn test_missing_and_empty_values_fail() {
        let err = resolve_variables_with("${MISSING}", env).unwrap_err();
        assert!(matches!(err, AfmError::VariableResolution(ref m) if m.contains("MISSING")));
        assert!(resolve_variables_with("${EMPTY}", env).is_err());
    }

    #[test]
    fn test_unknown_prefix_fails() {
        let err = resolve_variables_with("${vault:token}", env).unwrap_err();
        assert!(err.to_string().contains("only 'env:' and 'http:'"));
    }

    #[test]
    fn test_inserted_values_are_not_rescanned() {
        assert_eq!(resolve_variables_with("${LOOP}", env).unwrap(), "${API_KEY}");
    }

    #[test]
    fn test_empty_and_unterminated_expressions_are_literal() {
        let text = "cost ${} and ${open";
        assert_eq!(resolve_variables_with(text, env).unwrap(), text);
    }
}
