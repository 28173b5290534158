//! Frontmatter and markdown section extraction.

use afm_types::agent::AgentMetadata;
use afm_types::error::AfmError;

const DELIMITER: &str = "---";

/// Parse the YAML frontmatter block, if any.
///
/// Returns the metadata and the index of the first body line.
pub fn extract_frontmatter(lines: &[&str]) -> Result<(AgentMetadata, usize), AfmError> {
    if lines.first().map(|l| l.trim()) != Some(DELIMITER) {
        return Ok((AgentMetadata::default(), 0));
    }

    let end = lines
        .iter()
        .skip(1)
        .position(|l| l.trim() == DELIMITER)
        .map(|i| i + 1)
        .ok_or_else(|| AfmError::Parse("unclosed frontmatter, missing closing '---'".into()))?;

    let yaml = lines[1..end].join("\n");
    if yaml.trim().is_empty() {
        return Ok((AgentMetadata::default(), end + 1));
    }

    let value: serde_yaml_ng::Value = serde_yaml_ng::from_str(&yaml)
        .map_err(|e| AfmError::Parse(format!("invalid YAML in frontmatter: {e}")))?;
    match value {
        serde_yaml_ng::Value::Null => Ok((AgentMetadata::default(), end + 1)),
        serde_yaml_ng::Value::Mapping(_) => {
            let metadata = serde_yaml_ng::from_value(value)
                .map_err(|e| AfmError::Validation(format!("invalid frontmatter: {e}")))?;
            Ok((metadata, end + 1))
        }
        _ => Err(AfmError::Parse(
            "frontmatter must be a YAML mapping".into(),
        )),
    }
}

/// Collect the `# Role` and `# Instructions` sections from the body.
///
/// Headings match case-insensitively at level 1 only. Any other level-1
/// heading closes the current section.
pub fn extract_sections(lines: &[&str]) -> (String, String) {
    #[derive(PartialEq)]
    enum Section {
        None,
        Role,
        Instructions,
    }

    let mut role = Vec::new();
    let mut instructions = Vec::new();
    let mut current = Section::None;

    for line in lines {
        if let Some(heading) = line.trim().strip_prefix("# ") {
            current = match heading.trim().to_lowercase().as_str() {
                "role" => Section::Role,
                "instructions" => Section::Instructions,
                _ => Section::None,
            };
            if current != Section::None {
                continue;
            }
        }
        match current {
            Section::Role => role.push(*line),
            Section::Instructions => instructions.push(*line),
            Section::None => {}
        }
    }

    (
        role.join("\n").trim().to_string(),
        instructions.join("\n").trim().to_string(),
    )
}
