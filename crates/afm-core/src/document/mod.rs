//! AFM document parsing.
//!
//! An AFM file is markdown with optional YAML frontmatter. Parsing runs in
//! a fixed order: environment variables are substituted over the raw text,
//! the frontmatter is deserialized, the `# Role` and `# Instructions`
//! sections are collected, and the result is validated. A webhook prompt
//! template is compiled at load time so malformed templates fail early.

pub mod frontmatter;
pub mod interfaces;
pub mod validate;
pub mod variables;

use afm_types::agent::AgentRecord;
use afm_types::error::AfmError;
use afm_types::interface::Interface;
use afm_types::template::CompiledTemplate;

use crate::template;

pub use interfaces::{InterfaceSet, interface_of, interfaces, split_interfaces};
pub use variables::{resolve_variables, resolve_variables_with};

/// Parse an AFM document, resolving variables from the process environment.
pub fn parse_afm(content: &str) -> Result<AgentRecord, AfmError> {
    parse_afm_with(content, |name| std::env::var(name).ok())
}

/// Parse an AFM document with an injected environment lookup.
pub fn parse_afm_with<F>(content: &str, lookup: F) -> Result<AgentRecord, AfmError>
where
    F: Fn(&str) -> Option<String>,
{
    let resolved = variables::resolve_variables_with(content, lookup)?;
    let lines: Vec<&str> = resolved.lines().collect();

    let (metadata, body_start) = frontmatter::extract_frontmatter(&lines)?;
    let (role, instructions) = frontmatter::extract_sections(&lines[body_start..]);

    let record = AgentRecord {
        metadata,
        role,
        instructions,
    };

    validate::validate_http_variables(&record)?;
    validate::validate_authentication(&record)?;
    webhook_template(&record)?;

    tracing::debug!(
        name = record.metadata.name.as_deref().unwrap_or("<unnamed>"),
        interfaces = interfaces(&record).len(),
        "parsed agent document"
    );
    Ok(record)
}

/// Compile the webhook prompt template, if the record declares one.
pub fn webhook_template(record: &AgentRecord) -> Result<Option<CompiledTemplate>, AfmError> {
    let prompt = record
        .metadata
        .interfaces
        .iter()
        .flatten()
        .find_map(|i| match i {
            Interface::Webhook(w) => w.prompt.as_deref(),
            _ => None,
        });
    match prompt {
        Some(p) => Ok(Some(template::compile(p)?)),
        None => Ok(None),
    }
}
