//! Allow/deny filtering of a server's tools.
//!
//! A tool survives when it is in `allow` (or `allow` is absent) and not in
//! `deny`. Deny wins over allow. Names in either list that the server does not
//! offer are ignored.

use afm_types::agent::ToolFilter;
use afm_types::llm::ToolDefinition;

pub fn is_allowed(name: &str, filter: &ToolFilter) -> bool {
    let allowed = filter
        .allow
        .as_ref()
        .is_none_or(|allow| allow.iter().any(|a| a == name));
    let denied = filter
        .deny
        .as_ref()
        .is_some_and(|deny| deny.iter().any(|d| d == name));
    allowed && !denied
}

/// Keep the permitted tools, in server order.
pub fn filter_tools(tools: Vec<ToolDefinition>, filter: Option<&ToolFilter>) -> Vec<ToolDefinition> {
    match filter {
        Some(filter) => tools
            .into_iter()
            .filter(|tool| is_allowed(&tool.name, filter))
            .collect(),
        None => tools,
    }
}
