//! `afm validate`: parse an agent file and print what it declares.

use std::path::Path;

use anyhow::Context;
use console::style;

use afm_core::document;
use afm_infra::filesystem::load_agent_file;
use afm_types::agent::{AgentRecord, McpServer};
use afm_types::interface::Interface;

pub async fn validate(file: &Path) -> anyhow::Result<()> {
    let record = load_agent_file(file)
        .await
        .with_context(|| format!("invalid agent file {}", file.display()))?;
    document::split_interfaces(&record)?;

    println!(
        "\n  {} {}",
        style("✓").green().bold(),
        style(format!("{} is valid", file.display())).bold()
    );
    print_summary(&record);
    Ok(())
}

/// `name via provider`, defaulting to `default` and `openai`.
pub fn model_label(record: &AgentRecord) -> String {
    let model = record.metadata.model.as_ref();
    let name = model.and_then(|m| m.name.as_deref()).unwrap_or("default");
    let provider = model.and_then(|m| m.provider.as_deref()).unwrap_or("openai");
    format!("{name} via {provider}")
}

/// One summary line for an interface: kind, signature types, HTTP path.
pub fn interface_label(interface: &Interface) -> String {
    let signature = interface.signature();
    let mut label = format!(
        "{:<12} {} -> {}",
        interface.kind().as_str(),
        signature.input.kind,
        signature.output.kind
    );
    if let Some(path) = interface.http_path() {
        label.push_str(&format!("  {path}"));
    }
    if let Interface::Webhook(webhook) = interface
        && webhook.subscription.has_hub()
    {
        label.push_str("  (websub)");
    }
    label
}

fn mcp_label(server: &McpServer) -> String {
    let mut label = format!("{} ({})", server.name, server.transport.url);
    if let Some(filter) = &server.tool_filter {
        if let Some(allow) = &filter.allow {
            label.push_str(&format!(" allow=[{}]", allow.join(", ")));
        }
        if let Some(deny) = &filter.deny {
            label.push_str(&format!(" deny=[{}]", deny.join(", ")));
        }
    }
    label
}

/// Print the agent summary shared by `validate` and `run --dry-run`.
pub fn print_summary(record: &AgentRecord) {
    let meta = &record.metadata;
    let field = |label: &str, value: &str| {
        println!("  {:<13} {}", style(label).dim(), value);
    };

    println!();
    field("Name", meta.name.as_deref().unwrap_or("(unnamed)"));
    if let Some(description) = &meta.description {
        field("Description", description);
    }
    if let Some(version) = &meta.version {
        field("Version", version);
    }
    field("Model", &model_label(record));

    println!("  {}", style("Interfaces").dim());
    for interface in document::interfaces(record) {
        println!("    {}", interface_label(&interface));
    }

    if let Some(servers) = meta.tools.as_ref().and_then(|t| t.mcp.as_ref())
        && !servers.is_empty()
    {
        println!("  {}", style("MCP servers").dim());
        for server in servers {
            println!("    {}", mcp_label(server));
        }
    }
    println!();
}
