//! Main console chat loop.
//!
//! Reads lines, dispatches commands, runs the agent on everything else and
//! renders the reply: markdown through termimad, structured output as
//! pretty JSON.

use std::sync::Arc;
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use termimad::MadSkin;
use uuid::Uuid;

use afm_core::runner::BoxAgentRunner;
use afm_types::interface::JsonSchema;
use afm_types::runner::{AgentInput, AgentOutput};

use super::commands::{self, ChatCommand};
use super::input::{ChatInput, InputEvent};

/// Turn a typed line into agent input for `schema`.
///
/// Non-string input schemas expect the line to be JSON.
pub fn build_input(line: &str, schema: &JsonSchema) -> Result<AgentInput, String> {
    if schema.is_string() {
        return Ok(AgentInput::Text(line.to_string()));
    }
    serde_json::from_str(line)
        .map(AgentInput::Structured)
        .map_err(|e| format!("this agent expects JSON input of type '{}': {e}", schema.kind))
}

/// Terminal rendering of an agent reply.
pub fn render_output(skin: &MadSkin, output: &AgentOutput) -> String {
    match output {
        AgentOutput::Text(text) => skin.term_text(text).to_string(),
        AgentOutput::Structured(value) => {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        }
    }
}

fn print_banner(runner: &BoxAgentRunner, session_id: &str) {
    println!();
    println!("  {}", style(runner.name()).cyan().bold());
    if let Some(description) = runner.description() {
        println!("  {}", style(description).dim());
    }
    println!(
        "  {}",
        style(format!("session {session_id} | type 'help' for commands")).dim()
    );
    println!();
}

fn thinking_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(spinner_style);
    }
    spinner.set_message("thinking...");
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Run the interactive chat until the user exits.
pub async fn run_chat_loop(runner: Arc<BoxAgentRunner>) -> anyhow::Result<()> {
    let session_id = Uuid::now_v7().to_string();
    let skin = MadSkin::default_dark();
    let input_schema = runner.signature().input.clone();

    print_banner(&runner, &session_id);

    let prompt = format!("  {} ", style("You >").green().bold());
    let (mut chat_input, _writer) = ChatInput::new(prompt)
        .map_err(|e| anyhow::anyhow!("Failed to initialize input: {e}"))?;

    loop {
        match chat_input.read_line().await {
            InputEvent::Eof => {
                println!("\n  {}", style("Session ended.").dim());
                break;
            }
            InputEvent::Interrupted => {
                println!("\n  {}", style("Press Ctrl+D or type 'exit' to quit.").dim());
            }
            InputEvent::Message(text) => {
                if text.is_empty() {
                    continue;
                }

                if let Some(cmd) = commands::parse(&text) {
                    match cmd {
                        ChatCommand::Help => commands::print_help(),
                        ChatCommand::Clear => {
                            runner.clear_history(&session_id);
                            println!("\n  {}\n", style("Conversation history cleared.").dim());
                        }
                        ChatCommand::Exit => {
                            println!("\n  {}", style("Session ended.").dim());
                            break;
                        }
                    }
                    continue;
                }

                let input = match build_input(&text, &input_schema) {
                    Ok(input) => input,
                    Err(msg) => {
                        eprintln!("\n  {} {msg}\n", style("!").yellow().bold());
                        continue;
                    }
                };

                let spinner = thinking_spinner();
                let result = runner.run(input, &session_id).await;
                spinner.finish_and_clear();

                match result {
                    Ok(output) => {
                        println!("\n  {}", style(runner.name()).cyan().bold());
                        println!("{}", render_output(&skin, &output));
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "console turn failed");
                        eprintln!("\n  {} {e}", style("!").red().bold());
                        eprintln!("  {}\n", style("Type a message to retry, 'exit' to quit.").dim());
                    }
                }
            }
        }
    }

    chat_input.flush();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_input_string_schema_keeps_text() {
        let input = build_input("{\"a\": 1}", &JsonSchema::string()).unwrap();
        assert_eq!(input, AgentInput::Text("{\"a\": 1}".into()));
    }

    #[test]
    fn test_build_input_structured_schema_parses_json() {
        let schema = JsonSchema::of_type("object");
        assert_eq!(
            build_input("{\"a\": 1}", &schema).unwrap(),
            AgentInput::Structured(json!({"a": 1}))
        );
        assert!(build_input("not json", &schema).unwrap_err().contains("object"));
    }

    #[test]
    fn test_render_structured_output_as_pretty_json() {
        let skin = MadSkin::no_style();
        let rendered = render_output(&skin, &AgentOutput::Structured(json!({"k": [1]})));
        assert_eq!(rendered, "{\n  \"k\": [\n    1\n  ]\n}");
    }
}
