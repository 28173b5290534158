//! Command parsing for the console chat loop.
//!
//! Commands are bare words (`help`, `clear`, `exit`); a leading `/` is
//! accepted too. Anything else is a message for the agent.

use console::style;

#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    /// Show available commands.
    Help,
    /// Forget the conversation history of this session.
    Clear,
    /// End the chat session.
    Exit,
}

/// Parse user input as a command. Returns `None` for ordinary messages.
pub fn parse(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    let word = trimmed.strip_prefix('/').unwrap_or(trimmed).to_lowercase();

    match word.as_str() {
        "help" | "?" => Some(ChatCommand::Help),
        "clear" => Some(ChatCommand::Clear),
        "exit" | "quit" => Some(ChatCommand::Exit),
        _ => None,
    }
}

pub fn print_help() {
    println!();
    println!("  {}", style("Available commands:").bold());
    println!();
    println!("  {}   {}", style("help").cyan(), "Show this help message");
    println!("  {}  {}", style("clear").cyan(), "Clear the conversation history");
    println!("  {}   {}", style("exit").cyan(), "End the chat session (also: quit)");
    println!();
    println!("  {}", style("Ctrl+D to exit").dim());
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exit() {
        assert_eq!(parse("exit"), Some(ChatCommand::Exit));
        assert_eq!(parse("QUIT"), Some(ChatCommand::Exit));
        assert_eq!(parse("/quit"), Some(ChatCommand::Exit));
    }

    #[test]
    fn test_parse_help_and_clear() {
        assert_eq!(parse("help"), Some(ChatCommand::Help));
        assert_eq!(parse("  /help  "), Some(ChatCommand::Help));
        assert_eq!(parse("clear"), Some(ChatCommand::Clear));
    }

    #[test]
    fn test_messages_are_not_commands() {
        assert_eq!(parse("help me write a poem"), None);
        assert_eq!(parse("exiting"), None);
        assert_eq!(parse(""), None);
    }
}
