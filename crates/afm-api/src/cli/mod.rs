//! CLI command definitions for the `afm` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod chat;
pub mod run;
pub mod validate;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// Run agents described in Agent-Flavored Markdown.
#[derive(Parser)]
#[command(name = "afm", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Detailed output (-v for debug, -vv for trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Also write logs to this file.
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve an agent over its declared interfaces.
    Run(RunArgs),

    /// Parse an agent file and print a summary.
    Validate {
        /// Path to the agent file.
        file: PathBuf,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Path to the agent file.
    pub file: PathBuf,

    /// Listen address (overrides afm.toml).
    #[arg(long)]
    pub host: Option<String>,

    /// Listen port (overrides afm.toml).
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Do not start the interactive console chat.
    #[arg(long)]
    pub no_console: bool,

    /// Validate and print the agent summary without serving.
    #[arg(long)]
    pub dry_run: bool,

    /// Accept webhook requests without checking their HMAC signature.
    #[arg(long)]
    pub no_verify_signatures: bool,

    /// Allowed CORS origin for the HTTP interfaces (repeatable, `*` for any).
    #[arg(long = "cors-origin", value_name = "ORIGIN")]
    pub cors_origins: Vec<String>,
}
