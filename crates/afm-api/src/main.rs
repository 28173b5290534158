//! AFM agent runner entry point.
//!
//! Binary name: `afm`
//!
//! Parses CLI arguments and dispatches to `run`, `validate` or shell
//! completion generation.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;

use afm_observe::tracing_setup::{LogOptions, init_tracing};
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log = LogOptions {
        verbosity: cli.verbose,
        log_file: cli.log_file.clone(),
        console_mode: false,
        otel: cli.otel,
    };

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            generate(shell, &mut cmd, "afm", &mut std::io::stdout());
        }

        Commands::Validate { file } => {
            init_tracing(&log).map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;
            cli::validate::validate(&file).await?;
        }

        // Logging is initialized inside `run` once it knows whether the
        // console chat owns the terminal.
        Commands::Run(args) => {
            cli::run::run(args, log).await?;
        }
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
pub(crate) async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
