// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! taskpoll CLI - submit generation tasks and poll them from the command line.
//!
//! # Examples
//!
//! ```bash
//! # Ask a question with the default model
//! taskpoll chat "Explain ownership in Rust"
//!
//! # Use a specific model and system prompt
//! taskpoll chat -m yuanbao --system "Answer in one line" "What is a monad?"
//!
//! # Generate an image, giving up locally after 10 minutes
//! taskpoll chat --generate-image --timeout 600 "A lighthouse at dusk"
//!
//! # Check on tasks
//! taskpoll task get 42 43
//!
//! # JSON output
//! taskpoll --format json --pretty chat "hello"
//! ```

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use taskpoll_client::TaskError;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use commands::{chat, config, task};

// ============================================================================
// CLI Definition
// ============================================================================

/// taskpoll CLI - remote generation tasks.
#[derive(Parser)]
#[command(name = "taskpoll")]
#[command(about = "Submit generation tasks and poll them to completion")]
#[command(long_about = r#"
taskpoll submits a prompt to a remote task API, then polls until the
task finishes.

Configuration comes from environment variables (AI_API_TOKEN,
AI_API_BASE_URL, AI_API_TIMEOUT, AI_API_RETRY_ON_RATE_LIMIT,
AI_API_MAX_RETRIES, AI_API_RETRY_DELAY) layered over the config file
shown by `taskpoll config path`.

Examples:
  taskpoll chat "hello"                   # Default model
  taskpoll chat -m yuanbao "hello"        # Specific model
  taskpoll task get 42                    # Task status
  taskpoll --format json chat "hello"     # JSON output
"#)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (minimal output).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Submit a prompt and wait for the answer.
    #[command(visible_alias = "c")]
    Chat(chat::ChatArgs),

    /// Inspect submitted tasks.
    #[command(visible_alias = "t")]
    Task(task::TaskArgs),

    /// Manage configuration.
    Config(config::ConfigArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// General error.
    Error = 1,
    /// The request was rejected or the task failed.
    InvalidRequest = 2,
    /// Rate limited, after any retries.
    RateLimited = 3,
    /// Poll budget or wall-clock timeout.
    Timeout = 4,
    /// Missing or rejected token.
    Authentication = 5,
}

impl ExitCode {
    /// Picks the exit code for an error.
    pub fn for_error(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<TaskError>() {
            Some(TaskError::InvalidRequest(_)) => Self::InvalidRequest,
            Some(TaskError::RateLimited(_)) => Self::RateLimited,
            Some(TaskError::PollTimeout { .. } | TaskError::Timeout(_)) => Self::Timeout,
            Some(TaskError::Authentication(_)) => Self::Authentication,
            _ => Self::Error,
        }
    }
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("taskpoll=debug,taskpoll_client=debug,taskpoll_core=debug,info")
        } else {
            EnvFilter::new("taskpoll=warn,taskpoll_client=warn,taskpoll_core=warn")
        }
    });

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Commands::Chat(args) => chat::run(args, &cli).await,
        Commands::Task(args) => task::run(args, &cli).await,
        Commands::Config(args) => config::run(args, &cli),
    };

    if let Err(e) = result {
        if !cli.quiet {
            eprintln!("Error: {e:#}");
        }
        std::process::exit(ExitCode::for_error(&e) as i32);
    }

    Ok(())
}
