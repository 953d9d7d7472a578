//! Task command - inspect submitted tasks.

use anyhow::Result;
use clap::{Args, Subcommand};
use taskpoll_client::{ClientConfig, TaskClient};
use tracing::info;

use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the task command.
#[derive(Args)]
pub struct TaskArgs {
    #[command(subcommand)]
    pub action: TaskAction,
}

/// Task subcommands.
#[derive(Subcommand)]
pub enum TaskAction {
    /// Poll one or more tasks once and show their status.
    Get {
        /// Task ids.
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

/// Runs the task command.
pub async fn run(args: &TaskArgs, cli: &Cli) -> Result<()> {
    match &args.action {
        TaskAction::Get { ids } => get_tasks(ids, cli).await,
    }
}

async fn get_tasks(ids: &[String], cli: &Cli) -> Result<()> {
    let client = TaskClient::new(ClientConfig::load()?)?;

    if let [id] = ids {
        let record = client.retrieve_task(id).await?;
        match cli.format {
            OutputFormat::Text => {
                let formatter = TextFormatter::new(!cli.no_color);
                println!("{}", formatter.format_record(&record, cli.verbose));
            }
            OutputFormat::Json => {
                let formatter = JsonFormatter::new(cli.pretty);
                println!("{}", formatter.format(&record)?);
            }
        }
        return Ok(());
    }

    info!(count = ids.len(), "Retrieving tasks");
    let entries = client.batch_retrieve(ids).await?;

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_batch(&entries));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format_batch(&entries)?);
        }
    }

    Ok(())
}
