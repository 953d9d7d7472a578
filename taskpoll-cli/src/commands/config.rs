//! Config command - inspect configuration.

use anyhow::Result;
use clap::{Args, Subcommand};
use taskpoll_client::{ClientConfig, ConfigFile};

use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the effective configuration (token redacted).
    Show,

    /// Show the configuration file path.
    Path,
}

/// Runs the config command.
pub fn run(args: &ConfigArgs, cli: &Cli) -> Result<()> {
    match &args.action {
        ConfigAction::Show => show_config(cli),
        ConfigAction::Path => show_path(cli),
    }
}

fn show_config(cli: &Cli) -> Result<()> {
    let config = ClientConfig::load()?;

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_config(&config));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format_config(&config)?);
        }
    }

    Ok(())
}

fn show_path(cli: &Cli) -> Result<()> {
    let path = ConfigFile::default_path();

    match cli.format {
        OutputFormat::Text => {
            println!("Config file: {}", path.display());
            if !path.exists() {
                println!("(not created yet)");
            }
        }
        OutputFormat::Json => {
            let paths = serde_json::json!({
                "configFile": path.display().to_string(),
                "exists": path.exists(),
            });
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&paths)?);
        }
    }

    Ok(())
}
