//! Chat command - submit a prompt and wait for the answer.

use anyhow::{Context, Result, bail};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use clap::Args;
use std::path::{Path, PathBuf};
use std::time::Duration;
use taskpoll_client::{ClientConfig, TaskClient};
use tracing::{debug, info};

use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the chat command.
#[derive(Args, Default)]
pub struct ChatArgs {
    /// Prompt text. Multiple words are joined with spaces.
    #[arg(required = true)]
    pub prompt: Vec<String>,

    /// Model name (gemini, yuanbao). Defaults to the configured model.
    #[arg(long, short)]
    pub model: Option<String>,

    /// System prompt.
    #[arg(long, short)]
    pub system: Option<String>,

    /// Image to analyze, by URL.
    #[arg(long, conflicts_with = "image_file")]
    pub image_url: Option<String>,

    /// Image to analyze, read from a local file.
    #[arg(long)]
    pub image_file: Option<PathBuf>,

    /// Request deep research.
    #[arg(long)]
    pub deep_research: bool,

    /// Request image generation.
    #[arg(long)]
    pub generate_image: bool,

    /// Task priority. Defaults to the configured priority.
    #[arg(long)]
    pub priority: Option<i32>,

    /// Give up waiting after this many seconds. The remote task keeps running.
    #[arg(long)]
    pub timeout: Option<u64>,
}

/// Runs the chat command.
pub async fn run(args: &ChatArgs, cli: &Cli) -> Result<()> {
    let prompt = args.prompt.join(" ");
    if prompt.trim().is_empty() {
        bail!("Prompt must not be empty");
    }

    let client = TaskClient::new(ClientConfig::load()?)?;
    let model = args
        .model
        .clone()
        .unwrap_or_else(|| client.config().default_model.clone());

    let messages = client.messages_for(&model, args.system.as_deref().unwrap_or(""), &prompt);
    let mut request = client
        .request(messages)
        .with_deep_research(args.deep_research)
        .with_generate_image(args.generate_image);
    request.model.clone_from(&model);

    if let Some(priority) = args.priority {
        request = request.with_priority(priority);
    }
    if let Some(url) = &args.image_url {
        request = request.with_image_url(url.clone());
    }
    if let Some(path) = &args.image_file {
        request = request.with_image_data(encode_image(path).await?);
    }

    info!(model = %model, generate_image = args.generate_image, "Submitting prompt");

    let completion = match args.timeout {
        Some(secs) => {
            client
                .create_completion_with_timeout(request, Duration::from_secs(secs))
                .await?
        }
        None => client.create_completion(request).await?,
    };

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_completion(&completion, cli.verbose));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&completion)?);
        }
    }

    Ok(())
}

/// Reads an image file and base64-encodes it.
async fn encode_image(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read image {}", path.display()))?;
    if bytes.is_empty() {
        bail!("Image file {} is empty", path.display());
    }

    debug!(path = %path.display(), bytes = bytes.len(), "Encoded image");
    Ok(STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_encode_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pixel.bin");
        std::fs::write(&path, b"hello").unwrap();

        assert_eq!(encode_image(&path).await.unwrap(), "aGVsbG8=");

        std::fs::write(&path, b"").unwrap();
        assert!(encode_image(&path).await.is_err());
        assert!(encode_image(&dir.path().join("missing.png")).await.is_err());
    }
}
