//! Text output formatting with colors.

use taskpoll_client::{BatchEntry, ClientConfig, TaskRecord};
use taskpoll_core::{Completion, PollStatus};

use super::mask_token;

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    /// Formats a completion. The answer comes first so it can be piped.
    pub fn format_completion(&self, completion: &Completion, verbose: bool) -> String {
        if !verbose {
            return completion.content.clone();
        }

        let footer = format!(
            "[task {} | {} | {}]",
            completion.id,
            completion.model,
            completion.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        format!("{}\n\n{}", completion.content, self.dim(&footer))
    }

    /// Formats a single task lookup.
    pub fn format_record(&self, record: &TaskRecord, verbose: bool) -> String {
        let mut lines = vec![format!(
            "{} {}",
            self.bold(&format!("Task {}:", record.task_id)),
            self.status(record.outcome.status)
        )];

        if !record.outcome.raw_message.is_empty() {
            lines.push(format!("  Message: {}", record.outcome.raw_message));
        }
        if let Some(answer) = &record.outcome.answer {
            lines.push(format!("  Answer:  {answer}"));
        }
        if verbose {
            lines.push(self.dim(&format!(
                "  Schema:  {:?} (code {}, status {:?})",
                record.snapshot.schema, record.snapshot.code, record.snapshot.status_text
            )));
        }

        lines.join("\n")
    }

    /// Formats batch lookup results, one line per task.
    pub fn format_batch(&self, entries: &[BatchEntry]) -> String {
        let width = entries
            .iter()
            .map(|e| e.task_id.chars().count())
            .max()
            .unwrap_or(0);

        entries
            .iter()
            .map(|entry| match &entry.result {
                Ok(record) => format!(
                    "{:<width$}  {}  {}",
                    entry.task_id,
                    self.status(record.outcome.status),
                    record.outcome.raw_message
                ),
                Err(e) => format!("{:<width$}  {}  {e}", entry.task_id, self.red("error")),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Formats the effective configuration.
    pub fn format_config(&self, config: &ClientConfig) -> String {
        let lines = [
            self.bold("taskpoll Configuration"),
            "─".repeat(40),
            format!("API token:          {}", mask_token(&config.api_token)),
            format!("Base URL:           {}", config.base_url),
            format!("Timeout:            {}s", config.timeout.as_secs()),
            format!("Default model:      {}", config.default_model),
            format!("Auto system prompt: {}", config.auto_system_prompt),
            format!("Priority:           {}", config.priority),
            format!("Rate-limit retry:   {}", config.retry.enable_rate_limit_retry),
            format!("Max retries:        {}", config.retry.max_outer_attempts),
            format!("Retry base delay:   {}s", config.retry.base_delay.as_secs_f64()),
        ];
        lines.join("\n")
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn status(&self, status: PollStatus) -> String {
        let label = status.label();
        match status {
            PollStatus::Completed => self.green(label),
            PollStatus::Pending | PollStatus::Unknown => self.yellow(label),
            PollStatus::Failed(_) => self.red(label),
        }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.use_colors {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    fn green(&self, text: &str) -> String {
        self.paint(GREEN, text)
    }

    fn yellow(&self, text: &str) -> String {
        self.paint(YELLOW, text)
    }

    fn red(&self, text: &str) -> String {
        self.paint(RED, text)
    }
}
