//! Output formatting for the CLI.

use colored::*;
use litminer_domain::{LogLevel, PipelineEvent};
use litminer_llm::ProviderSpec;
use litminer_pipeline::{RunReport, RunStatus};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(color_enabled: bool) -> Self {
        Self { color_enabled }
    }

    /// Format a pipeline log line.
    pub fn log_line(&self, level: LogLevel, message: &str) -> String {
        match level {
            LogLevel::Debug => self.colorize(&format!("· {}", message), "dimmed"),
            LogLevel::Info => self.info(message),
            LogLevel::Warn => self.warning(message),
            LogLevel::Error => self.error(message),
        }
    }

    /// Format a progress line.
    pub fn progress(&self, done: usize, total: usize) -> String {
        let percent = if total == 0 { 100 } else { done * 100 / total };
        self.colorize(&format!("[{:>3}%] {}/{} records", percent, done, total), "cyan")
    }

    /// Format the end-of-run report.
    pub fn report(&self, report: &RunReport) -> String {
        let summary = report.summary();
        match report.status {
            RunStatus::Completed | RunStatus::NothingToDo if report.unsaved == 0 => self.success(&summary),
            RunStatus::Failed(_) => self.error(&summary),
            _ => self.warning(&summary),
        }
    }

    /// Format the provider registry as a table.
    pub fn providers_table(&self, providers: &[ProviderSpec]) -> String {
        if providers.is_empty() {
            return self.colorize("No providers registered.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["Provider", "Aliases", "Default model", "Endpoint"]);

        for spec in providers {
            builder.push_record([
                spec.name.to_string(),
                spec.aliases.join(", "),
                spec.default_model.to_string(),
                spec.default_endpoint.to_string(),
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        table.to_string()
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            "dimmed" => text.dimmed().to_string(),
            _ => text.to_string(),
        }
    }
}

/// Turns the pipeline's event stream into terminal lines.
///
/// Progress is throttled to one line per 5% step so large runs do not
/// flood the terminal.
pub struct EventRenderer {
    formatter: Formatter,
    verbose: bool,
    last_bucket: Option<usize>,
}

impl EventRenderer {
    /// Create a renderer; debug lines are shown only when `verbose`.
    pub fn new(formatter: Formatter, verbose: bool) -> Self {
        Self {
            formatter,
            verbose,
            last_bucket: None,
        }
    }

    /// Render one event, or `None` if it should not be printed.
    pub fn render(&mut self, event: &PipelineEvent) -> Option<String> {
        match event {
            PipelineEvent::Log { level, message } => {
                if *level == LogLevel::Debug && !self.verbose {
                    return None;
                }
                Some(self.formatter.log_line(*level, message))
            }
            PipelineEvent::Progress { done, total } => {
                let bucket = if *total == 0 { 20 } else { done * 20 / total };
                if self.last_bucket == Some(bucket) && done != total {
                    return None;
                }
                self.last_bucket = Some(bucket);
                Some(self.formatter.progress(*done, *total))
            }
        }
    }

    /// The underlying formatter.
    pub fn formatter(&self) -> &Formatter {
        &self.formatter
    }
}
