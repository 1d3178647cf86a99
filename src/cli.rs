//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and the review request each command sends.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// ai-cr - AI code reviewer for your working tree
///
/// Asks a chat model to review code. The model explores the current
/// directory with read-only tools (file reads, search, git diff, linters)
/// and answers with a review.
///
/// Examples:
///   ai-cr review src/main.rs
///   ai-cr diff
///   ai-cr diff --target main
///   ai-cr ask "Are there any SQL injection risks in this project?"
///   ai-cr init-config
#[derive(Parser, Debug, Clone)]
#[command(name = "ai-cr", author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Chat model to use
    ///
    /// Can also be set via AICR_MODEL env var or .aicr.toml config.
    #[arg(short, long, global = true, env = "AICR_MODEL")]
    pub model: Option<String>,

    /// Chat-completions endpoint URL
    #[arg(long, global = true, value_name = "URL", env = "AICR_API_URL")]
    pub api_url: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .aicr.toml in the current directory
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Also write the review as a report to this file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Report format for --output (markdown, json)
    #[arg(long, global = true, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Request timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Maximum model calls for one review
    #[arg(long, global = true, value_name = "COUNT")]
    pub max_rounds: Option<usize>,

    /// Sampling temperature (0.0 - 2.0)
    #[arg(long, global = true)]
    pub temperature: Option<f32>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Review a single file
    Review {
        /// File to review, relative to the current directory
        file: String,
    },

    /// Review uncommitted changes from `git diff`
    Diff {
        /// Revision to diff against
        #[arg(long, default_value = "HEAD")]
        target: String,
    },

    /// Send a free-form review request
    Ask {
        /// Request text
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Generate a default .aicr.toml configuration file
    InitConfig,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The request text sent to the model, or `None` for commands that
    /// don't run a review.
    pub fn review_request(&self) -> Option<String> {
        match &self.command {
            Command::Review { file } => Some(format!("Please review the file: {}", file)),
            Command::Diff { target } if target == "HEAD" => {
                Some("Please review the current git diff changes".to_string())
            }
            Command::Diff { target } => Some(format!(
                "Please review the current git diff changes against {}",
                target
            )),
            Command::Ask { text } => Some(text.join(" ")),
            Command::InitConfig => None,
        }
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        match &self.command {
            Command::Review { file } if file.trim().is_empty() => {
                return Err("File path must not be empty".to_string());
            }
            Command::Ask { text } if text.iter().all(|t| t.trim().is_empty()) => {
                return Err("Request text must not be empty".to_string());
            }
            _ => {}
        }

        if let Some(ref url) = self.api_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(temperature) = self.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err("Temperature must be between 0.0 and 2.0".to_string());
            }
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        if self.max_rounds == Some(0) {
            return Err("Max rounds must be at least 1".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
