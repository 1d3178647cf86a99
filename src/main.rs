//! ai-cr - AI code reviewer
//!
//! A CLI tool that lets a chat model review the current working tree
//! through a bounded tool-calling loop.
//!
//! Exit codes:
//!   0   - Review printed
//!   1   - Runtime error (missing API key, config, transport, non-convergence)
//!   130 - Cancelled with Ctrl-C

mod agent;
mod analysis;
mod cli;
mod config;
mod models;
mod repo;
mod report;
mod scanner;

use agent::{
    AgentConfig, ChatClient, ClientConfig, ReviewAgent, ReviewError, ReviewProgress, ToolExecutor,
};
use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, Command};
use config::Config;
use indicatif::{ProgressBar, ProgressStyle};
use models::{ReportMetadata, ReviewReport};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const EXIT_CANCELLED: i32 = 130;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle init-config early (no logging needed)
    if args.command == Command::InitConfig {
        return handle_init_config();
    }

    // Config is loaded before logging so `[general] verbose` can raise the level.
    let (mut config, config_notice) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);
    if let Err(e) = config.validate() {
        eprintln!("Error: invalid configuration: {:#}", e);
        std::process::exit(1);
    }

    init_logging(&args, &config)?;

    info!("ai-cr v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    if let Some(notice) = config_notice {
        warn!("{}", notice);
    }

    match run_review(args, config).await {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            error!("Review failed: {:#}", e);
            eprintln!("\nError: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle init-config: generate a default .aicr.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(config::DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "{} already exists. Remove it first or edit it manually.",
            config::DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", config::DEFAULT_CONFIG_FILE))?;

    println!("Created {} with default settings.", config::DEFAULT_CONFIG_FILE);
    println!("Set {} before running a review.", config::API_KEY_ENV);
    Ok(())
}

/// Initialize logging on stderr so stdout carries only the review.
fn init_logging(args: &Args, config: &Config) -> Result<()> {
    let level = if !args.quiet && config.general.verbose {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Load configuration from file or use defaults.
///
/// An explicit `--config` path must load. A broken implicit file falls back
/// to defaults and returns a notice to log once logging is up.
fn load_config(args: &Args) -> Result<(Config, Option<String>)> {
    if let Some(ref config_path) = args.config {
        return Ok((Config::load(config_path)?, None));
    }

    match Config::load_default() {
        Ok(Some(config)) => Ok((config, None)),
        Ok(None) => Ok((Config::default(), None)),
        Err(e) => Ok((
            Config::default(),
            Some(format!("Ignoring config file, using defaults: {:#}", e)),
        )),
    }
}

/// Run one review and print it. Returns the process exit code.
async fn run_review(args: Args, config: Config) -> Result<i32> {
    let start_time = Instant::now();

    let request = args
        .review_request()
        .context("This command does not send a review request")?;

    let api_key = config::api_key_from_env()?;

    let client = ChatClient::new(ClientConfig {
        api_url: config.model.api_url.clone(),
        model_name: config.model.name.clone(),
        api_key,
        timeout_seconds: config.model.timeout_seconds,
        temperature: config.model.temperature,
    })?;

    let work_dir = std::env::current_dir().context("Failed to resolve working directory")?;
    info!("Reviewing in: {}", work_dir.display());
    let executor = ToolExecutor::new(work_dir, &config.tools);

    let mut agent = ReviewAgent::new(
        Arc::new(client),
        executor,
        AgentConfig {
            max_rounds: config.model.max_rounds,
            ..AgentConfig::default()
        },
    );

    let spinner = (!args.quiet).then(create_spinner);
    if let Some(ref pb) = spinner {
        let pb = pb.clone();
        agent = agent.with_observer(Arc::new(move |event: ReviewProgress| match event {
            ReviewProgress::ModelCall { round } => {
                pb.set_message(format!("Round {}: waiting for the model...", round))
            }
            ReviewProgress::ToolCall { round, name } => {
                pb.set_message(format!("Round {}: running {}", round, name))
            }
        }));
    }

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });

    info!("Request: {}", request);
    let result = agent.review(&request, &cancel).await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(ReviewError::Cancelled) => {
            eprintln!("Review cancelled.");
            return Ok(EXIT_CANCELLED);
        }
        Err(e) => return Err(e.into()),
    };

    println!("{}", outcome.review);

    if let Some(ref path) = args.output {
        let report = ReviewReport {
            metadata: ReportMetadata {
                request,
                model_used: agent.model_name().to_string(),
                review_date: Utc::now(),
                rounds: outcome.rounds,
                tool_calls: outcome.tool_calls,
                finish_reason: outcome.finish_reason.clone(),
                duration_seconds: start_time.elapsed().as_secs_f64(),
            },
            review: outcome.review,
        };

        report::write_report(&report, args.format, path)?;
        eprintln!("Report saved to: {}", path.display());
    }

    info!(
        "Done in {:.1}s ({} rounds, {} tool calls)",
        start_time.elapsed().as_secs_f64(),
        outcome.rounds,
        outcome.tool_calls
    );

    Ok(0)
}

fn create_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let template = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed}] {msg}");
    if let Ok(style) = template {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}
