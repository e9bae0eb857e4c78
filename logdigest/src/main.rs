/*
logdigest - main.rs
Command-line entry point: validates arguments, loads configuration, runs the
summary pipeline and writes the report to stdout or a file.
*/

use anyhow::{Context, Result};
use clap::Parser;
use common::{Config, Settings};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use logdigest::llm::selector::{startup_warnings, Provider};
use logdigest::pipeline::{Orchestrator, RunOptions};

const EXAMPLES: &str = "\
Examples:
  logdigest                                    # Summarize files from the last 7 days (5 bullets)
  logdigest --timeframe 2025-05                # Summarize files from May 2025
  logdigest --bullets 10                       # Generate 10 bullet points
  logdigest --output summary.md                # Save to a file
  logdigest --directory /path/logs             # Process another directory
  logdigest --ai-provider local                # Use a local Ollama server
  logdigest --ollama-model llama3.3            # Use a specific Ollama model
  logdigest --ai-provider hosted               # Force the hosted API (needs OPENAI_API_KEY)
  logdigest --custom-api-url http://localhost  # Use a custom endpoint
  logdigest --no-ai                            # Basic summarization, no network calls
  logdigest --think                            # Keep <think> sections in AI output

Timeframe formats:
  2025-05     All files from May 2025
  2025        All files from 2025
  2025-05-15  Files from a specific date
  (none)      Last 7 days (default)";

#[derive(Parser, Debug)]
#[command(
    name = "logdigest",
    about = "Generate bullet-point summaries from .md and .txt log files",
    after_help = EXAMPLES
)]
struct Args {
    /// Date range to process (e.g. "2025-05" for May 2025; default: last 7 days)
    #[arg(short, long)]
    timeframe: Option<String>,

    /// Number of bullet points to generate
    #[arg(short, long, default_value_t = 5, allow_negative_numbers = true)]
    bullets: i64,

    /// Output file path (default: print to stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Directory to search for files
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    directory: PathBuf,

    /// AI service to use
    #[arg(long, value_enum, default_value_t = Provider::Auto)]
    ai_provider: Provider,

    /// Ollama model to use (default: llama3.2)
    #[arg(long)]
    ollama_model: Option<String>,

    /// Custom API endpoint URL for AI summarization
    #[arg(long, value_name = "URL")]
    custom_api_url: Option<String>,

    /// API key for the custom endpoint (or set CUSTOM_API_KEY)
    #[arg(long)]
    custom_api_key: Option<String>,

    /// Use basic summarization instead of AI (same as --ai-provider none)
    #[arg(long)]
    no_ai: bool,

    /// Preserve <think> output in AI responses
    #[arg(long)]
    think: bool,

    /// Path to a logdigest.toml (default: ./logdigest.toml when present)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log filter (error, warn, info, debug)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Logs go to stderr so stdout carries only the report
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    if args.bullets < 1 {
        eprintln!("Error: Number of bullets must be at least 1");
        return ExitCode::FAILURE;
    }
    if !args.directory.exists() {
        eprintln!("Error: Directory '{}' does not exist", args.directory.display());
        return ExitCode::FAILURE;
    }
    if !args.directory.is_dir() {
        eprintln!("Error: '{}' is not a directory", args.directory.display());
        return ExitCode::FAILURE;
    }

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\nOperation cancelled by user.");
            ExitCode::FAILURE
        }
        result = run(args) => match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error: {:#}", e);
                ExitCode::FAILURE
            }
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let provider = if args.no_ai { Provider::None } else { args.ai_provider };

    let config = load_config(args.config.as_deref()).await?;
    let mut settings = Settings::from_env(&config)?;
    if let Some(model) = args.ollama_model {
        settings.local.model = model;
    }
    if let Some(url) = args.custom_api_url {
        settings.custom.api_url = Some(common::validate_endpoint(&url)?);
    }
    if let Some(key) = args.custom_api_key {
        settings.custom.api_key = Some(key);
    }

    if provider != Provider::None {
        for warning in startup_warnings(provider, &settings) {
            warn!("{}", warning);
        }
    }

    let orchestrator = Orchestrator::new(settings)?;
    let options = RunOptions {
        directory: args.directory,
        timeframe: args.timeframe,
        // validated >= 1 in main
        bullet_count: usize::try_from(args.bullets).context("Invalid bullet count")?,
        provider,
        preserve_thinking: args.think,
    };

    let text = orchestrator.run(&options).await?.render();

    match args.output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
            }
            tokio::fs::write(&path, text)
                .await
                .with_context(|| format!("Failed to write summary to {}", path.display()))?;
            println!("Summary saved to: {}", path.display());
        }
        None => println!("{}", text),
    }

    Ok(())
}

/// User-level defaults (`$XDG_CONFIG_HOME/logdigest/config.toml`) overridden by
/// `--config` or `./logdigest.toml`.
async fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let default_path = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
        .map(|dir| dir.join("logdigest").join("config.toml"));

    let override_path = match explicit {
        Some(p) => {
            if !p.exists() {
                anyhow::bail!("Config file not found: {}", p.display());
            }
            Some(p.to_path_buf())
        }
        None => {
            let p = PathBuf::from("logdigest.toml");
            if p.exists() {
                Some(p)
            } else {
                None
            }
        }
    };

    let config = Config::load_with_defaults(default_path.as_deref(), override_path.as_deref()).await?;
    info!(default = ?default_path, override = ?override_path, "configuration loaded");
    Ok(config)
}
