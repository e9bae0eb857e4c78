// End-to-end run: discover, date, filter, aggregate, summarize, report
use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use common::Settings;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::aggregate::{aggregate, LogFile};
use crate::dates;
use crate::discovery::find_log_files;
use crate::llm::selector::{self, Provider, Selection, SelectionInputs};
use crate::llm::summarizer::summarize_with_fallback;
use crate::llm::{
    ollama, Backend, BasicBackend, CustomEndpointBackend, HostedBackend, LocalServerBackend, SummaryRequest,
};
use crate::report::Report;
use crate::timeframe::Timeframe;

/// Per-run options taken from the command line
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub directory: PathBuf,
    pub timeframe: Option<String>,
    pub bullet_count: usize,
    pub provider: Provider,
    pub preserve_thinking: bool,
}

impl RunOptions {
    pub fn use_ai(&self) -> bool {
        self.provider != Provider::None
    }

    fn timeframe_raw(&self) -> Option<&str> {
        self.timeframe.as_deref().filter(|t| !t.is_empty())
    }
}

/// What a run produced. Every variant renders to the text shown to the user.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// The directory holds no `.md`/`.txt` files
    NoLogFiles,
    /// Files exist, none fall inside the timeframe
    NoFilesInTimeframe { timeframe: String },
    /// Files matched but none had readable, non-blank content
    NoContent,
    Report(Report),
}

impl RunOutcome {
    pub fn render(&self) -> String {
        match self {
            RunOutcome::NoLogFiles => "No .md or .txt files found in the directory.".to_string(),
            RunOutcome::NoFilesInTimeframe { timeframe } => format!("No files found for timeframe: {}", timeframe),
            RunOutcome::NoContent => "No content found in the selected files.".to_string(),
            RunOutcome::Report(report) => report.to_markdown(),
        }
    }
}

/// Wires the pipeline stages together around an explicit [`Settings`] value.
pub struct Orchestrator {
    settings: Settings,
    client: reqwest::Client,
}

impl Orchestrator {
    pub fn new(settings: Settings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("logdigest/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { settings, client })
    }

    pub async fn run(&self, options: &RunOptions) -> Result<RunOutcome> {
        self.run_at(options, Local::now().naive_local()).await
    }

    /// Run with an explicit notion of "now" (used for the default window and the report stamp).
    pub async fn run_at(&self, options: &RunOptions, now: NaiveDateTime) -> Result<RunOutcome> {
        if options.bullet_count < 1 {
            anyhow::bail!("Number of bullets must be at least 1");
        }

        let paths = find_log_files(&options.directory);
        if paths.is_empty() {
            return Ok(RunOutcome::NoLogFiles);
        }

        let dated: Vec<(LogFile, NaiveDateTime)> = paths
            .into_iter()
            .filter_map(|path| {
                let date = dates::resolve(&path, now);
                if date.is_none() {
                    debug!(path = %path.display(), "no date for file, skipping");
                }
                date.map(|d| (LogFile::new(path), d))
            })
            .collect();

        let window_days = self.settings.window_days;
        let timeframe = Timeframe::parse(options.timeframe_raw(), window_days, now);
        let selected = timeframe.filter(dated, now);
        info!(timeframe = %timeframe, files = selected.len(), "files selected");

        if selected.is_empty() {
            let description = options
                .timeframe_raw()
                .map(str::to_string)
                .unwrap_or_else(|| format!("the last {} days", window_days));
            return Ok(RunOutcome::NoFilesInTimeframe { timeframe: description });
        }

        let aggregated = aggregate(&selected).await;
        if aggregated.is_empty() {
            return Ok(RunOutcome::NoContent);
        }

        let request = SummaryRequest::new(aggregated.text, options.bullet_count, options.preserve_thinking)?;
        let backend = self.choose_backend(options).await;
        let summary = summarize_with_fallback(&backend, &request).await;
        info!(backend = %summary.backend, "summary generated");

        Ok(RunOutcome::Report(Report {
            generated_at: now,
            timeframe: options
                .timeframe_raw()
                .map(str::to_string)
                .unwrap_or_else(|| format!("Last {} days", window_days)),
            files: aggregated.files,
            bullet_count: options.bullet_count,
            summary: summary.text,
        }))
    }

    /// Gather availability, apply the selection table and build the backend.
    pub async fn choose_backend(&self, options: &RunOptions) -> Backend {
        let custom_url = self.settings.custom.api_url.as_deref();
        let hosted_available = self.settings.hosted.api_key.is_some();
        let local_available =
            if selector::needs_local_probe(options.use_ai(), options.provider, custom_url.is_some(), hosted_available) {
                ollama::is_reachable(&self.client, &self.settings.local.host, self.settings.local.probe_timeout).await
            } else {
                false
            };

        let selection = selector::select(SelectionInputs {
            use_ai: options.use_ai(),
            provider: options.provider,
            custom_url: custom_url.is_some(),
            hosted_available,
            local_available,
        });
        if let Some(warning) = selection.warning() {
            warn!("{}", warning);
        }
        info!(?selection, backend = %selection.backend_kind(), "summary backend selected");

        self.build_backend(selection)
    }

    fn build_backend(&self, selection: Selection) -> Backend {
        let client = self.client.clone();
        match (selection, self.settings.custom.api_url.as_deref()) {
            (Selection::Hosted | Selection::AutoHosted, _) => {
                Backend::Hosted(HostedBackend::new(&self.settings.hosted, client))
            }
            (Selection::LocalServer | Selection::AutoLocal, _) => {
                Backend::LocalServer(LocalServerBackend::new(&self.settings.local, client))
            }
            (Selection::CustomEndpoint, Some(url)) => {
                Backend::CustomEndpoint(CustomEndpointBackend::new(url, &self.settings.custom, client))
            }
            (Selection::CustomEndpoint, None) | (Selection::Disabled | Selection::Unavailable(_), _) => {
                Backend::Basic(BasicBackend)
            }
        }
    }
}
