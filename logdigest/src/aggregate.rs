// Content aggregation for selected log files
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A discovered log file. Content is read lazily by [`aggregate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFile {
    pub path: PathBuf,
    pub name: String,
}

impl LogFile {
    pub fn new(path: PathBuf) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { path, name }
    }
}

/// Combined text of every retained file plus the names that contributed.
#[derive(Debug, Clone, Default)]
pub struct Aggregated {
    pub text: String,
    pub files: Vec<String>,
}

impl Aggregated {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Read and concatenate the selected files.
///
/// Unreadable or non-UTF-8 files are skipped with a warning, as are files
/// whose content is only whitespace. Each retained file becomes a section
/// headed `=== <name> (<YYYY-MM-DD>) ===`; sections are separated by a blank line.
pub async fn aggregate(entries: &[(LogFile, NaiveDateTime)]) -> Aggregated {
    let mut sections = Vec::with_capacity(entries.len());
    let mut files = Vec::with_capacity(entries.len());

    for (file, date) in entries {
        let Some(content) = read_log(&file.path).await else {
            continue;
        };
        if content.trim().is_empty() {
            debug!(file = %file.name, "skipping empty log file");
            continue;
        }
        sections.push(format!("=== {} ({}) ===\n{}", file.name, date.format("%Y-%m-%d"), content));
        files.push(file.name.clone());
    }

    Aggregated {
        text: sections.join("\n\n"),
        files,
    }
}

async fn read_log(path: &Path) -> Option<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Some(content),
        Err(e) => {
            warn!("Could not read {}: {}", path.display(), e);
            None
        }
    }
}
