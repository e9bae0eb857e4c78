// Log file discovery
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Extensions treated as log files (matched case-sensitively)
pub const LOG_EXTENSIONS: [&str; 2] = ["md", "txt"];

/// Recursively collect `.md` and `.txt` files under `root`, sorted by path.
///
/// Entries that cannot be read while walking are skipped with a warning.
pub fn find_log_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable entry while scanning {}: {}", root.display(), e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| is_log_file(path))
        .collect();

    files.sort();
    debug!(count = files.len(), root = %root.display(), "log files discovered");
    files
}

fn is_log_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| LOG_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}
