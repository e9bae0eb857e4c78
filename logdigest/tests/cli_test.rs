use std::fs;
use std::path::Path;
use std::process::{Command, Output};

/// Run the binary isolated from the caller's config and API keys.
fn logdigest(workdir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_logdigest"))
        .args(args)
        .current_dir(workdir)
        .env("HOME", workdir)
        .env("XDG_CONFIG_HOME", workdir.join(".config"))
        .env_remove("OPENAI_API_KEY")
        .env_remove("CUSTOM_API_KEY")
        .env_remove("OLLAMA_HOST")
        .output()
        .expect("run logdigest")
}

fn notes_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    let lines: Vec<String> = (1..=15)
        .map(|i| format!("Meeting item {:02}: follow up with the team", i))
        .collect();
    fs::write(dir.path().join("2025-05-01-notes.md"), lines.join("\n")).expect("write notes");
    fs::write(dir.path().join("irrelevant.txt"), "undated filler content").expect("write filler");
    dir
}

#[test]
fn zero_bullets_fails_before_looking_at_the_directory() {
    let work = tempfile::tempdir().expect("tempdir");
    let out = logdigest(work.path(), &["--bullets", "0", "--directory", "/definitely/not/here"]);

    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Number of bullets must be at least 1"));
    assert!(!stderr.contains("does not exist"));
    assert!(out.stdout.is_empty());
}

#[test]
fn negative_bullets_are_rejected() {
    let work = tempfile::tempdir().expect("tempdir");
    let out = logdigest(work.path(), &["-b", "-2"]);
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn missing_or_non_directory_fails() {
    let work = tempfile::tempdir().expect("tempdir");
    let out = logdigest(work.path(), &["--directory", "missing-dir"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("does not exist"));

    fs::write(work.path().join("file.md"), "x").expect("write");
    let out = logdigest(work.path(), &["--directory", "file.md"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("is not a directory"));
}

#[test]
fn month_report_on_stdout() {
    let dir = notes_dir();
    let out = logdigest(
        dir.path(),
        &["--timeframe", "2025-05", "--bullets", "3", "--no-ai", "--directory", "."],
    );

    assert_eq!(out.status.code(), Some(0), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.starts_with("# Log Summary\n"));
    assert!(stdout.contains("**Files processed:** 1\n"));
    assert!(stdout.contains("**Files:** 2025-05-01-notes.md\n"));
    assert!(!stdout.contains("irrelevant.txt"));
    assert!(stdout.contains("## Summary (3 key points)"));
    assert_eq!(stdout.lines().filter(|l| l.starts_with("• ")).count(), 3);
}

#[test]
fn report_written_to_nested_output_file() {
    let dir = notes_dir();
    let out = logdigest(
        dir.path(),
        &["-t", "2025-05", "-b", "2", "--no-ai", "-o", "reports/may/summary.md"],
    );

    assert_eq!(out.status.code(), Some(0), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    assert!(String::from_utf8_lossy(&out.stdout).contains("Summary saved to: reports/may/summary.md"));

    let written = fs::read_to_string(dir.path().join("reports/may/summary.md")).expect("report file");
    assert!(written.contains("## Summary (2 key points)"));
    assert_eq!(written.lines().filter(|l| l.starts_with("• ")).count(), 2);
}

#[test]
fn bad_custom_url_is_an_error() {
    let dir = notes_dir();
    let out = logdigest(dir.path(), &["--custom-api-url", "not a url", "-t", "2025"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("Invalid endpoint URL"));
}
