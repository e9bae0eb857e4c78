use chrono::NaiveDateTime;

/// Final markdown report for one run
#[derive(Debug, Clone)]
pub struct Report {
    pub generated_at: NaiveDateTime,
    /// Timeframe as the user gave it, or the default window description
    pub timeframe: String,
    pub files: Vec<String>,
    pub bullet_count: usize,
    pub summary: String,
}

impl Report {
    /// Format report as markdown
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str("# Log Summary\n\n");
        output.push_str(&format!(
            "**Generated:** {}\n",
            self.generated_at.format("%Y-%m-%d %H:%M:%S")
        ));
        output.push_str(&format!("**Timeframe:** {}\n", self.timeframe));
        output.push_str(&format!("**Files processed:** {}\n", self.files.len()));
        output.push_str(&format!("**Files:** {}\n\n", self.files.join(", ")));
        output.push_str(&format!("## Summary ({} key points)\n\n", self.bullet_count));
        output.push_str(&self.summary);

        output
    }
}
