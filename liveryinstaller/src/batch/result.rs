//! Per-item results and the end-of-batch report.

use std::fmt;

/// Failures listed in the summary.
pub const SUMMARY_FAILURE_LIMIT: usize = 5;

/// Maximum length of a failure detail in the summary.
pub const SUMMARY_DETAIL_WIDTH: usize = 120;

/// Outcome of one leaf livery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemResult {
    /// Human-readable identifier (archive name, plus child name for packs).
    pub item: String,
    pub success: bool,
    pub detail: String,
}

impl ItemResult {
    pub fn success(item: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            success: true,
            detail: detail.into(),
        }
    }

    pub fn failure(item: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            success: false,
            detail: detail.into(),
        }
    }
}

/// Why package post-processing did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// At least one archive recorded a failure.
    PartialFailure { failed_archives: usize },
    /// Nothing was installed.
    NothingInstalled,
}

/// Outcome of layout and descriptor regeneration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostProcessing {
    /// Both files were regenerated.
    Completed {
        files: usize,
        total_package_size: u64,
    },
    /// Regeneration was not attempted.
    Skipped(SkipReason),
    /// Regeneration was attempted and failed.
    Failed(String),
}

impl fmt::Display for PostProcessing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed {
                files,
                total_package_size,
            } => write!(
                f,
                "layout.json and manifest.json updated ({} files, {} bytes)",
                files, total_package_size
            ),
            Self::Skipped(SkipReason::PartialFailure { failed_archives }) => write!(
                f,
                "layout.json and manifest.json NOT updated: {} archive(s) had failures; \
                 installed liveries may not appear until a clean batch completes",
                failed_archives
            ),
            Self::Skipped(SkipReason::NothingInstalled) => {
                write!(f, "nothing installed; layout.json and manifest.json unchanged")
            }
            Self::Failed(reason) => write!(f, "package bookkeeping failed: {}", reason),
        }
    }
}

/// Everything a batch did, in processing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub items: Vec<ItemResult>,
    /// Top-level archives processed.
    pub archives: usize,
    /// Top-level archives with at least one failure.
    pub failed_archives: usize,
    pub post_processing: PostProcessing,
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let cut: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{}...", cut)
}

impl BatchReport {
    pub fn successes(&self) -> usize {
        self.items.iter().filter(|i| i.success).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ItemResult> {
        self.items.iter().filter(|i| !i.success)
    }

    /// Whether every item succeeded and the package files were regenerated.
    pub fn is_clean(&self) -> bool {
        self.failed_archives == 0
            && self.failures().next().is_none()
            && matches!(self.post_processing, PostProcessing::Completed { .. })
    }

    /// Lines of the end-of-batch summary.
    pub fn summary_lines(&self) -> Vec<String> {
        let failures: Vec<&ItemResult> = self.failures().collect();
        let mut lines = vec![
            format!(
                "{} of {} liveries installed from {} archive(s)",
                self.successes(),
                self.items.len(),
                self.archives
            ),
            format!("{} failed", failures.len()),
            self.post_processing.to_string(),
        ];

        if !failures.is_empty() {
            lines.push("First failures:".to_string());
            for failure in failures.iter().take(SUMMARY_FAILURE_LIMIT) {
                let line = format!("{}: {}", failure.item, failure.detail);
                lines.push(format!("  - {}", truncate(&line, SUMMARY_DETAIL_WIDTH)));
            }
            if failures.len() > SUMMARY_FAILURE_LIMIT {
                lines.push(format!(
                    "  ... and {} more (see the log)",
                    failures.len() - SUMMARY_FAILURE_LIMIT
                ));
            }
        }
        lines
    }
}
