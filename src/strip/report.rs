//! Aggregate outcome of a strip run.

use std::path::PathBuf;

use serde::Serialize;

use crate::core::errors::ZsError;
use crate::strip::reporter::Level;

/// A per-entry problem recorded during traversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StripIssue {
    pub path: PathBuf,
    pub level: Level,
    pub code: String,
    pub message: String,
}

impl StripIssue {
    pub(crate) fn from_error(level: Level, err: &ZsError, path: PathBuf) -> Self {
        Self {
            path,
            level,
            code: err.code().to_string(),
            message: err.detail(),
        }
    }
}

/// Counters and issues for one or more processed paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StripReport {
    /// Files inspected for a marker stream.
    pub files_seen: usize,
    /// Files that carried a marker stream.
    pub markers_found: usize,
    pub stripped: usize,
    /// Vetoed by the governor (including dry-run previews).
    pub declined: usize,
    pub failed: usize,
    pub restore_failures: usize,
    pub dirs_visited: usize,
    pub enumeration_failures: usize,
    pub not_found: usize,
    pub dry_run: bool,
    pub duration_ms: u64,
    pub issues: Vec<StripIssue>,
}

impl StripReport {
    /// Fold another report into this one.
    pub fn merge(&mut self, other: Self) {
        self.files_seen += other.files_seen;
        self.markers_found += other.markers_found;
        self.stripped += other.stripped;
        self.declined += other.declined;
        self.failed += other.failed;
        self.restore_failures += other.restore_failures;
        self.dirs_visited += other.dirs_visited;
        self.enumeration_failures += other.enumeration_failures;
        self.not_found += other.not_found;
        self.dry_run |= other.dry_run;
        self.duration_ms += other.duration_ms;
        self.issues.extend(other.issues);
    }

    /// Whether any error-level issue (strip failure or missing path) occurred.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.failed > 0 || self.not_found > 0
    }

    /// One-line human summary.
    #[must_use]
    pub fn summary_line(&self) -> String {
        let verb = if self.dry_run { "would strip" } else { "stripped" };
        let mut line = format!(
            "{} file(s) scanned in {} dir(s): {} marker(s) found, {} {verb}",
            self.files_seen, self.dirs_visited, self.markers_found, self.stripped
        );
        if self.declined > 0 {
            let what = if self.dry_run { "previewed" } else { "declined" };
            line.push_str(&format!(", {} {what}", self.declined));
        }
        if self.failed > 0 {
            line.push_str(&format!(", {} failed", self.failed));
        }
        let warnings = self.restore_failures + self.enumeration_failures;
        if warnings > 0 {
            line.push_str(&format!(", {warnings} warning(s)"));
        }
        if self.not_found > 0 {
            line.push_str(&format!(", {} path(s) not found", self.not_found));
        }
        line
    }
}
