//! Recursive marker-stream stripper.
//!
//! Pipeline per call: resolve path once -> classify -> (file) strip, or
//! (directory) list children -> recurse into subdirectories / strip files.
//!
//! Every failure is caught at the smallest scope that produced it (one file or
//! one directory listing), reported, recorded in the [`StripReport`], and the
//! traversal moves on. [`Stripper::process`] itself never fails.

use std::io;
use std::path::Path;
use std::time::Instant;

use crate::core::errors::ZsError;
use crate::core::paths::resolve_absolute_path;
use crate::logger::jsonl::{EventType, JsonlWriter, LogEntry};
use crate::platform::pal::{FileAttributes, MarkerFs, PathKind};
use crate::strip::display::display_path;
use crate::strip::governor::Governor;
use crate::strip::report::{StripIssue, StripReport};
use crate::strip::reporter::{Level, Reporter};

/// Action name handed to the governor for every marker removal.
pub const STRIP_ACTION: &str = "strip marker stream";

/// Per-run switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StripOptions {
    /// Temporarily clear the read-only attribute so the marker can be deleted.
    pub force: bool,
    /// Process only the immediate children of a directory.
    pub no_recurse: bool,
    /// Do not report individual successes.
    pub suppress_success: bool,
}

/// Walks a path and removes `Zone.Identifier` marker streams.
pub struct Stripper<'a> {
    fs: &'a dyn MarkerFs,
    governor: &'a mut dyn Governor,
    reporter: &'a mut dyn Reporter,
    activity: Option<&'a mut JsonlWriter>,
}

impl<'a> Stripper<'a> {
    pub fn new(
        fs: &'a dyn MarkerFs,
        governor: &'a mut dyn Governor,
        reporter: &'a mut dyn Reporter,
    ) -> Self {
        Self {
            fs,
            governor,
            reporter,
            activity: None,
        }
    }

    /// Also record every outcome in a JSONL activity log.
    #[must_use]
    pub fn with_activity_log(mut self, log: &'a mut JsonlWriter) -> Self {
        self.activity = Some(log);
        self
    }

    /// Strip markers under `path`, resolving it against the working directory.
    pub fn process(&mut self, path: impl AsRef<Path>, options: &StripOptions) -> StripReport {
        let start = Instant::now();
        let resolved = resolve_absolute_path(path.as_ref());
        let mut report = StripReport {
            dry_run: self.governor.is_dry_run(),
            ..StripReport::default()
        };

        self.log(LogEntry::new(EventType::RunStart).with_path(&resolved));
        self.visit(&resolved, options, &mut report);

        report.duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.log(
            LogEntry::new(EventType::RunComplete)
                .with_path(&resolved)
                .with_details(report.summary_line()),
        );
        report
    }

    /// Traverse an already-resolved path.
    fn visit(&mut self, path: &Path, options: &StripOptions, report: &mut StripReport) {
        match self.fs.classify(path) {
            PathKind::File => {
                self.strip_file(path, options, report);
                return;
            }
            PathKind::Directory => {}
            PathKind::Missing => {
                let err = ZsError::NotFound {
                    path: path.to_path_buf(),
                };
                report.not_found += 1;
                self.reporter.report(
                    Level::Error,
                    &format!("Path not found: {}", display_path(path)),
                );
                self.record(report, Level::Error, &err, path, EventType::PathNotFound);
                return;
            }
        }

        let shown = display_path(path);
        let children = match self.fs.list_dir(path) {
            Ok(children) => children,
            Err(source) => {
                let err = ZsError::Enumeration {
                    path: path.to_path_buf(),
                    source,
                };
                report.enumeration_failures += 1;
                self.reporter.report(
                    Level::Warning,
                    &format!("Cannot list directory {shown}: {}", err.detail()),
                );
                self.record(report, Level::Warning, &err, path, EventType::EnumerationFailed);
                return;
            }
        };

        report.dirs_visited += 1;
        self.reporter
            .report(Level::Verbose, &format!("Entering directory {shown}"));

        for child in children {
            if child.is_dir {
                if !options.no_recurse {
                    // Nested levels always run with the default (recursive) behavior.
                    let nested = StripOptions {
                        no_recurse: false,
                        ..*options
                    };
                    self.visit(&child.path, &nested, report);
                }
            } else {
                self.strip_file(&child.path, options, report);
            }
        }

        self.reporter
            .report(Level::Verbose, &format!("Leaving directory {shown}"));
    }

    fn strip_file(&mut self, file: &Path, options: &StripOptions, report: &mut StripReport) {
        report.files_seen += 1;
        if !self.fs.has_marker(file) {
            return;
        }
        report.markers_found += 1;

        let shown = display_path(file);
        if !self.governor.confirm(STRIP_ACTION, &shown) {
            report.declined += 1;
            self.log(LogEntry::new(EventType::StripDeclined).with_path(file));
            return;
        }

        match self.strip_confirmed(file, &shown, options.force, report) {
            Ok(()) => {
                report.stripped += 1;
                if !options.suppress_success {
                    self.reporter.report(
                        Level::Success,
                        &format!("Stripped Zone.Identifier from {shown}"),
                    );
                }
                self.log(LogEntry::new(EventType::MarkerStripped).with_path(file));
            }
            Err(err) => {
                report.failed += 1;
                self.reporter.report(
                    Level::Error,
                    &format!(
                        "Failed to strip Zone.Identifier from {shown}: {}",
                        err.detail()
                    ),
                );
                self.record(report, Level::Error, &err, file, EventType::StripFailed);
            }
        }
    }

    /// Delete the marker of an approved file, clearing read-only if forced.
    ///
    /// The deletion outcome is returned; a failed attribute restoration is
    /// reported here as a warning and never turns a success into a failure.
    fn strip_confirmed(
        &mut self,
        file: &Path,
        shown: &str,
        force: bool,
        report: &mut StripReport,
    ) -> Result<(), ZsError> {
        let fs = self.fs;
        let strip_err = |source: io::Error| ZsError::Strip {
            path: file.to_path_buf(),
            source,
        };

        let original = fs.attributes(file).map_err(strip_err)?;
        let guard = if force && original.readonly {
            self.reporter.report(
                Level::Verbose,
                &format!("Temporarily clearing read-only attribute on {shown}"),
            );
            fs.clear_readonly(file).map_err(strip_err)?;
            Some(AttributeGuard::arm(fs, file, original))
        } else {
            None
        };

        self.reporter.report(
            Level::Verbose,
            &format!("Stripping Zone.Identifier from {shown}"),
        );
        let outcome = fs.remove_marker(file).map_err(strip_err);

        if let Some(guard) = guard {
            self.reporter.report(
                Level::Verbose,
                &format!("Reverting attributes of {shown} to {original}"),
            );
            if let Err(source) = guard.restore() {
                let err = ZsError::AttributeRestore {
                    path: file.to_path_buf(),
                    expected: original.to_string(),
                    source,
                };
                report.restore_failures += 1;
                self.reporter.report(
                    Level::Warning,
                    &format!(
                        "Failed to restore attributes {original} on {shown}: {}",
                        err.detail()
                    ),
                );
                self.record(report, Level::Warning, &err, file, EventType::RestoreFailed);
            }
        }

        outcome
    }

    fn record(
        &mut self,
        report: &mut StripReport,
        level: Level,
        err: &ZsError,
        path: &Path,
        event: EventType,
    ) {
        self.log(
            LogEntry::new(event)
                .with_path(path)
                .with_error(err.code(), err.detail()),
        );
        report
            .issues
            .push(StripIssue::from_error(level, err, path.to_path_buf()));
    }

    fn log(&mut self, entry: LogEntry) {
        if let Some(activity) = self.activity.as_deref_mut() {
            activity.write_entry(&entry);
        }
    }
}

/// Restores a file's recorded attributes when it goes out of scope.
///
/// [`AttributeGuard::restore`] is the normal path and hands the outcome back to
/// the caller. If the guard is dropped without it (a panic unwinding through the
/// deletion), `Drop` restores on its own and prints any failure to stderr.
pub struct AttributeGuard<'a> {
    fs: &'a dyn MarkerFs,
    file: &'a Path,
    original: FileAttributes,
    armed: bool,
}

impl<'a> AttributeGuard<'a> {
    pub fn arm(fs: &'a dyn MarkerFs, file: &'a Path, original: FileAttributes) -> Self {
        Self {
            fs,
            file,
            original,
            armed: true,
        }
    }

    /// Restore now and disarm.
    pub fn restore(mut self) -> io::Result<()> {
        self.armed = false;
        self.fs.restore_attributes(self.file, &self.original)
    }
}

impl Drop for AttributeGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        // Still armed only while unwinding: the reporter and report belong to
        // the frame being torn down, so stderr is the one sink left.
        if let Err(e) = self.fs.restore_attributes(self.file, &self.original) {
            eprintln!(
                "WARNING: Failed to restore attributes {} on {}: {e}",
                self.original,
                display_path(self.file)
            );
        }
    }
}
