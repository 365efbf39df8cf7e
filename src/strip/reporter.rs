//! Leveled output capability used by the stripper.

use serde::Serialize;

/// Output level of a stripper message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// A marker stream was removed.
    Success,
    /// Step-by-step diagnostics, shown only on request.
    Verbose,
    /// Non-fatal problem; the traversal continues.
    Warning,
    /// A file or path could not be processed.
    Error,
}

/// Sink for stripper messages.
pub trait Reporter {
    fn report(&mut self, level: Level, message: &str);
}

/// One buffered message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub level: Level,
    pub message: String,
}

/// Reporter that keeps every message in memory.
#[derive(Debug, Default, Clone)]
pub struct CollectingReporter {
    pub records: Vec<Record>,
}

impl CollectingReporter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of messages at `level`.
    #[must_use]
    pub fn count(&self, level: Level) -> usize {
        self.records.iter().filter(|r| r.level == level).count()
    }

    /// Messages at `level`, in emission order.
    #[must_use]
    pub fn messages(&self, level: Level) -> Vec<&str> {
        self.records
            .iter()
            .filter(|r| r.level == level)
            .map(|r| r.message.as_str())
            .collect()
    }
}

impl Reporter for CollectingReporter {
    fn report(&mut self, level: Level, message: &str) {
        self.records.push(Record {
            level,
            message: message.to_string(),
        });
    }
}
