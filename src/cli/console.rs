//! Colored terminal reporter.

use std::io::{self, Write};

use colored::Colorize;

use crate::strip::reporter::{Level, Reporter};

/// Writes successes to `out` and warnings/errors to `err`.
///
/// Verbose messages go to `out` only when `verbose` is set. Coloring follows
/// `colored`'s global switch, so `--no-color` and `NO_COLOR` apply here too.
#[derive(Debug)]
pub struct ConsoleReporter<O: Write, E: Write> {
    out: O,
    err: E,
    verbose: bool,
}

impl<O: Write, E: Write> ConsoleReporter<O, E> {
    pub fn new(out: O, err: E, verbose: bool) -> Self {
        Self { out, err, verbose }
    }

    pub fn into_inner(self) -> (O, E) {
        (self.out, self.err)
    }
}

impl ConsoleReporter<io::Stdout, io::Stderr> {
    #[must_use]
    pub fn stdio(verbose: bool) -> Self {
        Self::new(io::stdout(), io::stderr(), verbose)
    }
}

impl<O: Write, E: Write> Reporter for ConsoleReporter<O, E> {
    fn report(&mut self, level: Level, message: &str) {
        // Console output is best-effort; a closed pipe must not abort the walk.
        let _ = match level {
            Level::Success => writeln!(self.out, "{}", message.green()),
            Level::Verbose if self.verbose => writeln!(self.out, "VERBOSE: {message}"),
            Level::Verbose => Ok(()),
            Level::Warning => writeln!(self.err, "{}", format!("WARNING: {message}").yellow()),
            Level::Error => writeln!(self.err, "{}", format!("ERROR: {message}").red()),
        };
    }
}
