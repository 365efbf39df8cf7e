//! Confirmation governors: approve, preview or veto each destructive action.
//!
//! A veto is never an error. The stripper counts it as declined and moves on
//! to the next file.

use std::io::{self, BufRead, Write};

/// Decides whether a destructive action may run against a target.
pub trait Governor {
    fn confirm(&mut self, action: &str, target: &str) -> bool;

    /// Whether this governor only previews actions.
    fn is_dry_run(&self) -> bool {
        false
    }
}

/// Approves everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysProceed;

impl Governor for AlwaysProceed {
    fn confirm(&mut self, _action: &str, _target: &str) -> bool {
        true
    }
}

/// Declines everything, writing a "What if" line per intended action.
#[derive(Debug)]
pub struct DryRun<W: Write> {
    writer: W,
    intents: usize,
}

impl<W: Write> DryRun<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, intents: 0 }
    }

    /// Number of actions previewed so far.
    pub fn intents(&self) -> usize {
        self.intents
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl DryRun<io::Stdout> {
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Governor for DryRun<W> {
    fn confirm(&mut self, action: &str, target: &str) -> bool {
        self.intents += 1;
        let _ = writeln!(
            self.writer,
            "What if: Performing the operation \"{action}\" on target \"{target}\"."
        );
        false
    }

    fn is_dry_run(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Answer {
    Ask,
    YesToAll,
    NoToAll,
}

/// Asks on `writer` and reads the answer from `reader` for every action.
///
/// `y` approves one, `a` approves all remaining, `q` declines all remaining,
/// anything else (including EOF) declines the current one.
#[derive(Debug)]
pub struct Interactive<R: BufRead, W: Write> {
    reader: R,
    writer: W,
    answer: Answer,
}

impl<R: BufRead, W: Write> Interactive<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            answer: Answer::Ask,
        }
    }
}

impl Interactive<io::StdinLock<'static>, io::Stderr> {
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> Governor for Interactive<R, W> {
    fn confirm(&mut self, action: &str, target: &str) -> bool {
        match self.answer {
            Answer::YesToAll => return true,
            Answer::NoToAll => return false,
            Answer::Ask => {}
        }

        let _ = write!(
            self.writer,
            "Confirm: {action} on \"{target}\"? [y/N/a(ll)/q(uit)] "
        );
        let _ = self.writer.flush();

        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) | Err(_) => {
                let _ = writeln!(self.writer);
                self.answer = Answer::NoToAll;
                false
            }
            Ok(_) => match line.trim().to_ascii_lowercase().as_str() {
                "y" | "yes" => true,
                "a" | "all" => {
                    self.answer = Answer::YesToAll;
                    true
                }
                "q" | "quit" => {
                    self.answer = Answer::NoToAll;
                    false
                }
                _ => false,
            },
        }
    }
}
