#![forbid(unsafe_code)]

//! zonestrip: removes the `Zone.Identifier` marker stream that browsers and
//! mail clients attach to downloaded files.
//!
//! A single call walks a file or directory tree depth-first and deletes every
//! marker it finds:
//! 1. **Force mode**: read-only files are made writable for the deletion and
//!    their attributes are restored afterwards, even if the deletion panics.
//! 2. **Governor**: each deletion can be previewed (dry-run) or confirmed
//!    interactively instead of performed.
//! 3. **Resilience**: a failure on one file or directory is reported and the
//!    walk carries on with its siblings.
//!
//! # Library usage
//!
//! Use the [`prelude`] for convenient access to the most common types:
//!
//! ```rust,no_run
//! use zonestrip::prelude::*;
//!
//! let fs = NativeFs::new();
//! let mut governor = AlwaysProceed;
//! let mut reporter = CollectingReporter::new();
//! let report = Stripper::new(&fs, &mut governor, &mut reporter)
//!     .process("Downloads", &StripOptions::default());
//! println!("{}", report.summary_line());
//! ```
//!
//! Individual modules can also be imported directly:
//!
//! ```rust,no_run
//! use zonestrip::core::config::Config;
//! use zonestrip::platform::memory::MemoryFs;
//! ```

pub mod prelude;

#[cfg(feature = "cli")]
pub mod cli;
pub mod core;
pub mod logger;
pub mod platform;
pub mod strip;
