//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use zonestrip::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{Result, ZsError};

// Platform
pub use crate::platform::memory::MemoryFs;
pub use crate::platform::pal::{FileAttributes, MarkerFs, NativeFs, PathKind, marker_path};

// Logging
pub use crate::logger::jsonl::{JsonlConfig, JsonlWriter};

// Stripping
pub use crate::strip::governor::{AlwaysProceed, DryRun, Governor, Interactive};
pub use crate::strip::report::{StripIssue, StripReport};
pub use crate::strip::reporter::{CollectingReporter, Level, Reporter};
pub use crate::strip::stripper::{StripOptions, Stripper};
