//! Marker-stream stripping: traversal, confirmation, output and reporting.
//!
//! The [`stripper::Stripper`] walks a path depth-first and deletes the
//! `Zone.Identifier` stream of every file it meets. Side effects go through
//! three injected capabilities:
//!
//! - a [`MarkerFs`](crate::platform::pal::MarkerFs) for all filesystem access,
//! - a [`governor::Governor`] that approves, previews or vetoes each deletion,
//! - a [`reporter::Reporter`] that receives leveled console messages.

pub mod display;
pub mod governor;
pub mod report;
pub mod reporter;
pub mod stripper;

pub use display::{display_path, truncate_display};
pub use governor::{AlwaysProceed, DryRun, Governor, Interactive};
pub use report::{StripIssue, StripReport};
pub use reporter::{CollectingReporter, Level, Reporter};
pub use stripper::{STRIP_ACTION, StripOptions, Stripper};
