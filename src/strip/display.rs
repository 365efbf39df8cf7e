//! Display-path truncation for console output.

use std::path::Path;

/// Longest display name printed as-is.
pub const MAX_DISPLAY_CHARS: usize = 80;

const ELLIPSIS: &str = "...";

/// Shorten `full_name` to at most 80 characters, keeping the tail.
///
/// Longer inputs become `...` followed by the final 77 characters, so the
/// file name and its nearest directories stay visible.
pub fn truncate_display(full_name: &str) -> String {
    let len = full_name.chars().count();
    if len <= MAX_DISPLAY_CHARS {
        return full_name.to_string();
    }
    let keep = MAX_DISPLAY_CHARS - ELLIPSIS.len();
    let tail: String = full_name.chars().skip(len - keep).collect();
    format!("{ELLIPSIS}{tail}")
}

/// [`truncate_display`] for paths.
pub fn display_path(path: &Path) -> String {
    truncate_display(&path.to_string_lossy())
}
