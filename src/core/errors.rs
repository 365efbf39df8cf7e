//! ZS-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::error::Error as StdError;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, ZsError>;

/// Top-level error type for zonestrip.
#[derive(Debug, Error)]
pub enum ZsError {
    #[error("[ZS-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[ZS-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[ZS-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[ZS-2001] path not found: {path}")]
    NotFound { path: PathBuf },

    #[error("[ZS-2002] cannot list directory {path}: {source}")]
    Enumeration {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[ZS-2003] cannot strip marker stream from {path}: {source}")]
    Strip {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[ZS-2004] cannot restore attributes {expected} on {path}: {source}")]
    AttributeRestore {
        path: PathBuf,
        expected: String,
        #[source]
        source: std::io::Error,
    },

    #[error("[ZS-3001] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[ZS-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ZsError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "ZS-1001",
            Self::MissingConfig { .. } => "ZS-1002",
            Self::ConfigParse { .. } => "ZS-1003",
            Self::NotFound { .. } => "ZS-2001",
            Self::Enumeration { .. } => "ZS-2002",
            Self::Strip { .. } => "ZS-2003",
            Self::AttributeRestore { .. } => "ZS-2004",
            Self::Serialization { .. } => "ZS-3001",
            Self::Io { .. } => "ZS-3002",
        }
    }

    /// The most specific human-readable message this error carries.
    ///
    /// Errors without an underlying cause yield their own message, minus the
    /// `[ZS-xxxx]` prefix that [`ZsError::code`] already carries.
    #[must_use]
    pub fn detail(&self) -> String {
        if self.source().is_some() {
            return innermost_message(self);
        }
        let message = self.to_string();
        let prefix = format!("[{}] ", self.code());
        message
            .strip_prefix(&prefix)
            .map_or_else(|| message.clone(), str::to_string)
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<serde_json::Error> for ZsError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for ZsError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}

impl From<toml::ser::Error> for ZsError {
    fn from(value: toml::ser::Error) -> Self {
        Self::Serialization {
            context: "toml",
            details: value.to_string(),
        }
    }
}

/// Unwrap an error to its innermost descriptive message.
///
/// Any error that carries a `source()` is treated as a wrapper and descended
/// into. The deepest non-empty message wins; if the chain bottoms out on an
/// error with an empty message, the nearest non-empty message above it is
/// returned instead.
///
/// `std::io::Error` needs special care: a custom io error displays its payload
/// but also reports that payload as its `source()`, so the walk uses
/// `get_ref()` to reach the payload directly.
pub fn innermost_message(err: &(dyn StdError + 'static)) -> String {
    let mut best = err.to_string();
    let mut current: Option<&(dyn StdError + 'static)> = next_inner(err);
    while let Some(inner) = current {
        let message = inner.to_string();
        if !message.trim().is_empty() {
            best = message;
        }
        current = next_inner(inner);
    }
    best
}

fn next_inner<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a (dyn StdError + 'static)> {
    if let Some(io) = err.downcast_ref::<std::io::Error>() {
        return io.get_ref().map(|inner| inner as &(dyn StdError + 'static));
    }
    err.source()
}
