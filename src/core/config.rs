//! Configuration system: TOML file + env var overrides + smart defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, ZsError};

/// Full zonestrip configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub strip: StripConfig,
    pub output: OutputConfig,
    pub log: LogConfig,
    /// Where this config was loaded from. Not part of the file format.
    #[serde(skip)]
    pub source_path: PathBuf,
}

/// Default strip behavior; CLI flags can switch these on per run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct StripConfig {
    pub force: bool,
    pub no_recurse: bool,
    pub suppress_success: bool,
}

/// Console output settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OutputConfig {
    pub verbose: bool,
    pub color: bool,
}

/// JSONL activity log settings. An empty `jsonl_path` disables the log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LogConfig {
    pub jsonl_path: PathBuf,
    pub max_size_bytes: u64,
    pub max_rotated_files: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            color: true,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            jsonl_path: PathBuf::new(),
            max_size_bytes: 10 * 1024 * 1024,
            max_rotated_files: 3,
        }
    }
}

impl LogConfig {
    /// The activity log path, if logging is enabled.
    #[must_use]
    pub fn enabled_path(&self) -> Option<&Path> {
        if self.jsonl_path.as_os_str().is_empty() {
            None
        } else {
            Some(&self.jsonl_path)
        }
    }
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        let home_dir = env::var_os("HOME")
            .or_else(|| env::var_os("USERPROFILE"))
            .map_or_else(|| PathBuf::from("."), PathBuf::from);
        home_dir
            .join(".config")
            .join("zonestrip")
            .join("config.toml")
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with(path, |name| env::var(name).ok())
    }

    fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| ZsError::Io {
                path: path_buf.clone(),
                source,
            })?;
            let parsed: Self = toml::from_str(&raw)?;
            parsed
        } else if is_explicit_path {
            return Err(ZsError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.source_path = path_buf;
        cfg.apply_env_overrides_from(lookup)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Render the effective config as TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut var = |name: &str| lookup(name).filter(|raw| !raw.trim().is_empty());

        if let Some(raw) = var("ZONESTRIP_FORCE") {
            self.strip.force = parse_env_bool("ZONESTRIP_FORCE", &raw)?;
        }
        if let Some(raw) = var("ZONESTRIP_NO_RECURSE") {
            self.strip.no_recurse = parse_env_bool("ZONESTRIP_NO_RECURSE", &raw)?;
        }
        if let Some(raw) = var("ZONESTRIP_SUPPRESS_SUCCESS") {
            self.strip.suppress_success = parse_env_bool("ZONESTRIP_SUPPRESS_SUCCESS", &raw)?;
        }
        if let Some(raw) = var("ZONESTRIP_VERBOSE") {
            self.output.verbose = parse_env_bool("ZONESTRIP_VERBOSE", &raw)?;
        }
        if let Some(raw) = var("ZONESTRIP_COLOR") {
            self.output.color = parse_env_bool("ZONESTRIP_COLOR", &raw)?;
        }
        if let Some(raw) = var("ZONESTRIP_LOG_FILE") {
            self.log.jsonl_path = PathBuf::from(raw.trim());
        }
        if let Some(raw) = var("ZONESTRIP_LOG_MAX_SIZE_BYTES") {
            self.log.max_size_bytes = parse_env_u64("ZONESTRIP_LOG_MAX_SIZE_BYTES", &raw)?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.log.max_size_bytes < 1024 {
            return Err(ZsError::InvalidConfig {
                details: format!(
                    "log.max_size_bytes ({}) must be >= 1024",
                    self.log.max_size_bytes
                ),
            });
        }
        if self.log.max_rotated_files == 0 {
            return Err(ZsError::InvalidConfig {
                details: "log.max_rotated_files must be >= 1".to_string(),
            });
        }
        if let Some(path) = self.log.enabled_path()
            && path.is_dir()
        {
            return Err(ZsError::InvalidConfig {
                details: format!("log.jsonl_path {} is a directory", path.display()),
            });
        }
        Ok(())
    }
}

fn parse_env_u64(name: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|error| ZsError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })
}

fn parse_env_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ZsError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: expected a boolean"),
        }),
    }
}
