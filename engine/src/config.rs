//! Scrub configuration and filter files

use scrubjay_shared::protocol::wire::{RecordCodec, DEFAULT_MAX_RECORD_BYTES};
use scrubjay_shared::utils::parse_byte_size;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{Result, ScrubError};
use crate::filter::{FilterBuilder, FilterRuleSet, RuleKind};

/// Environment variable overriding the per-record size limit (accepts k/M/G suffixes)
pub const MAX_RECORD_BYTES_ENV: &str = "SCRUBJAY_MAX_RECORD_BYTES";

/// Per-record size limit from the environment, or the format default
pub fn default_max_record_bytes() -> u64 {
    std::env::var(MAX_RECORD_BYTES_ENV)
        .ok()
        .and_then(|s| parse_byte_size(&s).ok())
        .unwrap_or(DEFAULT_MAX_RECORD_BYTES)
}

/// Scrub configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Recording to read
    pub input: PathBuf,

    /// Destination of the scrubbed recording
    pub output: PathBuf,

    pub rules: FilterRuleSet,

    /// Replace an existing destination
    pub overwrite: bool,

    /// Largest accepted encoded record
    pub max_record_bytes: u64,
}

impl Config {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>, rules: FilterRuleSet) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            rules,
            overwrite: false,
            max_record_bytes: default_max_record_bytes(),
        }
    }

    pub fn codec(&self) -> RecordCodec {
        RecordCodec::new(self.max_record_bytes)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_record_bytes == 0 {
            return Err(ScrubError::Config(
                "record size limit must be greater than 0".to_string(),
            ));
        }

        if !self.input.is_file() {
            return Err(ScrubError::Config(format!(
                "input recording not found: {}",
                self.input.display()
            )));
        }

        if self.output.exists() {
            if std::fs::canonicalize(&self.input)? == std::fs::canonicalize(&self.output)? {
                return Err(ScrubError::SameFile(self.output.clone()));
            }
            if !self.overwrite {
                return Err(ScrubError::OutputExists(self.output.clone()));
            }
        }

        Ok(())
    }
}

/// Filter rules stored in a TOML file
///
/// ```toml
/// include-events = ["example.*"]
/// exclude-threads = ["GC Thread*,VM Thread"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FilterFile {
    #[serde(default)]
    pub include_events: Vec<String>,
    #[serde(default)]
    pub exclude_events: Vec<String>,
    #[serde(default)]
    pub include_categories: Vec<String>,
    #[serde(default)]
    pub exclude_categories: Vec<String>,
    #[serde(default)]
    pub include_threads: Vec<String>,
    #[serde(default)]
    pub exclude_threads: Vec<String>,
}

impl FilterFile {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
            .map_err(|e| ScrubError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn parse(text: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    fn list(&self, kind: RuleKind) -> &[String] {
        match kind {
            RuleKind::IncludeEvents => &self.include_events,
            RuleKind::ExcludeEvents => &self.exclude_events,
            RuleKind::IncludeCategories => &self.include_categories,
            RuleKind::ExcludeCategories => &self.exclude_categories,
            RuleKind::IncludeThreads => &self.include_threads,
            RuleKind::ExcludeThreads => &self.exclude_threads,
        }
    }

    /// Every `(rule, argument)` pair in the file
    pub fn rules(&self) -> impl Iterator<Item = (RuleKind, &str)> + '_ {
        RuleKind::ALL
            .into_iter()
            .flat_map(move |kind| self.list(kind).iter().map(move |s| (kind, s.as_str())))
    }

    /// Add the file's rules to `builder`.
    pub fn apply(&self, builder: &mut FilterBuilder) -> Result<()> {
        for (kind, list) in self.rules() {
            builder.add(kind, list)?;
        }
        Ok(())
    }
}
