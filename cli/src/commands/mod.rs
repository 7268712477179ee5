//! Subcommand implementations

pub mod print;
pub mod scrub;
pub mod summary;

use anyhow::{Context, Result};
use clap::Args;
use scrubjay_engine::config::default_max_record_bytes;
use scrubjay_engine::{FilterFile, FilterRuleSet, RuleKind};
use scrubjay_shared::protocol::wire::RecordCodec;
use scrubjay_shared::utils::parse_byte_size;
use std::path::PathBuf;

/// Event filters shared by `scrub` and `print`
///
/// Every flag may be repeated and takes a comma-separated list of names or
/// `*` globs. List items are used as written, spaces included.
#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    /// Keep only events with a matching type name (full or simple name)
    #[arg(long, value_name = "FILTER")]
    pub include_events: Vec<String>,

    /// Drop events with a matching type name
    #[arg(long, value_name = "FILTER")]
    pub exclude_events: Vec<String>,

    /// Keep only events with a matching category
    #[arg(long, value_name = "FILTER")]
    pub include_categories: Vec<String>,

    /// Drop events with a matching category
    #[arg(long, value_name = "FILTER")]
    pub exclude_categories: Vec<String>,

    /// Keep only events recorded on a matching thread
    #[arg(long, value_name = "FILTER")]
    pub include_threads: Vec<String>,

    /// Drop events recorded on a matching thread
    #[arg(long, value_name = "FILTER")]
    pub exclude_threads: Vec<String>,

    /// TOML file with more filter rules (same keys as the flags)
    #[arg(long, value_name = "FILE")]
    pub filter_file: Option<PathBuf>,
}

impl FilterArgs {
    fn flags(&self, kind: RuleKind) -> &[String] {
        match kind {
            RuleKind::IncludeEvents => &self.include_events,
            RuleKind::ExcludeEvents => &self.exclude_events,
            RuleKind::IncludeCategories => &self.include_categories,
            RuleKind::ExcludeCategories => &self.exclude_categories,
            RuleKind::IncludeThreads => &self.include_threads,
            RuleKind::ExcludeThreads => &self.exclude_threads,
        }
    }

    /// Combine the flags and the filter file into one rule set.
    pub fn rule_set(&self) -> Result<FilterRuleSet> {
        let mut builder = FilterRuleSet::builder();
        for kind in RuleKind::ALL {
            for list in self.flags(kind) {
                builder.add(kind, list)?;
            }
        }
        if let Some(path) = &self.filter_file {
            FilterFile::load(path)
                .and_then(|file| file.apply(&mut builder))
                .with_context(|| format!("Failed to load filter file {}", path.display()))?;
        }
        Ok(builder.build())
    }
}

/// Record size limit from a flag value, or the environment/default
pub fn record_codec(max_record_bytes: Option<&str>) -> Result<RecordCodec> {
    let limit = match max_record_bytes {
        Some(s) => parse_byte_size(s).with_context(|| format!("Invalid record size limit: {}", s))?,
        None => default_max_record_bytes(),
    };
    if limit == 0 {
        anyhow::bail!("Record size limit must be greater than 0");
    }
    Ok(RecordCodec::new(limit))
}
