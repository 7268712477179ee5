//! Recording scrub engine
//!
//! This library reads recordings, filters their events by name, category
//! and thread, and writes a new recording holding only the retained events
//! and the constant pool entries they still reach.

pub mod collector;
pub mod config;
pub mod error;
pub mod filter;
pub mod output;
pub mod reader;
pub mod scrub;

pub use config::{Config, FilterFile};
pub use error::{Result, ScrubError};
pub use filter::{FilterBuilder, FilterRuleSet, Pattern, RuleKind};
pub use reader::RecordingReader;
pub use scrub::{PoolCounts, ScrubSummary, Scrubber};

/// Validate `config` and scrub its input into its output.
pub fn run_scrub(config: &Config) -> Result<ScrubSummary> {
    config.validate()?;
    Scrubber::new(config.rules.clone(), config.codec()).scrub_file(
        &config.input,
        &config.output,
        config.overwrite,
    )
}
