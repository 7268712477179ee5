//! Scrub command implementation

use anyhow::{Context, Result};
use clap::Args;
use scrubjay_engine::{run_scrub, Config};
use std::path::PathBuf;

use super::{record_codec, FilterArgs};
use crate::output;

#[derive(Args, Debug)]
pub struct ScrubArgs {
    /// Recording to read
    pub input: PathBuf,

    /// Where to write the scrubbed recording
    pub output: PathBuf,

    #[command(flatten)]
    pub filters: FilterArgs,

    /// Replace the output file if it exists
    #[arg(long)]
    pub overwrite: bool,

    /// Largest accepted record (e.g. "64M")
    #[arg(long, env = "SCRUBJAY_MAX_RECORD_BYTES", value_name = "SIZE")]
    pub max_record_bytes: Option<String>,
}

pub fn run(args: ScrubArgs, verbose: bool) -> Result<()> {
    let rules = args.filters.rule_set()?;
    if rules.is_empty() {
        output::warning("No filters given; only unreferenced constant pool entries will be dropped");
    }
    let codec = record_codec(args.max_record_bytes.as_deref())?;

    let config = Config {
        input: args.input,
        output: args.output,
        rules,
        overwrite: args.overwrite,
        max_record_bytes: codec.max_record_bytes(),
    };

    let summary = run_scrub(&config)
        .with_context(|| format!("Failed to scrub {}", config.input.display()))?;

    if verbose {
        for pool in &summary.pools {
            output::info(&format!(
                "pool {}: {} entries kept",
                pool.name,
                output::kept(pool.written, pool.read)
            ));
        }
    }
    if summary.is_unchanged() {
        output::info("Nothing was removed");
    }
    output::success(&format!(
        "Wrote {} ({} events kept, {} pool entries dropped)",
        config.output.display(),
        output::kept(summary.events_retained, summary.events_read),
        summary.entries_removed()
    ));
    Ok(())
}
