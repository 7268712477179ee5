//! Summary command implementation

use anyhow::{Context, Result};
use clap::Args;
use scrubjay_engine::output::summary::{summarize, RecordingSummary};
use std::path::PathBuf;

use super::record_codec;
use crate::output;

#[derive(Args, Debug)]
pub struct SummaryArgs {
    /// Recording to read
    pub input: PathBuf,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Largest accepted record (e.g. "64M")
    #[arg(long, env = "SCRUBJAY_MAX_RECORD_BYTES", value_name = "SIZE")]
    pub max_record_bytes: Option<String>,
}

pub fn run(args: SummaryArgs) -> Result<()> {
    let codec = record_codec(args.max_record_bytes.as_deref())?;
    let summary = summarize(&args.input, codec)
        .with_context(|| format!("Failed to summarize {}", args.input.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_table(&args.input, &summary);
    }
    Ok(())
}

fn print_table(path: &std::path::Path, summary: &RecordingSummary) {
    println!();
    println!(" Recording: {}", path.display());
    println!(" Version: {}", summary.version);
    println!(" Start: {}", summary.start_time);
    match summary.span() {
        Some(span) => println!(" Events: {} over {} ns", summary.events, span),
        None => println!(" Events: {}", summary.events),
    }
    println!();

    output::table_header(&format!(" {:<40} {:>10}  {:<10}", "Event Type", "Count", "Categories"));
    for event_type in &summary.event_types {
        println!(
            " {:<40} {:>10}  {}",
            event_type.name,
            event_type.count,
            event_type.categories.join(", ")
        );
    }
    println!();

    output::table_header(&format!(" {:<40} {:>10}", "Constant Pool", "Entries"));
    for pool in &summary.pools {
        println!(" {:<40} {:>10}", pool.name, pool.entries);
    }
}
