//! Print command implementation

use anyhow::{Context, Result};
use clap::Args;
use scrubjay_engine::output::json::{write_json_lines, DEFAULT_MAX_DEPTH};
use scrubjay_engine::RecordingReader;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::debug;

use super::{record_codec, FilterArgs};

#[derive(Args, Debug)]
pub struct PrintArgs {
    /// Recording to read
    pub input: PathBuf,

    #[command(flatten)]
    pub filters: FilterArgs,

    /// How deep to expand constant pool references
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    pub depth: usize,

    /// Largest accepted record (e.g. "64M")
    #[arg(long, env = "SCRUBJAY_MAX_RECORD_BYTES", value_name = "SIZE")]
    pub max_record_bytes: Option<String>,
}

pub fn run(args: PrintArgs) -> Result<()> {
    let rules = args.filters.rule_set()?;
    let codec = record_codec(args.max_record_bytes.as_deref())?;

    let mut reader = RecordingReader::open(&args.input, codec)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let written = write_json_lines(&mut reader, &rules, args.depth, &mut out)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    out.flush()?;

    debug!(written, read = reader.events_read(), "events printed");
    Ok(())
}
