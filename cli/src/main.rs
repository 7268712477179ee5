//! CLI for scrubjay
//!
//! Commands:
//! - scrub: write a copy of a recording holding only the matching events
//! - print: dump matching events as JSON lines
//! - summary: show what a recording contains

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod output;

#[derive(Parser)]
#[command(name = "scrubjay")]
#[command(about = "scrubjay - filter event recordings without breaking constant pools", long_about = None)]
#[command(version)]
struct Cli {
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a recording holding only the events that pass the filters
    Scrub(commands::scrub::ScrubArgs),

    /// Print matching events as JSON, one per line
    Print(commands::print::PrintArgs),

    /// Summarize a recording
    Summary(commands::summary::SummaryArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Scrub(args) => commands::scrub::run(args, cli.verbose),
        Commands::Print(args) => commands::print::run(args),
        Commands::Summary(args) => commands::summary::run(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
