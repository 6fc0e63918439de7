//! Shapecheck CLI - Main Entry Point
//!
//! Runs shaping regression checks against a font, regenerates expectation
//! files and renders text samples.

use clap::{Parser, Subcommand};
use std::process::ExitCode;

mod commands;
mod output;

use commands::{check, sample, update};

/// Shapecheck - regression testing for OpenType shaping
#[derive(Parser)]
#[command(name = "shapecheck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Output format for summaries
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the shaping checks against a font and write a report
    Check(check::CheckArgs),

    /// Regenerate a test document from a shaping input file
    Update(update::UpdateArgs),

    /// Render text as a standalone SVG sample
    Sample(sample::SampleArgs),

    /// Show version information
    Version,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let outcome = match cli.command {
        Commands::Check(args) => check::execute(args, cli.format),
        Commands::Update(args) => update::execute(args).map(|()| true),
        Commands::Sample(args) => sample::execute(args).map(|()| true),
        Commands::Version => {
            println!("shapecheck v{}", env!("CARGO_PKG_VERSION"));
            println!("Regression testing harness for OpenType text shaping");
            Ok(true)
        }
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            output::print_error(&format!("{:#}", e));
            ExitCode::from(2)
        }
    }
}
