//! Check Command

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tracing::info;

use shapecheck_checks::{
    render_html, FontInfo, Harness, Report, SuiteConfig, DEFAULT_TITLE,
};
use shapecheck_font::{BoundsCollider, FontData, FontShaper};

use crate::output::{self, OutputFormat};

#[derive(Args)]
pub struct CheckArgs {
    /// Font file to check
    pub font: PathBuf,

    /// Directory of JSON test documents
    #[arg(short, long, env = "SHAPECHECK_TESTS")]
    pub tests: Option<PathBuf>,

    /// Suite configuration file (YAML, TOML or JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Where to write the HTML report
    #[arg(short, long)]
    pub output: PathBuf,

    /// Also write the report as JSON
    #[arg(long)]
    pub json: Option<PathBuf>,
}

/// The test directory to use: `--tests` wins over the suite file.
pub fn test_directory(args: &CheckArgs, suite: &SuiteConfig) -> Option<PathBuf> {
    args.tests.clone().or_else(|| suite.test_directory.clone())
}

/// Run the checks; `Ok(false)` when any of them failed.
pub fn execute(args: CheckArgs, format: OutputFormat) -> Result<bool> {
    let suite = match &args.config {
        Some(path) => SuiteConfig::load(path)
            .with_context(|| format!("Cannot read configuration {}", path.display()))?,
        None => SuiteConfig::default(),
    };
    let directory = test_directory(&args, &suite);

    let font = FontData::open(&args.font)
        .with_context(|| format!("Cannot load font {}", args.font.display()))?;
    let mut shaper = FontShaper::new(&font)?;
    info!("Checking {} ({})", font.file_name(), font.sha256());

    let title = suite.report_title.as_deref().unwrap_or(DEFAULT_TITLE);
    let mut report = Report::new(
        title,
        FontInfo {
            name: font.file_name(),
            sha256: Some(font.sha256()),
        },
    );
    Harness::new(BoundsCollider::build).run_into(&mut shaper, directory.as_deref(), &mut report);

    std::fs::write(&args.output, render_html(&report))
        .with_context(|| format!("Cannot write report {}", args.output.display()))?;
    if let Some(path) = &args.json {
        std::fs::write(path, report.to_json()?)
            .with_context(|| format!("Cannot write report {}", path.display()))?;
    }

    output::print_summary(&report, format);
    if report.passed() {
        output::print_success(&format!("Report written to {}", args.output.display()));
    } else {
        output::print_error(&format!(
            "Shaping checks failed, see {}",
            args.output.display()
        ));
    }
    Ok(report.passed())
}
