//! Output formatting for CLI

use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

use shapecheck_checks::{Report, Status};

/// Output format
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
    /// Plain text format
    Plain,
}

/// Trait for items that can be displayed in a table
pub trait TableDisplay {
    fn headers() -> Vec<&'static str>;
    fn row(&self) -> Vec<String>;
}

/// One line of the check summary
#[derive(Debug, Serialize)]
pub struct ResultRow {
    pub check: String,
    pub status: Status,
    pub code: String,
    pub header: String,
}

impl TableDisplay for ResultRow {
    fn headers() -> Vec<&'static str> {
        vec!["Check", "Status", "Code", "Result"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.check.clone(),
            colored_status(self.status),
            self.code.clone(),
            self.header.clone(),
        ]
    }
}

pub fn colored_status(status: Status) -> String {
    match status {
        Status::Pass => "✓ PASS".green().to_string(),
        Status::Fail => "✗ FAIL".red().to_string(),
        Status::Skip => "- SKIP".yellow().to_string(),
    }
}

pub fn result_rows(report: &Report) -> Vec<ResultRow> {
    report
        .checks
        .iter()
        .flat_map(|(check, section)| {
            section.results.iter().map(move |r| ResultRow {
                check: check.clone(),
                status: r.status,
                code: r.code.clone(),
                header: r.header.clone(),
            })
        })
        .collect()
}

/// Print a list of items
pub fn print_list<T: Serialize + TableDisplay>(items: &[T], format: OutputFormat) {
    if items.is_empty() {
        println!("No items found.");
        return;
    }

    match format {
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic);

            table.set_header(T::headers());
            for item in items {
                table.add_row(item.row());
            }

            println!("{table}");
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(items).unwrap_or_default());
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(items).unwrap_or_default());
        }
        OutputFormat::Plain => {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    println!("---");
                }
                let row = item.row();
                for (header, value) in T::headers().iter().zip(row.iter()) {
                    println!("{}: {}", header, value);
                }
            }
        }
    }
}

/// Print the per-result table and the totals line.
pub fn print_summary(report: &Report, format: OutputFormat) {
    print_list(&result_rows(report), format);
    if matches!(format, OutputFormat::Table | OutputFormat::Plain) {
        let summary = report.summary();
        println!(
            "{} passed, {} failed, {} skipped",
            summary.passed.to_string().green(),
            summary.failed.to_string().red(),
            summary.skipped.to_string().yellow()
        );
    }
}

/// Print success message
pub fn print_success(message: &str) {
    println!("✅ {}", message);
}

/// Print error message
pub fn print_error(message: &str) {
    eprintln!("❌ {}", message);
}
