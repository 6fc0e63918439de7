//! Update Command

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tracing::info;

use shapecheck_checks::ShapingInputFile;
use shapecheck_font::{FontData, FontShaper};

use crate::output;

#[derive(Args)]
pub struct UpdateArgs {
    /// YAML shaping input file
    pub input: PathBuf,

    /// JSON test document to write
    pub output: PathBuf,

    /// Fonts to shape the inputs with
    #[arg(required = true)]
    pub fonts: Vec<PathBuf>,
}

pub fn execute(args: UpdateArgs) -> Result<()> {
    let input = ShapingInputFile::load(&args.input)
        .with_context(|| format!("Cannot read shaping input {}", args.input.display()))?;

    let mut cases = Vec::new();
    for path in &args.fonts {
        let font = FontData::open(path)
            .with_context(|| format!("Cannot load font {}", path.display()))?;
        let mut shaper = FontShaper::new(&font)?;
        let shaped = input
            .shape_expectations(&mut shaper)
            .with_context(|| format!("Cannot shape with {}", path.display()))?;
        info!("{}: {} cases", font.file_name(), shaped.len());
        cases.extend(shaped);
    }

    let count = cases.len();
    let document = input.document(cases);
    std::fs::write(&args.output, serde_json::to_string_pretty(&document)?)
        .with_context(|| format!("Cannot write {}", args.output.display()))?;

    output::print_success(&format!(
        "Wrote {} test cases to {}",
        count,
        args.output.display()
    ));
    Ok(())
}
