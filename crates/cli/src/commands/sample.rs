//! Sample Command

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use shapecheck_font::{render_sample, Color, FontData, FontShaper, SampleOptions};

use crate::output;

#[derive(Args)]
pub struct SampleArgs {
    /// Font file
    pub font: PathBuf,

    /// Text to render; each line becomes a line of the sample
    #[arg(short, long)]
    pub text: String,

    /// Features, e.g. "+ss01,-liga"
    #[arg(short, long)]
    pub features: Option<String>,

    /// Output SVG file
    #[arg(short, long)]
    pub output: PathBuf,

    /// Foreground color, RRGGBB or RRGGBBAA
    #[arg(long)]
    pub foreground: Option<Color>,

    /// Background color, RRGGBB or RRGGBBAA
    #[arg(long)]
    pub background: Option<Color>,
}

pub fn execute(args: SampleArgs) -> Result<()> {
    let font = FontData::open(&args.font)
        .with_context(|| format!("Cannot load font {}", args.font.display()))?;
    let mut shaper = FontShaper::new(&font)?;

    let options = SampleOptions {
        features: args.features,
        foreground: args.foreground,
        background: args.background,
    };
    let svg = render_sample(&mut shaper, &args.text, &options)?;
    std::fs::write(&args.output, svg)
        .with_context(|| format!("Cannot write {}", args.output.display()))?;

    output::print_success(&format!("Sample written to {}", args.output.display()));
    Ok(())
}
