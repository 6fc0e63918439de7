//! Generating expectations from a shaping input file
//!
//! The input is YAML:
//!
//! ```yaml
//! configuration:
//!   defaults:
//!     script: arab
//! input:
//!   - text: ["بت", "تب"]
//!     features: "-calt"
//!     comparison_mode: glyphstream
//! ```
//!
//! Every text is shaped with each font and becomes one test case pinned to
//! that font with `only`.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use shapecheck_common::document::FontFilter;
use shapecheck_common::{
    Configuration, DocumentFile, Encoding, Expectation, Parameters, Shaper, ShapingParameters,
    TestCase,
};

use crate::error::{CheckError, Result};

/// A group of texts sharing shaping parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShapingInput {
    pub text: Vec<String>,

    #[serde(default)]
    pub comparison_mode: Encoding,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    #[serde(flatten)]
    pub parameters: Parameters,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShapingInputFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<Configuration>,
    pub input: Vec<ShapingInput>,
}

impl ShapingInputFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let file: ShapingInputFile = serde_yaml::from_str(&content)?;
        if file.input.is_empty() {
            return Err(CheckError::Config(format!(
                "{} does not contain a valid shaping input.",
                path.display()
            )));
        }
        debug!("{}: {} input groups", path.display(), file.input.len());
        Ok(file)
    }

    /// Shape every text with `shaper`, producing one case per text.
    pub fn shape_expectations(&self, shaper: &mut dyn Shaper) -> Result<Vec<TestCase>> {
        let defaults = self
            .configuration
            .as_ref()
            .map(|c| c.defaults.clone())
            .unwrap_or_default();
        let font_name = shaper.font_name().to_string();

        let mut cases = Vec::new();
        for entry in &self.input {
            let parameters = ShapingParameters::merge(&entry.parameters, &defaults);
            for text in &entry.text {
                let run = shaper.shape(text, &parameters)?;
                let expectation = run.serialize(&*shaper, entry.comparison_mode);
                cases.push(TestCase {
                    only: Some(FontFilter::One(font_name.clone())),
                    input: Some(text.clone()),
                    expectation: Some(Expectation::Literal(expectation)),
                    note: entry.note.clone(),
                    overrides: entry.parameters.shaping_only(),
                    ..Default::default()
                });
            }
        }
        info!("{}: generated {} expectations", font_name, cases.len());
        Ok(cases)
    }

    /// The test document holding `cases` and this file's configuration.
    pub fn document(&self, cases: Vec<TestCase>) -> DocumentFile {
        DocumentFile {
            configuration: self.configuration.clone(),
            tests: Some(cases),
        }
    }
}
