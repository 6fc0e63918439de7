//! Test documents and test cases

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::{resolve_or, CollisionSettings, Configuration, InputType, Parameters};

/// Structural problems that make a document unusable
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    #[error("{0}")]
    Invalid(String),

    #[error("no test cases")]
    MissingCases,
}

impl DocumentError {
    pub fn code(&self) -> &'static str {
        match self {
            DocumentError::Invalid(_) => "invalid-document",
            DocumentError::MissingCases => "missing-cases",
        }
    }
}

/// Expected serialized glyph stream of a test case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expectation {
    Literal(String),
    /// Per-font expectations keyed by font file name
    PerFont {
        default: String,
        #[serde(flatten)]
        fonts: IndexMap<String, String>,
    },
}

impl Expectation {
    pub fn for_font(&self, font_name: &str) -> &str {
        match self {
            Expectation::Literal(s) => s,
            Expectation::PerFont { default, fonts } => {
                fonts.get(font_name).unwrap_or(default).as_str()
            }
        }
    }
}

/// One font name or several
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FontFilter {
    One(String),
    Many(Vec<String>),
}

impl FontFilter {
    pub fn contains(&self, font_name: &str) -> bool {
        match self {
            FontFilter::One(name) => name == font_name,
            FontFilter::Many(names) => names.iter().any(|n| n == font_name),
        }
    }
}

/// A single test case
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub only: Option<FontFilter>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<FontFilter>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expectation: Option<Expectation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    #[serde(
        default,
        alias = "collidoscope",
        skip_serializing_if = "Option::is_none"
    )]
    pub collision: Option<CollisionSettings>,

    /// Parameter overrides given directly on the case
    #[serde(flatten)]
    pub overrides: Parameters,
}

/// The active input of a case
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseInput<'a> {
    Literal(&'a str),
    Recipe(&'a str),
}

impl<'a> CaseInput<'a> {
    pub fn as_str(&self) -> &'a str {
        match self {
            CaseInput::Literal(s) | CaseInput::Recipe(s) => s,
        }
    }
}

impl TestCase {
    /// Whether the case applies to the font with this file name.
    pub fn runs_on(&self, font_name: &str) -> bool {
        if self.exclude.as_ref().is_some_and(|f| f.contains(font_name)) {
            return false;
        }
        match &self.only {
            Some(only) => only.contains(font_name),
            None => true,
        }
    }

    pub fn case_input<'a>(&'a self, configuration: &'a Configuration) -> Option<CaseInput<'a>> {
        let input = self.input.as_deref()?;
        let input_type = resolve_or(
            self,
            configuration,
            |p| p.input_type.as_ref(),
            &InputType::String,
        );
        Some(match input_type {
            InputType::String => CaseInput::Literal(input),
            InputType::Pattern => CaseInput::Recipe(input),
        })
    }
}

/// On-disk shape of a test document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<Configuration>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tests: Option<Vec<TestCase>>,
}

/// A loaded, validated test document
#[derive(Debug, Clone, PartialEq)]
pub struct TestDocument {
    /// File name, used in report headers
    pub name: String,
    pub path: PathBuf,
    pub configuration: Configuration,
    pub cases: Vec<TestCase>,
}

impl TestDocument {
    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let text = std::fs::read_to_string(path).map_err(|e| DocumentError::Invalid(e.to_string()))?;
        let mut document = Self::from_json(&name, &text)?;
        document.path = path.to_path_buf();
        Ok(document)
    }

    pub fn from_json(name: &str, text: &str) -> Result<Self, DocumentError> {
        let file: DocumentFile =
            serde_json::from_str(text).map_err(|e| DocumentError::Invalid(e.to_string()))?;
        let cases = match file.tests {
            Some(cases) if !cases.is_empty() => cases,
            _ => return Err(DocumentError::MissingCases),
        };
        debug!("Loaded {} with {} test cases", name, cases.len());
        Ok(Self {
            name: name.to_string(),
            path: PathBuf::from(name),
            configuration: file.configuration.unwrap_or_default(),
            cases,
        })
    }
}
