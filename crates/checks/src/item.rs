//! Report items and their fragments

use serde::{Deserialize, Serialize};

use shapecheck_common::{diff::DiffMarkup, Parameters};

/// One typed piece of a report item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Fragment {
    Heading { text: String },
    /// Parameters set on the failing case
    Parameters { values: Parameters },
    Diff { markup: DiffMarkup },
    /// A drawn glyph run
    Image { label: String, svg: String },
    /// Collision overlay drawing, kept on a single line
    Overlay { svg: String },
    Note { text: String },
}

/// An ordered sequence of fragments describing one failure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportItem {
    pub fragments: Vec<Fragment>,
}

impl ReportItem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn heading(mut self, text: impl Into<String>) -> Self {
        self.fragments.push(Fragment::Heading { text: text.into() });
        self
    }

    pub fn parameters(mut self, values: Parameters) -> Self {
        if !values.is_empty() {
            self.fragments.push(Fragment::Parameters { values });
        }
        self
    }

    pub fn diff(mut self, markup: DiffMarkup) -> Self {
        self.fragments.push(Fragment::Diff { markup });
        self
    }

    /// Add a drawing, if there is one.
    pub fn image(mut self, label: &str, svg: Option<String>) -> Self {
        if let Some(svg) = svg {
            self.fragments.push(Fragment::Image {
                label: label.to_string(),
                svg,
            });
        }
        self
    }

    pub fn overlay(mut self, svg: String) -> Self {
        self.fragments.push(Fragment::Overlay {
            svg: svg.replace('\n', " "),
        });
        self
    }

    pub fn note(mut self, text: impl Into<String>) -> Self {
        self.fragments.push(Fragment::Note { text: text.into() });
        self
    }

    pub fn heading_text(&self) -> Option<&str> {
        self.fragments.iter().find_map(|f| match f {
            Fragment::Heading { text } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn diff_markup(&self) -> Option<&DiffMarkup> {
        self.fragments.iter().find_map(|f| match f {
            Fragment::Diff { markup } => Some(markup),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_skips_empty_parts() {
        let item = ReportItem::new()
            .heading("Shaping did not match: AV")
            .parameters(Parameters::default())
            .image("Got", None);
        assert_eq!(item.fragments.len(), 1);
        assert_eq!(item.heading_text(), Some("Shaping did not match: AV"));
    }

    #[test]
    fn test_overlay_is_flattened() {
        let item = ReportItem::new().overlay("<svg>\n<path/>\n</svg>".to_string());
        assert_eq!(
            item.fragments[0],
            Fragment::Overlay {
                svg: "<svg> <path/> </svg>".to_string()
            }
        );
    }
}
