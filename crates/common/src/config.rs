//! Test document configuration and parameter resolution
//!
//! Every shaping parameter is looked up on the test case first, then in the
//! document's `defaults`, then falls back to a built-in default. Overrides
//! replace, they never merge: a case-level `features` map hides the default
//! feature map entirely.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::document::TestCase;
use crate::error::{Error, Result};

/// Text direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    #[serde(alias = "LTR")]
    Ltr,
    #[serde(alias = "RTL")]
    Rtl,
    #[serde(alias = "TTB")]
    Ttb,
    #[serde(alias = "BTT")]
    Btt,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Ltr => "ltr",
            Direction::Rtl => "rtl",
            Direction::Ttb => "ttb",
            Direction::Btt => "btt",
        }
    }

    pub fn is_backward(&self) -> bool {
        matches!(self, Direction::Rtl | Direction::Btt)
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a test case's `input` is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    /// The input is the literal text to shape.
    #[default]
    String,
    /// The input is a recipe expanded against the document's ingredients.
    Pattern,
}

/// Value of one entry in a feature map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Bool(bool),
    Value(u32),
    /// `[value, start, end]` triples; an end of -1 runs to the end of the text.
    Ranges(Vec<[i64; 3]>),
}

/// OpenType feature settings, as a tag map or a HarfBuzz-style feature string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Features {
    Map(IndexMap<String, FeatureValue>),
    Spec(String),
}

/// A single resolved feature setting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSetting {
    pub tag: String,
    pub value: u32,
    pub start: usize,
    /// Exclusive end cluster; `None` means the end of the text.
    pub end: Option<usize>,
}

impl FeatureSetting {
    pub fn global(tag: &str, value: u32) -> Self {
        Self {
            tag: tag.to_string(),
            value,
            start: 0,
            end: None,
        }
    }
}

impl Features {
    pub fn settings(&self) -> Result<Vec<FeatureSetting>> {
        match self {
            Features::Spec(spec) => parse_feature_list(spec),
            Features::Map(map) => {
                let mut settings = Vec::new();
                for (tag, value) in map {
                    match value {
                        FeatureValue::Bool(on) => {
                            settings.push(FeatureSetting::global(tag, u32::from(*on)))
                        }
                        FeatureValue::Value(v) => settings.push(FeatureSetting::global(tag, *v)),
                        FeatureValue::Ranges(ranges) => {
                            for [value, start, end] in ranges {
                                let invalid = || Error::InvalidFeature(format!(
                                    "{}: [{}, {}, {}]",
                                    tag, value, start, end
                                ));
                                settings.push(FeatureSetting {
                                    tag: tag.clone(),
                                    value: u32::try_from(*value).map_err(|_| invalid())?,
                                    start: usize::try_from(*start).map_err(|_| invalid())?,
                                    end: if *end < 0 {
                                        None
                                    } else {
                                        Some(usize::try_from(*end).map_err(|_| invalid())?)
                                    },
                                });
                            }
                        }
                    }
                }
                Ok(settings)
            }
        }
    }
}

/// Parse a comma-separated feature list such as `+liga,-kern,aalt[3:5]=2`.
pub fn parse_feature_list(spec: &str) -> Result<Vec<FeatureSetting>> {
    spec.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_feature)
        .collect()
}

/// Parse one HarfBuzz-style feature setting.
pub fn parse_feature(text: &str) -> Result<FeatureSetting> {
    let invalid = || Error::InvalidFeature(text.to_string());

    let mut value = 1;
    let mut rest = text;
    if let Some(stripped) = rest.strip_prefix('-') {
        value = 0;
        rest = stripped;
    } else if let Some(stripped) = rest.strip_prefix('+') {
        rest = stripped;
    }

    let tag_end = rest.find(['[', '=']).unwrap_or(rest.len());
    let tag = rest[..tag_end].trim_matches(|c| c == '"' || c == '\'');
    if tag.is_empty() || tag.len() > 4 || !tag.is_ascii() {
        return Err(invalid());
    }
    rest = &rest[tag_end..];

    let mut start = 0;
    let mut end = None;
    if let Some(bracketed) = rest.strip_prefix('[') {
        let close = bracketed.find(']').ok_or_else(invalid)?;
        let range = &bracketed[..close];
        rest = &bracketed[close + 1..];
        match range.split_once(':') {
            Some((lo, hi)) => {
                if !lo.is_empty() {
                    start = lo.parse().map_err(|_| invalid())?;
                }
                if !hi.is_empty() {
                    end = Some(hi.parse().map_err(|_| invalid())?);
                }
            }
            None if !range.is_empty() => {
                start = range.parse().map_err(|_| invalid())?;
                end = Some(start + 1);
            }
            None => {}
        }
    }

    if let Some(v) = rest.strip_prefix('=') {
        value = match v {
            "on" | "true" => 1,
            "off" | "false" => 0,
            _ => v.parse().map_err(|_| invalid())?,
        };
    } else if !rest.is_empty() {
        return Err(invalid());
    }

    Ok(FeatureSetting {
        tag: tag.to_string(),
        value,
        start,
        end,
    })
}

/// Parameters a test case may override and a document may default
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Features>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shaper: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variations: Option<IndexMap<String, f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_type: Option<InputType>,
    #[serde(
        default,
        alias = "allowedcollisions",
        skip_serializing_if = "Option::is_none"
    )]
    pub allowed_collisions: Option<Vec<String>>,
}

impl Parameters {
    pub fn is_empty(&self) -> bool {
        self == &Parameters::default()
    }

    /// Just the shaping-related entries, for display in reports.
    pub fn shaping_only(&self) -> Parameters {
        Parameters {
            input_type: None,
            allowed_collisions: None,
            ..self.clone()
        }
    }
}

/// Collision detection rules
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollisionSettings {
    /// Base glyphs colliding with adjacent base glyphs
    #[serde(default)]
    pub bases: bool,
    /// Marks colliding with other marks
    #[serde(default)]
    pub marks: bool,
    /// Glyphs colliding with non-adjacent glyphs
    #[serde(default)]
    pub faraway: bool,
    /// Glyphs colliding with glyphs of the neighbouring cluster
    #[serde(default)]
    pub adjacent_clusters: bool,
    /// Minimum overlap, as a fraction of the smaller glyph's area, to count
    #[serde(default)]
    pub area: f32,
}

impl CollisionSettings {
    /// Every rule enabled, any overlap counts.
    pub fn permissive() -> Self {
        Self {
            bases: true,
            marks: true,
            faraway: true,
            adjacent_clusters: true,
            area: 0.0,
        }
    }
}

/// Document-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default, skip_serializing_if = "Parameters::is_empty")]
    pub defaults: Parameters,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forbidden_glyphs: Option<Vec<String>>,
    #[serde(
        default,
        alias = "collidoscope",
        skip_serializing_if = "Option::is_none"
    )]
    pub collision: Option<CollisionSettings>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub ingredients: IndexMap<String, String>,
    /// Base direction handed to the collision detector
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
}

/// Look `key` up on the case, then in the document defaults.
pub fn resolve<'a, T: ?Sized + 'a>(
    case: &'a TestCase,
    configuration: &'a Configuration,
    key: impl Fn(&'a Parameters) -> Option<&'a T>,
) -> Option<&'a T> {
    key(&case.overrides).or_else(|| key(&configuration.defaults))
}

/// Like [`resolve`], falling back to `default` when neither level sets `key`.
pub fn resolve_or<'a, T: ?Sized + 'a>(
    case: &'a TestCase,
    configuration: &'a Configuration,
    key: impl Fn(&'a Parameters) -> Option<&'a T>,
    default: &'a T,
) -> &'a T {
    resolve(case, configuration, key).unwrap_or(default)
}

/// Fully resolved parameters handed to the shaper
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ShapingParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<Features>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shaper: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variations: Option<IndexMap<String, f32>>,
}

impl ShapingParameters {
    pub fn resolve(case: &TestCase, configuration: &Configuration) -> Self {
        Self::merge(&case.overrides, &configuration.defaults)
    }

    /// Entries of `overrides` win over `defaults`, key by key.
    pub fn merge(overrides: &Parameters, defaults: &Parameters) -> Self {
        Self {
            script: overrides.script.clone().or_else(|| defaults.script.clone()),
            language: overrides
                .language
                .clone()
                .or_else(|| defaults.language.clone()),
            direction: overrides.direction.or(defaults.direction),
            features: overrides
                .features
                .clone()
                .or_else(|| defaults.features.clone()),
            shaper: overrides.shaper.clone().or_else(|| defaults.shaper.clone()),
            variations: overrides
                .variations
                .clone()
                .or_else(|| defaults.variations.clone()),
        }
    }

    pub fn feature_settings(&self) -> Result<Vec<FeatureSetting>> {
        match &self.features {
            Some(features) => features.settings(),
            None => Ok(Vec::new()),
        }
    }
}
