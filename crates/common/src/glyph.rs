//! Shaped glyph runs and their canonical text encoding
//!
//! A run serializes as `|`-joined tokens of the form
//! `name=cluster[@xOffset,yOffset]+xAdvance`. The glyphs-only encoding keeps
//! just the names. This encoding is what expectations are recorded in and
//! what every comparison, diff and report works from.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

static GLYPH_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.*)=(\d+)(@(-?\d+),(-?\d+))?(\+(-?\d+))?$").expect("glyph token pattern")
});

/// Resolves glyph identifiers to names and back.
pub trait GlyphNames {
    /// Human-readable name of a glyph.
    fn glyph_name(&self, id: u32) -> String;

    /// Glyph id for a name, if the font knows it.
    fn glyph_id(&self, name: &str) -> Option<u32>;
}

/// One positioned glyph of a shaped run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlyphRecord {
    pub id: u32,
    /// Display name kept when the glyph could not be resolved against a font.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub cluster: u32,
    pub x_offset: i32,
    pub y_offset: i32,
    pub x_advance: i32,
    pub y_advance: i32,
}

impl GlyphRecord {
    pub fn new(id: u32, cluster: u32) -> Self {
        Self {
            id,
            cluster,
            ..Default::default()
        }
    }

    pub fn with_advance(mut self, x_advance: i32, y_advance: i32) -> Self {
        self.x_advance = x_advance;
        self.y_advance = y_advance;
        self
    }

    pub fn with_offset(mut self, x_offset: i32, y_offset: i32) -> Self {
        self.x_offset = x_offset;
        self.y_offset = y_offset;
        self
    }

    /// (x-offset, y-offset, x-advance, y-advance)
    pub fn position(&self) -> [i32; 4] {
        [self.x_offset, self.y_offset, self.x_advance, self.y_advance]
    }

    pub fn display_name<'a, N: GlyphNames + ?Sized>(&'a self, names: &N) -> Cow<'a, str> {
        match &self.name {
            Some(name) => Cow::Borrowed(name.as_str()),
            None => Cow::Owned(names.glyph_name(self.id)),
        }
    }
}

/// Text encoding used when serializing a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Encoding {
    /// Names, clusters, offsets and advances.
    #[default]
    #[serde(rename = "full")]
    Full,
    /// Glyph names only.
    #[serde(rename = "glyphstream", alias = "glyphs_only")]
    GlyphsOnly,
}

impl Encoding {
    /// Encoding an expectation was recorded in: positions are present only
    /// when the stream carries an advance marker.
    pub fn for_expectation(expectation: &str) -> Self {
        if expectation.contains('+') {
            Encoding::Full
        } else {
            Encoding::GlyphsOnly
        }
    }
}

/// Ordered sequence of positioned glyphs produced by shaping
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlyphRun {
    pub glyphs: Vec<GlyphRecord>,
}

impl GlyphRun {
    pub fn new(glyphs: Vec<GlyphRecord>) -> Self {
        Self { glyphs }
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GlyphRecord> {
        self.glyphs.iter()
    }

    /// Glyph names in run order.
    pub fn names<N: GlyphNames + ?Sized>(&self, names: &N) -> Vec<String> {
        self.glyphs
            .iter()
            .map(|g| g.display_name(names).into_owned())
            .collect()
    }

    /// Total horizontal advance of the run.
    pub fn advance(&self) -> i32 {
        self.glyphs.iter().map(|g| g.x_advance).sum()
    }

    pub fn serialize<N: GlyphNames + ?Sized>(&self, names: &N, encoding: Encoding) -> String {
        let mut outs = Vec::with_capacity(self.glyphs.len());
        for glyph in &self.glyphs {
            let name = glyph.display_name(names);
            if encoding == Encoding::GlyphsOnly {
                outs.push(name.into_owned());
                continue;
            }
            let mut token = format!("{}={}", name, glyph.cluster);
            if glyph.x_offset != 0 || glyph.y_offset != 0 {
                token.push_str(&format!("@{},{}", glyph.x_offset, glyph.y_offset));
            }
            token.push_str(&format!("+{}", glyph.x_advance));
            outs.push(token);
        }
        outs.join("|")
    }

    /// Parse a full-encoding stream back into a run.
    ///
    /// Names the font does not know are kept as the display name with glyph
    /// id 0. Vertical advances are not recorded in the encoding and parse as 0.
    pub fn parse<N: GlyphNames + ?Sized>(stream: &str, names: &N) -> Result<Self> {
        if stream.is_empty() {
            return Ok(Self::default());
        }

        let mut glyphs = Vec::new();
        for item in stream.split('|') {
            let caps = GLYPH_TOKEN
                .captures(item)
                .ok_or_else(|| Error::InvalidGlyphToken {
                    token: item.to_string(),
                    stream: stream.to_string(),
                })?;

            let name = &caps[1];
            let invalid = || Error::InvalidGlyphToken {
                token: item.to_string(),
                stream: stream.to_string(),
            };
            let cluster: u32 = caps[2].parse().map_err(|_| invalid())?;
            let int = |idx: usize| -> Result<i32> {
                match caps.get(idx) {
                    Some(m) => m.as_str().parse().map_err(|_| invalid()),
                    None => Ok(0),
                }
            };

            let (id, fallback) = match names.glyph_id(name) {
                Some(id) => (id, None),
                None => (0, Some(name.to_string())),
            };

            glyphs.push(GlyphRecord {
                id,
                name: fallback,
                cluster,
                x_offset: int(4)?,
                y_offset: int(5)?,
                x_advance: int(7)?,
                y_advance: 0,
            });
        }

        Ok(Self { glyphs })
    }
}

impl<'a> IntoIterator for &'a GlyphRun {
    type Item = &'a GlyphRecord;
    type IntoIter = std::slice::Iter<'a, GlyphRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.glyphs.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    struct Names(Vec<&'static str>);

    impl GlyphNames for Names {
        fn glyph_name(&self, id: u32) -> String {
            self.0
                .get(id as usize)
                .map(|s| s.to_string())
                .unwrap_or_else(|| format!("gid{}", id))
        }

        fn glyph_id(&self, name: &str) -> Option<u32> {
            self.0.iter().position(|n| *n == name).map(|i| i as u32)
        }
    }

    fn names() -> Names {
        Names(vec![".notdef", "A", "V", "acutecomb", "aacute"])
    }

    fn sample_run() -> GlyphRun {
        GlyphRun::new(vec![
            GlyphRecord::new(1, 0).with_advance(500, 0),
            GlyphRecord::new(3, 0).with_offset(-250, 10),
            GlyphRecord::new(2, 1).with_advance(480, 0),
        ])
    }

    #[test]
    fn test_serialize_full() {
        let s = sample_run().serialize(&names(), Encoding::Full);
        assert_eq!(s, "A=0+500|acutecomb=0@-250,10+0|V=1+480");
    }

    #[test]
    fn test_serialize_glyphs_only() {
        let s = sample_run().serialize(&names(), Encoding::GlyphsOnly);
        assert_eq!(s, "A|acutecomb|V");
    }

    #[test]
    fn test_parse_full() {
        let run = GlyphRun::parse("A=0+500|acutecomb=0@-250,10+0|V=1+480", &names()).unwrap();
        assert_eq!(run, sample_run());
    }

    #[test]
    fn test_parse_unknown_name_keeps_fallback() {
        let run = GlyphRun::parse("uni0627.fina=3+210", &names()).unwrap();
        assert_eq!(run.glyphs[0].id, 0);
        assert_eq!(run.glyphs[0].name.as_deref(), Some("uni0627.fina"));
        assert_eq!(run.glyphs[0].cluster, 3);
        assert_eq!(
            run.serialize(&names(), Encoding::Full),
            "uni0627.fina=3+210"
        );
    }

    #[test]
    fn test_parse_without_advance() {
        let run = GlyphRun::parse("A=0|V=1", &names()).unwrap();
        assert_eq!(run.glyphs[1].x_advance, 0);
        assert_eq!(run.serialize(&names(), Encoding::Full), "A=0+0|V=1+0");
    }

    #[test]
    fn test_parse_rejects_glyphs_only_stream() {
        let err = GlyphRun::parse("A|V", &names()).unwrap_err();
        assert!(matches!(err, Error::InvalidGlyphToken { ref token, .. } if token == "A"));
    }

    #[test]
    fn test_empty_stream() {
        let run = GlyphRun::parse("", &names()).unwrap();
        assert!(run.is_empty());
        assert_eq!(run.serialize(&names(), Encoding::Full), "");
    }

    #[test_case("A=0+500|V=1+500" ; "simple pair")]
    #[test_case("A=0+500|acutecomb=0@-250,10+0|V=1+480" ; "mark with offset")]
    #[test_case("aacute=0@0,-12+520" ; "vertical offset only")]
    #[test_case("missing=0+10|A=1@-3,4+-20" ; "unknown name and negative advance")]
    fn test_round_trip_is_idempotent(stream: &str) {
        let names = names();
        let once = GlyphRun::parse(stream, &names)
            .unwrap()
            .serialize(&names, Encoding::Full);
        let twice = GlyphRun::parse(&once, &names)
            .unwrap()
            .serialize(&names, Encoding::Full);
        assert_eq!(once, stream);
        assert_eq!(twice, once);
    }

    #[test]
    fn test_encoding_for_expectation() {
        assert_eq!(Encoding::for_expectation("A=0+500"), Encoding::Full);
        assert_eq!(Encoding::for_expectation("A|V"), Encoding::GlyphsOnly);
    }

    #[test]
    fn test_advance_and_names() {
        let run = sample_run();
        assert_eq!(run.advance(), 980);
        assert_eq!(run.names(&names()), vec!["A", "acutecomb", "V"]);
    }
}
